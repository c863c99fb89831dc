use actix_web::{web, HttpResponse, Responder};
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::middleware::auth::Claims;
use crate::models::trip::{TravelGroup, Trip, TripBudget, TripStatus};
use crate::routes::{
    authenticated_user, internal_error, not_found, resolve_sort_field, validation_failed,
};
use crate::schemas::{parse_date_string, CreateTripInput, UpdateTripInput};
use crate::services::trip_service::{find_owned_trip, trips_collection};

const SORT_FIELDS: [&str; 7] = [
    "startDate",
    "endDate",
    "createdAt",
    "updatedAt",
    "title",
    "destination",
    "totalEstimate",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripListQuery {
    status: Option<String>,
    page: Option<String>,
    limit: Option<String>,
    search: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    budget: Option<String>,
    travel_group: Option<String>,
    destination: Option<String>,
    country: Option<String>,
    start_date_from: Option<String>,
    start_date_to: Option<String>,
}

fn contains_filter(term: &str) -> Document {
    doc! { "$regex": regex::escape(term), "$options": "i" }
}

fn page_param(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v >= 1)
        .unwrap_or(default)
}

fn build_list_filter(user_id: bson::oid::ObjectId, query: &TripListQuery) -> Document {
    let mut filter = doc! { "userId": user_id };

    if let Some(status) = query.status.as_deref().filter(|s| *s != "all") {
        if let Some(status) = TripStatus::parse(status) {
            filter.insert("status", status.as_str());
        }
    }
    if let Some(budget) = query.budget.as_deref().and_then(TripBudget::parse) {
        filter.insert("budget", budget.as_str());
    }
    if let Some(group) = query.travel_group.as_deref().and_then(TravelGroup::parse) {
        filter.insert("travelGroup", group.as_str());
    }
    if let Some(destination) = &query.destination {
        filter.insert("destination", contains_filter(destination));
    }
    if let Some(country) = &query.country {
        filter.insert("country", contains_filter(country));
    }

    let mut date_range = Document::new();
    if let Some(from) = query.start_date_from.as_deref().and_then(parse_date_string) {
        date_range.insert("$gte", bson::DateTime::from_millis(from.timestamp_millis()));
    }
    if let Some(to) = query.start_date_to.as_deref().and_then(parse_date_string) {
        date_range.insert("$lte", bson::DateTime::from_millis(to.timestamp_millis()));
    }
    if !date_range.is_empty() {
        filter.insert("startDate", date_range);
    }

    if let Some(search) = &query.search {
        let pattern = contains_filter(search);
        filter.insert(
            "$or",
            vec![
                doc! { "title": pattern.clone() },
                doc! { "description": pattern.clone() },
                doc! { "destination": pattern.clone() },
                doc! { "country": pattern },
            ],
        );
    }

    filter
}

pub async fn list_trips(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    query: web::Query<TripListQuery>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let client = data.into_inner();
    let collection = trips_collection(&client);

    let page = page_param(query.page.as_deref(), 1);
    let limit = page_param(query.limit.as_deref(), 10);
    let skip = (page - 1) * limit;

    let filter = build_list_filter(user_id, &query);
    let sort_by = resolve_sort_field(query.sort_by.as_deref(), &SORT_FIELDS, "startDate");
    let descending = query.sort_order.as_deref() == Some("desc");
    let sort_order = if descending { -1 } else { 1 };
    let sort_order_label = if descending { "desc" } else { "asc" };

    let total = match collection.count_documents(filter.clone()).await {
        Ok(total) => total as i64,
        Err(err) => {
            log::error!("Get trips error: {:?}", err);
            return internal_error();
        }
    };

    let mut sort = Document::new();
    sort.insert(sort_by, sort_order);

    let cursor = collection
        .find(filter)
        .sort(sort)
        .skip(skip as u64)
        .limit(limit)
        .await;

    let mut trips: Vec<Trip> = match cursor {
        Ok(cursor) => match cursor.try_collect().await {
            Ok(trips) => trips,
            Err(err) => {
                log::error!("Failed to collect trips: {:?}", err);
                return internal_error();
            }
        },
        Err(err) => {
            log::error!("Get trips error: {:?}", err);
            return internal_error();
        }
    };

    for trip in &mut trips {
        trip.sort_itinerary();
    }

    let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };

    HttpResponse::Ok().json(json!({
        "trips": trips,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "totalPages": total_pages,
        },
        "filters": {
            "status": &query.status,
            "budget": &query.budget,
            "travelGroup": &query.travel_group,
            "destination": &query.destination,
            "country": &query.country,
            "search": &query.search,
            "sortBy": sort_by,
            "sortOrder": sort_order_label,
        },
    }))
}

pub async fn upcoming_trips(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let client = data.into_inner();
    let filter = doc! {
        "userId": user_id,
        "status": TripStatus::Upcoming.as_str(),
        "startDate": { "$gte": bson::DateTime::now() },
    };

    let cursor = trips_collection(&client)
        .find(filter)
        .sort(doc! { "startDate": 1 })
        .limit(5)
        .await;

    match cursor {
        Ok(cursor) => match cursor.try_collect::<Vec<Trip>>().await {
            Ok(mut trips) => {
                for trip in &mut trips {
                    trip.sort_itinerary();
                }
                HttpResponse::Ok().json(json!({ "trips": trips }))
            }
            Err(err) => {
                log::error!("Failed to collect upcoming trips: {:?}", err);
                internal_error()
            }
        },
        Err(err) => {
            log::error!("Get upcoming trips error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn get_trip(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let trip_id = match bson::oid::ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => return not_found("Trip not found"),
    };

    let client = data.into_inner();
    match find_owned_trip(&client, user_id, trip_id).await {
        Ok(Some(mut trip)) => {
            trip.sort_itinerary();
            HttpResponse::Ok().json(json!({ "trip": trip }))
        }
        Ok(None) => not_found("Trip not found"),
        Err(err) => {
            log::error!("Get trip error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn create_trip(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    body: web::Json<Value>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let input = match CreateTripInput::parse(&body) {
        Ok(input) => input,
        Err(issues) => return validation_failed(issues),
    };

    let now = bson::DateTime::now();
    let mut trip = Trip {
        id: None,
        user_id,
        title: input.title,
        description: input.description,
        destination: input.destination,
        country: input.country,
        start_date: bson::DateTime::from_millis(input.start_date.timestamp_millis()),
        end_date: bson::DateTime::from_millis(input.end_date.timestamp_millis()),
        budget: input.budget,
        travel_group: input.travel_group,
        status: TripStatus::Upcoming,
        total_estimate: None,
        cover_image: input.cover_image,
        images: Vec::new(),
        itinerary_days: Vec::new(),
        created_at: Some(now),
        updated_at: Some(now),
    };

    let client = data.into_inner();
    match trips_collection(&client).insert_one(&trip).await {
        Ok(result) => {
            trip.id = result.inserted_id.as_object_id();
            HttpResponse::Created().json(json!({ "trip": trip }))
        }
        Err(err) => {
            log::error!("Create trip error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn update_trip(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let trip_id = match bson::oid::ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => return not_found("Trip not found"),
    };
    let input = match UpdateTripInput::parse(&body) {
        Ok(input) => input,
        Err(issues) => return validation_failed(issues),
    };

    let mut set = Document::new();
    if let Some(title) = input.title {
        set.insert("title", title);
    }
    if let Some(description) = input.description {
        set.insert("description", description);
    }
    if let Some(destination) = input.destination {
        set.insert("destination", destination);
    }
    if let Some(country) = input.country {
        set.insert("country", country);
    }
    if let Some(start_date) = input.start_date {
        set.insert(
            "startDate",
            bson::DateTime::from_millis(start_date.timestamp_millis()),
        );
    }
    if let Some(end_date) = input.end_date {
        set.insert(
            "endDate",
            bson::DateTime::from_millis(end_date.timestamp_millis()),
        );
    }
    if let Some(budget) = input.budget {
        set.insert("budget", budget.as_str());
    }
    if let Some(travel_group) = input.travel_group {
        set.insert("travelGroup", travel_group.as_str());
    }
    if let Some(cover_image) = input.cover_image {
        set.insert("coverImage", cover_image);
    }
    if let Some(status) = input.status {
        set.insert("status", status.as_str());
    }
    set.insert("updatedAt", bson::DateTime::now());

    let client = data.into_inner();
    let options = mongodb::options::FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let updated = trips_collection(&client)
        .find_one_and_update(doc! { "_id": trip_id, "userId": user_id }, doc! { "$set": set })
        .with_options(options)
        .await;

    match updated {
        Ok(Some(mut trip)) => {
            trip.sort_itinerary();
            HttpResponse::Ok().json(json!({ "trip": trip }))
        }
        Ok(None) => not_found("Trip not found"),
        Err(err) => {
            log::error!("Update trip error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn delete_trip(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let trip_id = match bson::oid::ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => return not_found("Trip not found"),
    };

    // Days and activities are embedded, so this removes the whole tree.
    let client = data.into_inner();
    match trips_collection(&client)
        .delete_one(doc! { "_id": trip_id, "userId": user_id })
        .await
    {
        Ok(result) if result.deleted_count == 0 => not_found("Trip not found"),
        Ok(_) => HttpResponse::Ok().json(json!({ "message": "Trip deleted successfully" })),
        Err(err) => {
            log::error!("Delete trip error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn trip_stats(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let client = data.into_inner();
    match stats_counts(&client, user_id).await {
        Ok((upcoming, ongoing, completed, total)) => HttpResponse::Ok().json(json!({
            "stats": {
                "upcoming": upcoming,
                "ongoing": ongoing,
                "completed": completed,
                "total": total,
            },
        })),
        Err(err) => {
            log::error!("Get stats error: {:?}", err);
            internal_error()
        }
    }
}

async fn stats_counts(
    client: &Client,
    user_id: bson::oid::ObjectId,
) -> Result<(u64, u64, u64, u64), mongodb::error::Error> {
    let collection = trips_collection(client);
    let upcoming = collection
        .count_documents(doc! { "userId": user_id, "status": TripStatus::Upcoming.as_str() })
        .await?;
    let ongoing = collection
        .count_documents(doc! { "userId": user_id, "status": TripStatus::Ongoing.as_str() })
        .await?;
    let completed = collection
        .count_documents(doc! { "userId": user_id, "status": TripStatus::Completed.as_str() })
        .await?;
    let total = collection.count_documents(doc! { "userId": user_id }).await?;
    Ok((upcoming, ongoing, completed, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    fn query() -> TripListQuery {
        TripListQuery {
            status: None,
            page: None,
            limit: None,
            search: None,
            sort_by: None,
            sort_order: None,
            budget: None,
            travel_group: None,
            destination: None,
            country: None,
            start_date_from: None,
            start_date_to: None,
        }
    }

    #[test]
    fn filter_always_scopes_to_owner() {
        let user = ObjectId::new();
        let filter = build_list_filter(user, &query());
        assert_eq!(filter.get_object_id("userId").unwrap(), user);
        assert_eq!(filter.len(), 1);
    }

    #[test]
    fn status_all_and_unknown_values_are_ignored() {
        let mut q = query();
        q.status = Some("all".to_string());
        assert!(!build_list_filter(ObjectId::new(), &q).contains_key("status"));

        q.status = Some("SOMEDAY".to_string());
        assert!(!build_list_filter(ObjectId::new(), &q).contains_key("status"));

        q.status = Some("ONGOING".to_string());
        let filter = build_list_filter(ObjectId::new(), &q);
        assert_eq!(filter.get_str("status").unwrap(), "ONGOING");
    }

    #[test]
    fn search_spans_the_four_text_fields() {
        let mut q = query();
        q.search = Some("rome".to_string());
        let filter = build_list_filter(ObjectId::new(), &q);
        let or = filter.get_array("$or").unwrap();
        assert_eq!(or.len(), 4);
    }

    #[test]
    fn regex_input_is_escaped() {
        let mut q = query();
        q.destination = Some("Rome (Italy)".to_string());
        let filter = build_list_filter(ObjectId::new(), &q);
        let destination = filter.get_document("destination").unwrap();
        assert_eq!(destination.get_str("$regex").unwrap(), r"Rome \(Italy\)");
        assert_eq!(destination.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn date_range_bounds_are_inclusive_filters() {
        let mut q = query();
        q.start_date_from = Some("2025-06-01".to_string());
        q.start_date_to = Some("2025-06-30".to_string());
        let filter = build_list_filter(ObjectId::new(), &q);
        let range = filter.get_document("startDate").unwrap();
        assert!(range.contains_key("$gte"));
        assert!(range.contains_key("$lte"));
    }

    #[test]
    fn page_params_fall_back_on_garbage() {
        assert_eq!(page_param(Some("3"), 1), 3);
        assert_eq!(page_param(Some("abc"), 1), 1);
        assert_eq!(page_param(Some("0"), 1), 1);
        assert_eq!(page_param(Some("-2"), 10), 10);
        assert_eq!(page_param(None, 10), 10);
    }
}

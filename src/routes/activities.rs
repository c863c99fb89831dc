use actix_web::{web, HttpResponse, Responder};
use bson::oid::ObjectId;
use bson::{doc, Document};
use mongodb::options::UpdateOptions;
use mongodb::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::middleware::auth::Claims;
use crate::models::trip::{Activity, ActivityCategory, ItineraryDay, Trip};
use crate::routes::{
    authenticated_user, internal_error, not_found, resolve_sort_field, validation_failed,
};
use crate::schemas::{CreateActivityInput, UpdateActivityInput};
use crate::services::trip_service::{find_owned_trip, find_trip_with_activity, trips_collection};

const SORT_FIELDS: [&str; 5] = ["order", "startTime", "endTime", "estimatedCost", "title"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityListQuery {
    category: Option<String>,
    search: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    min_cost: Option<String>,
    max_cost: Option<String>,
}

fn day_of<'a>(trip: &'a Trip, day_id: ObjectId) -> Option<&'a ItineraryDay> {
    trip.itinerary_days.iter().find(|d| d.id == day_id)
}

fn activity_of(trip: &Trip, activity_id: ObjectId) -> Option<Activity> {
    trip.itinerary_days
        .iter()
        .flat_map(|d| d.activities.iter())
        .find(|a| a.id == activity_id)
        .cloned()
}

fn filter_activities(activities: Vec<Activity>, query: &ActivityListQuery) -> Vec<Activity> {
    let category = query.category.as_deref().and_then(ActivityCategory::parse);
    let search = query.search.as_deref().map(str::to_lowercase);
    let min_cost = query.min_cost.as_deref().and_then(|v| v.parse::<f64>().ok());
    let max_cost = query.max_cost.as_deref().and_then(|v| v.parse::<f64>().ok());

    activities
        .into_iter()
        .filter(|activity| {
            if let Some(category) = category {
                if activity.category != category {
                    return false;
                }
            }
            if let Some(min) = min_cost {
                match activity.estimated_cost {
                    Some(cost) if cost >= min => {}
                    _ => return false,
                }
            }
            if let Some(max) = max_cost {
                match activity.estimated_cost {
                    Some(cost) if cost <= max => {}
                    _ => return false,
                }
            }
            if let Some(term) = &search {
                let matches = activity.title.to_lowercase().contains(term)
                    || activity
                        .description
                        .as_deref()
                        .map_or(false, |d| d.to_lowercase().contains(term))
                    || activity
                        .location
                        .as_deref()
                        .map_or(false, |l| l.to_lowercase().contains(term));
                if !matches {
                    return false;
                }
            }
            true
        })
        .collect()
}

fn sort_activities(activities: &mut [Activity], sort_by: &str, descending: bool) {
    activities.sort_by(|a, b| {
        let ordering = match sort_by {
            "startTime" => a.start_time.cmp(&b.start_time),
            "endTime" => a.end_time.cmp(&b.end_time),
            "estimatedCost" => a
                .estimated_cost
                .partial_cmp(&b.estimated_cost)
                .unwrap_or(Ordering::Equal),
            "title" => a.title.cmp(&b.title),
            _ => a.order.cmp(&b.order),
        };
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn parse_path_ids(trip_id: &str, day_id: &str) -> Result<(ObjectId, ObjectId), HttpResponse> {
    let trip_id = ObjectId::parse_str(trip_id).map_err(|_| not_found("Trip not found"))?;
    let day_id = ObjectId::parse_str(day_id).map_err(|_| not_found("Day not found"))?;
    Ok((trip_id, day_id))
}

pub async fn list_day_activities(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
    query: web::Query<ActivityListQuery>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let (trip_path, day_path) = path.into_inner();
    let (trip_id, day_id) = match parse_path_ids(&trip_path, &day_path) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    let client = data.into_inner();
    let trip = match find_owned_trip(&client, user_id, trip_id).await {
        Ok(Some(trip)) => trip,
        Ok(None) => return not_found("Trip not found"),
        Err(err) => {
            log::error!("Get activities error: {:?}", err);
            return internal_error();
        }
    };

    let day = match day_of(&trip, day_id) {
        Some(day) => day,
        None => return not_found("Day not found"),
    };

    let mut activities = filter_activities(day.activities.clone(), &query);
    let sort_by = resolve_sort_field(query.sort_by.as_deref(), &SORT_FIELDS, "order");
    let descending = query.sort_order.as_deref() == Some("desc");
    sort_activities(&mut activities, sort_by, descending);

    HttpResponse::Ok().json(json!({ "activities": activities }))
}

pub async fn get_activity(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let activity_id = match ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => return not_found("Activity not found"),
    };

    let client = data.into_inner();
    match find_trip_with_activity(&client, user_id, activity_id).await {
        Ok(Some(trip)) => match activity_of(&trip, activity_id) {
            Some(activity) => HttpResponse::Ok().json(json!({ "activity": activity })),
            None => not_found("Activity not found"),
        },
        Ok(None) => not_found("Activity not found"),
        Err(err) => {
            log::error!("Get activity error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn create_activity(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
    body: web::Json<Value>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let (trip_path, day_path) = path.into_inner();
    let (trip_id, day_id) = match parse_path_ids(&trip_path, &day_path) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    let client = data.into_inner();
    let trip = match find_owned_trip(&client, user_id, trip_id).await {
        Ok(Some(trip)) => trip,
        Ok(None) => return not_found("Trip not found"),
        Err(err) => {
            log::error!("Create activity error: {:?}", err);
            return internal_error();
        }
    };
    let day = match day_of(&trip, day_id) {
        Some(day) => day,
        None => return not_found("Day not found"),
    };

    let input = match CreateActivityInput::parse(&body) {
        Ok(input) => input,
        Err(issues) => return validation_failed(issues),
    };

    // Append after the current highest order unless one was supplied.
    let next_order = day.activities.iter().map(|a| a.order).max().unwrap_or(-1) + 1;
    let activity = Activity {
        id: ObjectId::new(),
        title: input.title,
        description: input.description,
        start_time: input.start_time,
        end_time: input.end_time,
        location: input.location,
        estimated_cost: input.estimated_cost,
        category: input.category,
        order: input.order.unwrap_or(next_order),
    };

    let activity_doc = match bson::to_bson(&activity) {
        Ok(doc) => doc,
        Err(err) => {
            log::error!("Failed to serialize activity: {:?}", err);
            return internal_error();
        }
    };

    let options = UpdateOptions::builder()
        .array_filters(vec![doc! { "d._id": day_id }])
        .build();
    let update = trips_collection(&client)
        .update_one(
            doc! { "_id": trip_id, "userId": user_id },
            doc! { "$push": { "itineraryDays.$[d].activities": activity_doc } },
        )
        .with_options(options)
        .await;

    match update {
        Ok(_) => HttpResponse::Created().json(json!({ "activity": activity })),
        Err(err) => {
            log::error!("Create activity error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn update_activity(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let activity_id = match ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => return not_found("Activity not found"),
    };

    let client = data.into_inner();
    let trip = match find_trip_with_activity(&client, user_id, activity_id).await {
        Ok(Some(trip)) => trip,
        Ok(None) => return not_found("Activity not found"),
        Err(err) => {
            log::error!("Update activity error: {:?}", err);
            return internal_error();
        }
    };

    let input = match UpdateActivityInput::parse(&body) {
        Ok(input) => input,
        Err(issues) => return validation_failed(issues),
    };

    let mut set = Document::new();
    let prefix = "itineraryDays.$[d].activities.$[a]";
    if let Some(title) = input.title {
        set.insert(format!("{}.title", prefix), title);
    }
    if let Some(description) = input.description {
        set.insert(format!("{}.description", prefix), description);
    }
    if let Some(start_time) = input.start_time {
        set.insert(format!("{}.startTime", prefix), start_time);
    }
    if let Some(end_time) = input.end_time {
        set.insert(format!("{}.endTime", prefix), end_time);
    }
    if let Some(location) = input.location {
        set.insert(format!("{}.location", prefix), location);
    }
    if let Some(cost) = input.estimated_cost {
        set.insert(format!("{}.estimatedCost", prefix), cost);
    }
    if let Some(category) = input.category {
        set.insert(format!("{}.category", prefix), category.as_str());
    }
    if let Some(order) = input.order {
        set.insert(format!("{}.order", prefix), order);
    }

    if !set.is_empty() {
        let trip_id = match trip.id {
            Some(id) => id,
            None => return internal_error(),
        };
        let options = UpdateOptions::builder()
            .array_filters(vec![
                doc! { "d.activities._id": activity_id },
                doc! { "a._id": activity_id },
            ])
            .build();
        let update = trips_collection(&client)
            .update_one(doc! { "_id": trip_id }, doc! { "$set": set })
            .with_options(options)
            .await;
        if let Err(err) = update {
            log::error!("Update activity error: {:?}", err);
            return internal_error();
        }
    }

    // Re-read so the response reflects what was stored.
    match find_trip_with_activity(&client, user_id, activity_id).await {
        Ok(Some(trip)) => match activity_of(&trip, activity_id) {
            Some(activity) => HttpResponse::Ok().json(json!({ "activity": activity })),
            None => not_found("Activity not found"),
        },
        Ok(None) => not_found("Activity not found"),
        Err(err) => {
            log::error!("Update activity error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn delete_activity(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let activity_id = match ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => return not_found("Activity not found"),
    };

    let client = data.into_inner();
    let trip = match find_trip_with_activity(&client, user_id, activity_id).await {
        Ok(Some(trip)) => trip,
        Ok(None) => return not_found("Activity not found"),
        Err(err) => {
            log::error!("Delete activity error: {:?}", err);
            return internal_error();
        }
    };
    let trip_id = match trip.id {
        Some(id) => id,
        None => return internal_error(),
    };

    let options = UpdateOptions::builder()
        .array_filters(vec![doc! { "d.activities._id": activity_id }])
        .build();
    let update = trips_collection(&client)
        .update_one(
            doc! { "_id": trip_id },
            doc! { "$pull": { "itineraryDays.$[d].activities": { "_id": activity_id } } },
        )
        .with_options(options)
        .await;

    match update {
        Ok(_) => HttpResponse::Ok().json(json!({ "message": "Activity deleted successfully" })),
        Err(err) => {
            log::error!("Delete activity error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn reorder_activities(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
    body: web::Json<Value>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let (trip_path, day_path) = path.into_inner();
    let (trip_id, day_id) = match parse_path_ids(&trip_path, &day_path) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    let ids = match body.get("activityIds").and_then(Value::as_array) {
        Some(ids) => ids,
        None => {
            return HttpResponse::BadRequest()
                .json(json!({ "error": "activityIds must be an array" }))
        }
    };
    let mut activity_ids = Vec::with_capacity(ids.len());
    for id in ids {
        match id.as_str().and_then(|s| ObjectId::parse_str(s).ok()) {
            Some(oid) => activity_ids.push(oid),
            None => {
                return HttpResponse::BadRequest().json(json!({ "error": "Invalid activity ID" }))
            }
        }
    }

    let client = data.into_inner();
    match find_owned_trip(&client, user_id, trip_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found("Trip not found"),
        Err(err) => {
            log::error!("Reorder activities error: {:?}", err);
            return internal_error();
        }
    }

    // One update per activity, issued concurrently and without a
    // transaction; a failure partway leaves a partially reordered day.
    let collection = trips_collection(&client);
    let updates = activity_ids.iter().enumerate().map(|(index, activity_id)| {
        let collection = collection.clone();
        let activity_id = *activity_id;
        async move {
            let options = UpdateOptions::builder()
                .array_filters(vec![doc! { "d._id": day_id }, doc! { "a._id": activity_id }])
                .build();
            collection
                .update_one(
                    doc! { "_id": trip_id, "userId": user_id },
                    doc! { "$set": { "itineraryDays.$[d].activities.$[a].order": index as i32 } },
                )
                .with_options(options)
                .await
        }
    });

    for result in futures::future::join_all(updates).await {
        if let Err(err) = result {
            log::error!("Reorder activities error: {:?}", err);
            return internal_error();
        }
    }

    match find_owned_trip(&client, user_id, trip_id).await {
        Ok(Some(trip)) => {
            let mut activities = match day_of(&trip, day_id) {
                Some(day) => day.activities.clone(),
                None => return not_found("Day not found"),
            };
            activities.sort_by_key(|a| a.order);
            HttpResponse::Ok().json(json!({ "activities": activities }))
        }
        Ok(None) => not_found("Trip not found"),
        Err(err) => {
            log::error!("Reorder activities error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn bulk_create_activities(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
    body: web::Json<Value>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let (trip_path, day_path) = path.into_inner();
    let (trip_id, day_id) = match parse_path_ids(&trip_path, &day_path) {
        Ok(ids) => ids,
        Err(response) => return response,
    };

    let entries = match body.get("activities").and_then(Value::as_array) {
        Some(entries) => entries,
        None => {
            return HttpResponse::BadRequest()
                .json(json!({ "error": "activities must be an array" }))
        }
    };

    let client = data.into_inner();
    let trip = match find_owned_trip(&client, user_id, trip_id).await {
        Ok(Some(trip)) => trip,
        Ok(None) => return not_found("Trip not found"),
        Err(err) => {
            log::error!("Bulk create activities error: {:?}", err);
            return internal_error();
        }
    };
    if day_of(&trip, day_id).is_none() {
        return not_found("Day not found");
    }

    let mut activities = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let input = match CreateActivityInput::parse(entry) {
            Ok(input) => input,
            Err(issues) => {
                return HttpResponse::BadRequest().json(json!({
                    "error": format!("Validation failed for activity {}", index),
                    "details": issues,
                }))
            }
        };
        activities.push(Activity {
            id: ObjectId::new(),
            title: input.title,
            description: input.description,
            start_time: input.start_time,
            end_time: input.end_time,
            location: input.location,
            estimated_cost: input.estimated_cost,
            category: input.category,
            order: index as i32,
        });
    }

    let activity_docs = match bson::to_bson(&activities) {
        Ok(bson::Bson::Array(docs)) => docs,
        Ok(_) => return internal_error(),
        Err(err) => {
            log::error!("Failed to serialize activities: {:?}", err);
            return internal_error();
        }
    };

    let options = UpdateOptions::builder()
        .array_filters(vec![doc! { "d._id": day_id }])
        .build();
    let update = trips_collection(&client)
        .update_one(
            doc! { "_id": trip_id, "userId": user_id },
            doc! { "$push": { "itineraryDays.$[d].activities": { "$each": activity_docs } } },
        )
        .with_options(options)
        .await;
    if let Err(err) = update {
        log::error!("Bulk create activities error: {:?}", err);
        return internal_error();
    }

    let created = activities.len();
    match find_owned_trip(&client, user_id, trip_id).await {
        Ok(Some(trip)) => {
            let mut activities = match day_of(&trip, day_id) {
                Some(day) => day.activities.clone(),
                None => return not_found("Day not found"),
            };
            activities.sort_by_key(|a| a.order);
            HttpResponse::Created().json(json!({
                "message": format!("{} activities created", created),
                "activities": activities,
            }))
        }
        Ok(None) => not_found("Trip not found"),
        Err(err) => {
            log::error!("Bulk create activities error: {:?}", err);
            internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(
        title: &str,
        category: ActivityCategory,
        cost: Option<f64>,
        order: i32,
    ) -> Activity {
        Activity {
            id: ObjectId::new(),
            title: title.to_string(),
            description: None,
            start_time: Some(format!("{:02}:00", 8 + order)),
            end_time: None,
            location: Some("Rome Old Town".to_string()),
            estimated_cost: cost,
            category,
            order,
        }
    }

    fn query() -> ActivityListQuery {
        ActivityListQuery {
            category: None,
            search: None,
            sort_by: None,
            sort_order: None,
            min_cost: None,
            max_cost: None,
        }
    }

    #[test]
    fn filters_by_category() {
        let activities = vec![
            activity("a", ActivityCategory::Food, None, 0),
            activity("b", ActivityCategory::Transport, None, 1),
        ];
        let mut q = query();
        q.category = Some("FOOD".to_string());
        let filtered = filter_activities(activities, &q);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "a");
    }

    #[test]
    fn cost_range_excludes_uncosted_activities() {
        let activities = vec![
            activity("cheap", ActivityCategory::Food, Some(10.0), 0),
            activity("pricey", ActivityCategory::Food, Some(90.0), 1),
            activity("unknown", ActivityCategory::Food, None, 2),
        ];
        let mut q = query();
        q.min_cost = Some("5".to_string());
        q.max_cost = Some("50".to_string());
        let filtered = filter_activities(activities, &q);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "cheap");
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let activities = vec![
            activity("Colosseum tour", ActivityCategory::Sightseeing, None, 0),
            activity("Lunch", ActivityCategory::Food, None, 1),
        ];
        let mut q = query();
        q.search = Some("COLOSSEUM".to_string());
        assert_eq!(filter_activities(activities.clone(), &q).len(), 1);

        // location matches too
        q.search = Some("old town".to_string());
        assert_eq!(filter_activities(activities, &q).len(), 2);
    }

    #[test]
    fn sorts_by_allowed_fields() {
        let mut activities = vec![
            activity("b", ActivityCategory::Food, Some(30.0), 1),
            activity("a", ActivityCategory::Food, Some(10.0), 0),
            activity("c", ActivityCategory::Food, Some(20.0), 2),
        ];
        sort_activities(&mut activities, "estimatedCost", false);
        let costs: Vec<f64> = activities.iter().filter_map(|a| a.estimated_cost).collect();
        assert_eq!(costs, vec![10.0, 20.0, 30.0]);

        sort_activities(&mut activities, "title", true);
        let titles: Vec<&str> = activities.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "b", "a"]);

        sort_activities(&mut activities, "order", false);
        let orders: Vec<i32> = activities.iter().map(|a| a.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn unknown_sort_field_falls_back_to_order() {
        let requested = resolve_sort_field(Some("category"), &SORT_FIELDS, "order");
        assert_eq!(requested, "order");
    }
}

use actix_web::{web, HttpResponse, Responder};
use bson::oid::ObjectId;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::middleware::auth::Claims;
use crate::models::destination::{Priority, SavedDestination};
use crate::routes::{
    authenticated_user, internal_error, not_found, resolve_sort_field, validation_failed,
};
use crate::schemas::{CreateDestinationInput, UpdateDestinationInput};
use crate::services::trip_service::{destinations_collection, find_owned_destination};
use crate::services::unsplash_service;

const SORT_FIELDS: [&str; 6] = [
    "createdAt",
    "updatedAt",
    "name",
    "country",
    "priority",
    "estimatedBudget",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationListQuery {
    page: Option<String>,
    limit: Option<String>,
    search: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    priority: Option<String>,
    country: Option<String>,
    tag: Option<String>,
    min_budget: Option<String>,
    max_budget: Option<String>,
}

fn contains_filter(term: &str) -> Document {
    doc! { "$regex": regex::escape(term), "$options": "i" }
}

fn page_param(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v >= 1)
        .unwrap_or(default)
}

fn build_list_filter(user_id: ObjectId, query: &DestinationListQuery) -> Document {
    let mut filter = doc! { "userId": user_id };

    if let Some(priority) = query.priority.as_deref().and_then(Priority::parse) {
        filter.insert("priority", priority.as_str());
    }
    if let Some(country) = &query.country {
        filter.insert("country", contains_filter(country));
    }
    if let Some(tag) = &query.tag {
        // Element equality on an array field is set membership in Mongo.
        filter.insert("tags", tag.as_str());
    }

    let mut budget_range = Document::new();
    if let Some(min) = query.min_budget.as_deref().and_then(|v| v.parse::<f64>().ok()) {
        budget_range.insert("$gte", min);
    }
    if let Some(max) = query.max_budget.as_deref().and_then(|v| v.parse::<f64>().ok()) {
        budget_range.insert("$lte", max);
    }
    if !budget_range.is_empty() {
        filter.insert("estimatedBudget", budget_range);
    }

    if let Some(search) = &query.search {
        let pattern = contains_filter(search);
        filter.insert(
            "$or",
            vec![
                doc! { "name": pattern.clone() },
                doc! { "country": pattern.clone() },
                doc! { "description": pattern.clone() },
                doc! { "notes": pattern },
            ],
        );
    }

    filter
}

pub async fn list_destinations(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    query: web::Query<DestinationListQuery>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let client = data.into_inner();
    let collection = destinations_collection(&client);

    let page = page_param(query.page.as_deref(), 1);
    let limit = page_param(query.limit.as_deref(), 10);
    let skip = (page - 1) * limit;

    let filter = build_list_filter(user_id, &query);
    let sort_by = resolve_sort_field(query.sort_by.as_deref(), &SORT_FIELDS, "createdAt");
    let ascending = query.sort_order.as_deref() == Some("asc");
    let sort_order = if ascending { 1 } else { -1 };
    let sort_order_label = if ascending { "asc" } else { "desc" };

    let total = match collection.count_documents(filter.clone()).await {
        Ok(total) => total as i64,
        Err(err) => {
            log::error!("Get destinations error: {:?}", err);
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

    let destinations: Vec<SavedDestination> = match cursor {
        Ok(cursor) => match cursor.try_collect().await {
            Ok(destinations) => destinations,
            Err(err) => {
                log::error!("Failed to collect destinations: {:?}", err);
                return internal_error();
            }
        },
        Err(err) => {
            log::error!("Get destinations error: {:?}", err);
            return internal_error();
        }
    };

    let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };

    HttpResponse::Ok().json(json!({
        "destinations": destinations,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "totalPages": total_pages,
        },
        "filters": {
            "search": &query.search,
            "priority": &query.priority,
            "country": &query.country,
            "sortBy": sort_by,
            "sortOrder": sort_order_label,
        },
    }))
}

pub async fn get_destination(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let destination_id = match ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => return not_found("Destination not found"),
    };

    let client = data.into_inner();
    match find_owned_destination(&client, user_id, destination_id).await {
        Ok(Some(destination)) => HttpResponse::Ok().json(json!({ "destination": destination })),
        Ok(None) => not_found("Destination not found"),
        Err(err) => {
            log::error!("Get destination error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn create_destination(
    claims: web::ReqData<Claims>,
    config: web::Data<AppConfig>,
    data: web::Data<Arc<Client>>,
    body: web::Json<Value>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let input = match CreateDestinationInput::parse(&body) {
        Ok(input) => input,
        Err(issues) => return validation_failed(issues),
    };

    // Without a supplied image, try a live cover photo and fall back to a
    // static one.
    let image_url = match input.image_url {
        Some(url) => url,
        None => unsplash_service::fetch_cover_image(
            config.unsplash_access_key.as_deref(),
            &input.name,
            &input.country,
        )
        .await
        .unwrap_or_else(|| unsplash_service::FALLBACK_IMAGES[0].to_string()),
    };

    let now = bson::DateTime::now();
    let mut destination = SavedDestination {
        id: None,
        user_id,
        name: input.name,
        country: input.country,
        description: input.description,
        image_url: Some(image_url),
        notes: input.notes,
        priority: input.priority.unwrap_or(Priority::Medium),
        best_season: input.best_season,
        estimated_budget: input.estimated_budget,
        tags: input.tags.unwrap_or_default(),
        created_at: Some(now),
        updated_at: Some(now),
    };

    let client = data.into_inner();
    match destinations_collection(&client).insert_one(&destination).await {
        Ok(result) => {
            destination.id = result.inserted_id.as_object_id();
            HttpResponse::Created().json(json!({ "destination": destination }))
        }
        Err(err) => {
            log::error!("Create destination error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn update_destination(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let destination_id = match ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => return not_found("Destination not found"),
    };
    let input = match UpdateDestinationInput::parse(&body) {
        Ok(input) => input,
        Err(issues) => return validation_failed(issues),
    };

    let mut set = Document::new();
    if let Some(name) = input.name {
        set.insert("name", name);
    }
    if let Some(country) = input.country {
        set.insert("country", country);
    }
    if let Some(description) = input.description {
        set.insert("description", description);
    }
    if let Some(image_url) = input.image_url {
        set.insert("imageUrl", image_url);
    }
    if let Some(notes) = input.notes {
        set.insert("notes", notes);
    }
    if let Some(priority) = input.priority {
        set.insert("priority", priority.as_str());
    }
    if let Some(best_season) = input.best_season {
        set.insert("bestSeason", best_season);
    }
    if let Some(budget) = input.estimated_budget {
        set.insert("estimatedBudget", budget);
    }
    if let Some(tags) = input.tags {
        set.insert("tags", tags);
    }
    set.insert("updatedAt", bson::DateTime::now());

    let client = data.into_inner();
    let options = mongodb::options::FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let updated = destinations_collection(&client)
        .find_one_and_update(
            doc! { "_id": destination_id, "userId": user_id },
            doc! { "$set": set },
        )
        .with_options(options)
        .await;

    match updated {
        Ok(Some(destination)) => HttpResponse::Ok().json(json!({ "destination": destination })),
        Ok(None) => not_found("Destination not found"),
        Err(err) => {
            log::error!("Update destination error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn delete_destination(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let destination_id = match ObjectId::parse_str(path.as_str()) {
        Ok(id) => id,
        Err(_) => return not_found("Destination not found"),
    };

    let client = data.into_inner();
    match destinations_collection(&client)
        .delete_one(doc! { "_id": destination_id, "userId": user_id })
        .await
    {
        Ok(result) if result.deleted_count == 0 => not_found("Destination not found"),
        Ok(_) => HttpResponse::Ok().json(json!({ "message": "Destination deleted successfully" })),
        Err(err) => {
            log::error!("Delete destination error: {:?}", err);
            internal_error()
        }
    }
}

pub async fn destination_stats(
    claims: web::ReqData<Claims>,
    data: web::Data<Arc<Client>>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let client = data.into_inner();
    match stats_counts(&client, user_id).await {
        Ok((total, high_priority, unique_countries)) => HttpResponse::Ok().json(json!({
            "stats": {
                "total": total,
                "highPriority": high_priority,
                "uniqueCountries": unique_countries,
            },
        })),
        Err(err) => {
            log::error!("Get destination stats error: {:?}", err);
            internal_error()
        }
    }
}

async fn stats_counts(
    client: &Client,
    user_id: ObjectId,
) -> Result<(u64, u64, usize), mongodb::error::Error> {
    let collection = destinations_collection(client);
    let total = collection.count_documents(doc! { "userId": user_id }).await?;
    let high_priority = collection
        .count_documents(doc! { "userId": user_id, "priority": Priority::High.as_str() })
        .await?;
    let countries = collection
        .distinct("country", doc! { "userId": user_id })
        .await?;
    Ok((total, high_priority, countries.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> DestinationListQuery {
        DestinationListQuery {
            page: None,
            limit: None,
            search: None,
            sort_by: None,
            sort_order: None,
            priority: None,
            country: None,
            tag: None,
            min_budget: None,
            max_budget: None,
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
    fn tag_filter_uses_element_equality() {
        let mut q = query();
        q.tag = Some("beach".to_string());
        let filter = build_list_filter(ObjectId::new(), &q);
        assert_eq!(filter.get_str("tags").unwrap(), "beach");
    }

    #[test]
    fn budget_range_parses_floats() {
        let mut q = query();
        q.min_budget = Some("100.5".to_string());
        q.max_budget = Some("nonsense".to_string());
        let filter = build_list_filter(ObjectId::new(), &q);
        let range = filter.get_document("estimatedBudget").unwrap();
        assert_eq!(range.get_f64("$gte").unwrap(), 100.5);
        assert!(!range.contains_key("$lte"));
    }

    #[test]
    fn unknown_priority_is_ignored() {
        let mut q = query();
        q.priority = Some("URGENT".to_string());
        assert!(!build_list_filter(ObjectId::new(), &q).contains_key("priority"));
    }

    #[test]
    fn search_spans_the_four_text_fields() {
        let mut q = query();
        q.search = Some("kyoto".to_string());
        let filter = build_list_filter(ObjectId::new(), &q);
        assert_eq!(filter.get_array("$or").unwrap().len(), 4);
    }
}

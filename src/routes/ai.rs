use actix_web::{web, HttpResponse, Responder};
use mongodb::Client;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::middleware::auth::Claims;
use crate::routes::{authenticated_user, internal_error, validation_failed};
use crate::schemas::GenerateTripInput;
use crate::services::trip_generation_service::{self, GenerationParams};
use crate::services::{trip_service, unsplash_service};

/*
    POST /api/ai/generate

    The full pipeline: validate, enrich with destination images, pick a
    generation strategy, persist the composed trip. Image and generation
    faults are absorbed by fallbacks; only the final insert can fail the
    request.
*/
pub async fn generate_trip(
    claims: web::ReqData<Claims>,
    config: web::Data<AppConfig>,
    data: web::Data<Arc<Client>>,
    body: web::Json<Value>,
) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let input = match GenerateTripInput::parse(&body) {
        Ok(input) => input,
        Err(issues) => return validation_failed(issues),
    };

    // Day count spans the range inclusively: June 1 to June 3 is 3 days.
    let span = input.end_date - input.start_date;
    let days = ((span.num_seconds() as f64 / 86_400.0).ceil() as i64 + 1).max(1);

    let images = unsplash_service::fetch_destination_images(
        config.unsplash_access_key.as_deref(),
        &input.destination,
        &input.country,
    )
    .await;

    let params = GenerationParams {
        destination: input.destination.clone(),
        country: input.country.clone(),
        days,
        budget: input.budget,
        travel_group: input.travel_group,
        preferences: input.preferences.clone(),
    };
    let generated = trip_generation_service::generate_trip(&config, &params).await;

    let client = data.into_inner();
    match trip_service::create_generated_trip(&client, user_id, &input, days, generated, images)
        .await
    {
        Ok(mut trip) => {
            trip.sort_itinerary();
            HttpResponse::Created().json(json!({ "trip": trip }))
        }
        Err(err) => {
            log::error!("Generate trip error: {:?}", err);
            internal_error()
        }
    }
}

use actix_web::{HttpResponse, Responder};
use serde_json::json;

/*
    GET / and GET /health are unauthenticated liveness probes.
*/
pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "message": "Odysea API is running",
    }))
}

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn not_found_handler() -> impl Responder {
    HttpResponse::NotFound().json(json!({ "error": "Not found" }))
}

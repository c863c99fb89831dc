use actix_web::{test, web, App, HttpResponse, Responder};
use serde_json::json;

use odysea_api::routes;

// Mock handlers standing in for the database-backed routes; the surface
// tests only assert status codes and the `{error}` body contract.
async fn list_trips() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "trips": [],
        "pagination": { "page": 1, "limit": 10, "total": 0, "totalPages": 0 },
    }))
}

async fn trip_not_found() -> impl Responder {
    HttpResponse::NotFound().json(json!({ "error": "Trip not found" }))
}

async fn invalid_body() -> impl Responder {
    HttpResponse::BadRequest().json(json!({
        "error": "Validation failed",
        "details": [{ "path": "title", "message": "Title is required" }],
    }))
}

fn test_app() -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .route("/", web::get().to(routes::health::root))
        .route("/health", web::get().to(routes::health::health))
        .service(
            web::scope("/api/trips")
                .route("", web::get().to(list_trips))
                .route("", web::post().to(invalid_body))
                .route("/{id}", web::get().to(trip_not_found)),
        )
        .default_service(web::route().to(routes::health::not_found_handler))
}

#[actix_rt::test]
async fn root_reports_liveness() {
    let app = test::init_service(test_app()).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Odysea API is running");
}

#[actix_rt::test]
async fn health_reports_status_and_timestamp() {
    let app = test::init_service(test_app()).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[actix_rt::test]
async fn unknown_routes_get_json_404() {
    let app = test::init_service(test_app()).await;

    let req = test::TestRequest::get().uri("/api/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Not found");
}

#[actix_rt::test]
async fn missing_trip_is_a_json_404() {
    let app = test::init_service(test_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/trips/65f000000000000000000000")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Trip not found");
}

#[actix_rt::test]
async fn validation_failures_carry_field_details() {
    let app = test::init_service(test_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/trips")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"][0]["path"], "title");
}

#[actix_rt::test]
async fn list_shape_includes_pagination() {
    let app = test::init_service(test_app()).await;

    let req = test::TestRequest::get()
        .uri("/api/trips?page=1&limit=10")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["trips"].is_array());
    assert_eq!(body["pagination"]["page"], 1);
}

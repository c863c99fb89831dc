use actix_web::{body::to_bytes, test, web, App, HttpResponse, Responder};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use odysea_api::middleware::auth::{AuthMiddleware, Claims};

const SECRET: &str = "test-secret";

fn make_token(secret: &str, hours_until_expiry: i64) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: "traveler@example.com".to_string(),
        iat: (now - Duration::hours(1)).timestamp() as usize,
        exp: (now + Duration::hours(hours_until_expiry)).timestamp() as usize,
        user_id: bson::oid::ObjectId::new().to_hex(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

async fn whoami(claims: web::ReqData<Claims>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "sub": claims.sub,
        "userId": claims.user_id,
    }))
}

async fn error_status_and_body(err: actix_web::Error) -> (u16, Value) {
    let resp = err.error_response();
    let status = resp.status().as_u16();
    let bytes = to_bytes(resp.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn call(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
    req: actix_http::Request,
) -> (u16, Value) {
    match test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status().as_u16();
            let body = test::read_body_json(resp).await;
            (status, body)
        }
        Err(err) => error_status_and_body(err).await,
    }
}

macro_rules! protected_app {
    () => {
        test::init_service(
            App::new().service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(SECRET))
                    .route("/whoami", web::get().to(whoami)),
            ),
        )
        .await
    };
}

#[actix_rt::test]
async fn missing_token_is_rejected() {
    let app = protected_app!();

    let req = test::TestRequest::get().uri("/api/whoami").to_request();
    let (status, body) = call(&app, req).await;

    assert_eq!(status, 401);
    assert_eq!(body["error"], "Unauthorized: No token provided");
}

#[actix_rt::test]
async fn non_bearer_scheme_is_rejected() {
    let app = protected_app!();

    let req = test::TestRequest::get()
        .uri("/api/whoami")
        .insert_header(("Authorization", format!("Token {}", make_token(SECRET, 1))))
        .to_request();
    let (status, body) = call(&app, req).await;

    assert_eq!(status, 401);
    assert_eq!(body["error"], "Unauthorized: No token provided");
}

#[actix_rt::test]
async fn garbage_token_is_rejected() {
    let app = protected_app!();

    let req = test::TestRequest::get()
        .uri("/api/whoami")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let (status, body) = call(&app, req).await;

    assert_eq!(status, 401);
    assert_eq!(body["error"], "Unauthorized: Invalid token");
}

#[actix_rt::test]
async fn expired_token_is_rejected() {
    let app = protected_app!();

    let req = test::TestRequest::get()
        .uri("/api/whoami")
        .insert_header(("Authorization", format!("Bearer {}", make_token(SECRET, -2))))
        .to_request();
    let (status, body) = call(&app, req).await;

    assert_eq!(status, 401);
    assert_eq!(body["error"], "Unauthorized: Invalid token");
}

#[actix_rt::test]
async fn token_signed_with_wrong_secret_is_rejected() {
    let app = protected_app!();

    let req = test::TestRequest::get()
        .uri("/api/whoami")
        .insert_header((
            "Authorization",
            format!("Bearer {}", make_token("other-secret", 1)),
        ))
        .to_request();
    let (status, _body) = call(&app, req).await;

    assert_eq!(status, 401);
}

#[actix_rt::test]
async fn valid_token_passes_claims_to_the_handler() {
    let app = protected_app!();

    let req = test::TestRequest::get()
        .uri("/api/whoami")
        .insert_header(("Authorization", format!("Bearer {}", make_token(SECRET, 1))))
        .to_request();
    let (status, body) = call(&app, req).await;

    assert_eq!(status, 200);
    assert_eq!(body["sub"], "traveler@example.com");
    assert!(body["userId"].as_str().unwrap().len() == 24);
}

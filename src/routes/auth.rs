use actix_web::{web, HttpResponse, Responder};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::Client;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::mongo::{DB_NAME, USERS};
use crate::middleware::auth::Claims;
use crate::models::user::{User, UserPublic};
use crate::routes::{authenticated_user, internal_error, not_found, validation_failed};
use crate::schemas::{LoginInput, RegisterInput};

fn users_collection(client: &Client) -> mongodb::Collection<User> {
    client.database(DB_NAME).collection(USERS)
}

pub async fn register(
    config: web::Data<AppConfig>,
    data: web::Data<Arc<Client>>,
    body: web::Json<Value>,
) -> impl Responder {
    let input = match RegisterInput::parse(&body) {
        Ok(input) => input,
        Err(issues) => return validation_failed(issues),
    };

    let client = data.into_inner();
    let collection = users_collection(&client);

    match collection.find_one(doc! { "email": &input.email }).await {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().json(json!({ "error": "User already exists" }))
        }
        Ok(None) => {}
        Err(err) => {
            log::error!("Register lookup error: {:?}", err);
            return internal_error();
        }
    }

    let hash = match bcrypt::hash(&input.password, bcrypt::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(err) => {
            log::error!("Password hashing failed: {:?}", err);
            return internal_error();
        }
    };

    let now = bson::DateTime::now();
    let mut user = User {
        id: None,
        email: input.email,
        password: hash,
        name: input.name,
        created_at: Some(now),
        updated_at: Some(now),
    };

    match collection.insert_one(&user).await {
        Ok(result) => {
            let user_id = match result.inserted_id.as_object_id() {
                Some(id) => id,
                None => return internal_error(),
            };
            user.id = Some(user_id);
            match generate_token(&user.email, user_id, &config.jwt_secret) {
                Ok(token) => HttpResponse::Created().json(json!({
                    "token": token,
                    "user": UserPublic::from(user),
                })),
                Err(err) => {
                    log::error!("Token generation failed: {:?}", err);
                    internal_error()
                }
            }
        }
        Err(err) => {
            log::error!("Failed to create user: {:?}", err);
            internal_error()
        }
    }
}

pub async fn login(
    config: web::Data<AppConfig>,
    data: web::Data<Arc<Client>>,
    body: web::Json<Value>,
) -> impl Responder {
    let input = match LoginInput::parse(&body) {
        Ok(input) => input,
        Err(issues) => return validation_failed(issues),
    };

    let client = data.into_inner();
    let collection = users_collection(&client);

    let user = match collection.find_one(doc! { "email": &input.email }).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::Unauthorized().json(json!({ "error": "Invalid credentials" }))
        }
        Err(err) => {
            log::error!("Login lookup error: {:?}", err);
            return internal_error();
        }
    };

    if !bcrypt::verify(&input.password, &user.password).unwrap_or(false) {
        return HttpResponse::Unauthorized().json(json!({ "error": "Invalid credentials" }));
    }

    let user_id = match user.id {
        Some(id) => id,
        None => return internal_error(),
    };

    match generate_token(&user.email, user_id, &config.jwt_secret) {
        Ok(token) => HttpResponse::Ok().json(json!({
            "token": token,
            "user": UserPublic::from(user),
        })),
        Err(err) => {
            log::error!("Token generation failed: {:?}", err);
            internal_error()
        }
    }
}

pub async fn me(claims: web::ReqData<Claims>, data: web::Data<Arc<Client>>) -> impl Responder {
    let user_id = match authenticated_user(&claims) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let client = data.into_inner();
    match users_collection(&client)
        .find_one(doc! { "_id": user_id })
        .await
    {
        Ok(Some(user)) => HttpResponse::Ok().json(json!({ "user": UserPublic::from(user) })),
        Ok(None) => not_found("User not found"),
        Err(err) => {
            log::error!("Failed to fetch user: {:?}", err);
            internal_error()
        }
    }
}

fn generate_token(
    email: &str,
    user_id: ObjectId,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();

    let claims = Claims {
        sub: email.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(24)).timestamp() as usize,
        user_id: user_id.to_hex(),
    };

    let header = Header::new(Algorithm::HS256);
    encode(&header, &claims, &EncodingKey::from_secret(secret.as_ref()))
}

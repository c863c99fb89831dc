pub mod activities;
pub mod ai;
pub mod auth;
pub mod destinations;
pub mod health;
pub mod trips;

use actix_web::HttpResponse;
use bson::oid::ObjectId;
use serde_json::json;

use crate::middleware::auth::Claims;
use crate::schemas::ValidationIssue;

pub(crate) fn validation_failed(issues: Vec<ValidationIssue>) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({
        "error": "Validation failed",
        "details": issues,
    }))
}

pub(crate) fn not_found(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": message }))
}

pub(crate) fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({ "error": "Internal server error" }))
}

/// Claims are produced by the auth middleware; the user id inside is the
/// hex ObjectId issued at login.
pub(crate) fn authenticated_user(claims: &Claims) -> Result<ObjectId, HttpResponse> {
    ObjectId::parse_str(&claims.user_id)
        .map_err(|_| HttpResponse::BadRequest().json(json!({ "error": "Invalid user ID" })))
}

/// Sort fields come from a fixed allow-list per collection; anything else
/// falls back to the default.
pub(crate) fn resolve_sort_field<'a>(
    requested: Option<&'a str>,
    allowed: &[&'a str],
    default: &'a str,
) -> &'a str {
    match requested {
        Some(candidate) if allowed.contains(&candidate) => candidate,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_allow_list() {
        let allowed = ["startDate", "title"];
        assert_eq!(resolve_sort_field(Some("title"), &allowed, "startDate"), "title");
        assert_eq!(
            resolve_sort_field(Some("password"), &allowed, "startDate"),
            "startDate"
        );
        assert_eq!(resolve_sort_field(None, &allowed, "startDate"), "startDate");
    }
}

//! Request-body validation. Each operation has a typed input struct with a
//! `parse` constructor that checks a raw JSON body field by field and
//! returns either the normalized input or the full list of violations.
//! Violations carry the originating field path and a readable message and
//! surface as a 400, never a fault.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::models::destination::Priority;
use crate::models::trip::{ActivityCategory, TravelGroup, TripBudget, TripStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn is_valid_email(email: &str) -> bool {
    let re = regex::Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*$",
    );
    re.unwrap().is_match(email)
}

fn field<'a>(body: &'a Value, name: &str) -> Option<&'a Value> {
    match body.get(name) {
        Some(Value::Null) | None => None,
        Some(v) => Some(v),
    }
}

fn require_string(
    body: &Value,
    name: &str,
    min_len: usize,
    required_message: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match field(body, name) {
        None => {
            issues.push(ValidationIssue::new(name, required_message));
            None
        }
        Some(Value::String(s)) if s.chars().count() >= min_len => Some(s.clone()),
        Some(Value::String(_)) => {
            issues.push(ValidationIssue::new(name, required_message));
            None
        }
        Some(_) => {
            issues.push(ValidationIssue::new(name, "Expected string"));
            None
        }
    }
}

fn optional_string(body: &Value, name: &str, issues: &mut Vec<ValidationIssue>) -> Option<String> {
    match field(body, name) {
        None => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            issues.push(ValidationIssue::new(name, "Expected string"));
            None
        }
    }
}

fn optional_number(body: &Value, name: &str, issues: &mut Vec<ValidationIssue>) -> Option<f64> {
    match field(body, name) {
        None => None,
        Some(v) => match v.as_f64() {
            Some(n) => Some(n),
            None => {
                issues.push(ValidationIssue::new(name, "Expected number"));
                None
            }
        },
    }
}

fn optional_integer(body: &Value, name: &str, issues: &mut Vec<ValidationIssue>) -> Option<i32> {
    match field(body, name) {
        None => None,
        Some(v) => match v.as_i64() {
            Some(n) => Some(n as i32),
            None => {
                issues.push(ValidationIssue::new(name, "Expected number"));
                None
            }
        },
    }
}

fn optional_string_array(
    body: &Value,
    name: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<Vec<String>> {
    match field(body, name) {
        None => None,
        Some(Value::Array(items)) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item.as_str() {
                    Some(s) => out.push(s.to_string()),
                    None => {
                        issues.push(ValidationIssue::new(
                            &format!("{}.{}", name, i),
                            "Expected string",
                        ));
                        return None;
                    }
                }
            }
            Some(out)
        }
        Some(_) => {
            issues.push(ValidationIssue::new(name, "Expected array of strings"));
            None
        }
    }
}

fn require_enum<T>(
    body: &Value,
    name: &str,
    parse: fn(&str) -> Option<T>,
    expected: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<T> {
    match field(body, name) {
        None => {
            issues.push(ValidationIssue::new(name, "Required"));
            None
        }
        Some(v) => optional_enum_value(v, name, parse, expected, issues),
    }
}

fn optional_enum<T>(
    body: &Value,
    name: &str,
    parse: fn(&str) -> Option<T>,
    expected: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<T> {
    field(body, name).and_then(|v| optional_enum_value(v, name, parse, expected, issues))
}

fn optional_enum_value<T>(
    value: &Value,
    name: &str,
    parse: fn(&str) -> Option<T>,
    expected: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<T> {
    match value.as_str().and_then(parse) {
        Some(parsed) => Some(parsed),
        None => {
            issues.push(ValidationIssue::new(
                name,
                format!("Invalid enum value. Expected one of: {}", expected),
            ));
            None
        }
    }
}

fn require_date(
    body: &Value,
    name: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<DateTime<Utc>> {
    match field(body, name) {
        None => {
            issues.push(ValidationIssue::new(name, "Required"));
            None
        }
        Some(v) => date_value(v, name, issues),
    }
}

fn optional_date(
    body: &Value,
    name: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<DateTime<Utc>> {
    field(body, name).and_then(|v| date_value(v, name, issues))
}

fn date_value(
    value: &Value,
    name: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<DateTime<Utc>> {
    match value.as_str().and_then(parse_date_string) {
        Some(dt) => Some(dt),
        None => {
            issues.push(ValidationIssue::new(name, "Invalid date"));
            None
        }
    }
}

fn finish<T>(input: Option<T>, issues: Vec<ValidationIssue>) -> Result<T, Vec<ValidationIssue>> {
    match input {
        Some(parsed) if issues.is_empty() => Ok(parsed),
        _ => Err(issues),
    }
}

const BUDGET_VALUES: &str = "MID_RANGE, LUXURY, PREMIUM";
const TRAVEL_GROUP_VALUES: &str = "SOLO, COUPLE, FRIENDS, FAMILY";
const STATUS_VALUES: &str = "UPCOMING, ONGOING, COMPLETED, CANCELLED";
const CATEGORY_VALUES: &str =
    "TRANSPORT, ACCOMMODATION, FOOD, SIGHTSEEING, ACTIVITY, SHOPPING, OTHER";
const PRIORITY_VALUES: &str = "LOW, MEDIUM, HIGH";

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl RegisterInput {
    pub fn parse(body: &Value) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let email = require_string(body, "email", 1, "Invalid email address", &mut issues);
        if let Some(email) = &email {
            if !is_valid_email(email) {
                issues.push(ValidationIssue::new("email", "Invalid email address"));
            }
        }
        let password = require_string(
            body,
            "password",
            6,
            "Password must be at least 6 characters",
            &mut issues,
        );
        let name = require_string(
            body,
            "name",
            2,
            "Name must be at least 2 characters",
            &mut issues,
        );

        let input = match (email, password, name) {
            (Some(email), Some(password), Some(name)) => Some(Self {
                email,
                password,
                name,
            }),
            _ => None,
        };
        finish(input, issues)
    }
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn parse(body: &Value) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let email = require_string(body, "email", 1, "Invalid email address", &mut issues);
        if let Some(email) = &email {
            if !is_valid_email(email) {
                issues.push(ValidationIssue::new("email", "Invalid email address"));
            }
        }
        let password = require_string(body, "password", 1, "Password is required", &mut issues);

        let input = match (email, password) {
            (Some(email), Some(password)) => Some(Self { email, password }),
            _ => None,
        };
        finish(input, issues)
    }
}

#[derive(Debug, Clone)]
pub struct CreateTripInput {
    pub title: String,
    pub description: Option<String>,
    pub destination: String,
    pub country: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub budget: TripBudget,
    pub travel_group: TravelGroup,
    pub cover_image: Option<String>,
}

impl CreateTripInput {
    pub fn parse(body: &Value) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let title = require_string(body, "title", 1, "Title is required", &mut issues);
        let description = optional_string(body, "description", &mut issues);
        let destination =
            require_string(body, "destination", 1, "Destination is required", &mut issues);
        let country = require_string(body, "country", 1, "Country is required", &mut issues);
        let start_date = require_date(body, "startDate", &mut issues);
        let end_date = require_date(body, "endDate", &mut issues);
        let budget = require_enum(body, "budget", TripBudget::parse, BUDGET_VALUES, &mut issues);
        let travel_group = require_enum(
            body,
            "travelGroup",
            TravelGroup::parse,
            TRAVEL_GROUP_VALUES,
            &mut issues,
        );
        let cover_image = optional_string(body, "coverImage", &mut issues);

        let input = match (title, destination, country, start_date, end_date, budget, travel_group)
        {
            (
                Some(title),
                Some(destination),
                Some(country),
                Some(start_date),
                Some(end_date),
                Some(budget),
                Some(travel_group),
            ) => Some(Self {
                title,
                description,
                destination,
                country,
                start_date,
                end_date,
                budget,
                travel_group,
                cover_image,
            }),
            _ => None,
        };
        finish(input, issues)
    }
}

/// Update makes every create field optional and additionally accepts a
/// status transition.
#[derive(Debug, Clone, Default)]
pub struct UpdateTripInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub destination: Option<String>,
    pub country: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub budget: Option<TripBudget>,
    pub travel_group: Option<TravelGroup>,
    pub cover_image: Option<String>,
    pub status: Option<TripStatus>,
}

impl UpdateTripInput {
    pub fn parse(body: &Value) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let input = Self {
            title: optional_string(body, "title", &mut issues),
            description: optional_string(body, "description", &mut issues),
            destination: optional_string(body, "destination", &mut issues),
            country: optional_string(body, "country", &mut issues),
            start_date: optional_date(body, "startDate", &mut issues),
            end_date: optional_date(body, "endDate", &mut issues),
            budget: optional_enum(body, "budget", TripBudget::parse, BUDGET_VALUES, &mut issues),
            travel_group: optional_enum(
                body,
                "travelGroup",
                TravelGroup::parse,
                TRAVEL_GROUP_VALUES,
                &mut issues,
            ),
            cover_image: optional_string(body, "coverImage", &mut issues),
            status: optional_enum(body, "status", TripStatus::parse, STATUS_VALUES, &mut issues),
        };
        finish(Some(input), issues)
    }
}

#[derive(Debug, Clone)]
pub struct GenerateTripInput {
    pub destination: String,
    pub country: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub budget: TripBudget,
    pub travel_group: TravelGroup,
    pub preferences: Option<String>,
}

impl GenerateTripInput {
    pub fn parse(body: &Value) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let destination =
            require_string(body, "destination", 1, "Destination is required", &mut issues);
        let country = require_string(body, "country", 1, "Country is required", &mut issues);
        let start_date = require_date(body, "startDate", &mut issues);
        let end_date = require_date(body, "endDate", &mut issues);
        let budget = require_enum(body, "budget", TripBudget::parse, BUDGET_VALUES, &mut issues);
        let travel_group = require_enum(
            body,
            "travelGroup",
            TravelGroup::parse,
            TRAVEL_GROUP_VALUES,
            &mut issues,
        );
        let preferences = optional_string(body, "preferences", &mut issues);

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                issues.push(ValidationIssue::new(
                    "endDate",
                    "endDate must be on or after startDate",
                ));
            }
        }

        let input = match (destination, country, start_date, end_date, budget, travel_group) {
            (
                Some(destination),
                Some(country),
                Some(start_date),
                Some(end_date),
                Some(budget),
                Some(travel_group),
            ) => Some(Self {
                destination,
                country,
                start_date,
                end_date,
                budget,
                travel_group,
                preferences,
            }),
            _ => None,
        };
        finish(input, issues)
    }
}

#[derive(Debug, Clone)]
pub struct CreateActivityInput {
    pub title: String,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub estimated_cost: Option<f64>,
    pub category: ActivityCategory,
    pub order: Option<i32>,
}

impl CreateActivityInput {
    pub fn parse(body: &Value) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let title = require_string(body, "title", 1, "Title is required", &mut issues);
        let description = optional_string(body, "description", &mut issues);
        let start_time = optional_string(body, "startTime", &mut issues);
        let end_time = optional_string(body, "endTime", &mut issues);
        let location = optional_string(body, "location", &mut issues);
        let estimated_cost = optional_number(body, "estimatedCost", &mut issues);
        let category = require_enum(
            body,
            "category",
            ActivityCategory::parse,
            CATEGORY_VALUES,
            &mut issues,
        );
        let order = optional_integer(body, "order", &mut issues);

        let input = match (title, category) {
            (Some(title), Some(category)) => Some(Self {
                title,
                description,
                start_time,
                end_time,
                location,
                estimated_cost,
                category,
                order,
            }),
            _ => None,
        };
        finish(input, issues)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateActivityInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub location: Option<String>,
    pub estimated_cost: Option<f64>,
    pub category: Option<ActivityCategory>,
    pub order: Option<i32>,
}

impl UpdateActivityInput {
    pub fn parse(body: &Value) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let input = Self {
            title: optional_string(body, "title", &mut issues),
            description: optional_string(body, "description", &mut issues),
            start_time: optional_string(body, "startTime", &mut issues),
            end_time: optional_string(body, "endTime", &mut issues),
            location: optional_string(body, "location", &mut issues),
            estimated_cost: optional_number(body, "estimatedCost", &mut issues),
            category: optional_enum(
                body,
                "category",
                ActivityCategory::parse,
                CATEGORY_VALUES,
                &mut issues,
            ),
            order: optional_integer(body, "order", &mut issues),
        };
        finish(Some(input), issues)
    }
}

#[derive(Debug, Clone)]
pub struct CreateDestinationInput {
    pub name: String,
    pub country: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
    pub best_season: Option<String>,
    pub estimated_budget: Option<f64>,
    pub tags: Option<Vec<String>>,
}

impl CreateDestinationInput {
    pub fn parse(body: &Value) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let name = require_string(body, "name", 1, "Name is required", &mut issues);
        let country = require_string(body, "country", 1, "Country is required", &mut issues);
        let description = optional_string(body, "description", &mut issues);
        let image_url = optional_image_url(body, &mut issues);
        let notes = optional_string(body, "notes", &mut issues);
        let priority =
            optional_enum(body, "priority", Priority::parse, PRIORITY_VALUES, &mut issues);
        let best_season = optional_string(body, "bestSeason", &mut issues);
        let estimated_budget = optional_number(body, "estimatedBudget", &mut issues);
        let tags = optional_string_array(body, "tags", &mut issues);

        let input = match (name, country) {
            (Some(name), Some(country)) => Some(Self {
                name,
                country,
                description,
                image_url,
                notes,
                priority,
                best_season,
                estimated_budget,
                tags,
            }),
            _ => None,
        };
        finish(input, issues)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateDestinationInput {
    pub name: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub priority: Option<Priority>,
    pub best_season: Option<String>,
    pub estimated_budget: Option<f64>,
    pub tags: Option<Vec<String>>,
}

impl UpdateDestinationInput {
    pub fn parse(body: &Value) -> Result<Self, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let input = Self {
            name: optional_string(body, "name", &mut issues),
            country: optional_string(body, "country", &mut issues),
            description: optional_string(body, "description", &mut issues),
            image_url: optional_image_url(body, &mut issues),
            notes: optional_string(body, "notes", &mut issues),
            priority: optional_enum(
                body,
                "priority",
                Priority::parse,
                PRIORITY_VALUES,
                &mut issues,
            ),
            best_season: optional_string(body, "bestSeason", &mut issues),
            estimated_budget: optional_number(body, "estimatedBudget", &mut issues),
            tags: optional_string_array(body, "tags", &mut issues),
        };
        finish(Some(input), issues)
    }
}

// An empty string is allowed and treated the same as an absent url (the
// route will fetch a cover image instead).
fn optional_image_url(body: &Value, issues: &mut Vec<ValidationIssue>) -> Option<String> {
    let url = optional_string(body, "imageUrl", issues)?;
    if url.is_empty() {
        return None;
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Some(url)
    } else {
        issues.push(ValidationIssue::new("imageUrl", "Invalid url"));
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_trip_accepts_valid_input() {
        let body = json!({
            "title": "Roman Holiday",
            "destination": "Rome",
            "country": "Italy",
            "startDate": "2025-06-01",
            "endDate": "2025-06-03",
            "budget": "MID_RANGE",
            "travelGroup": "SOLO"
        });
        let input = CreateTripInput::parse(&body).unwrap();
        assert_eq!(input.title, "Roman Holiday");
        assert_eq!(input.budget, TripBudget::MidRange);
        assert_eq!(input.travel_group, TravelGroup::Solo);
        assert!(input.description.is_none());
        assert_eq!((input.end_date - input.start_date).num_days(), 2);
    }

    #[test]
    fn create_trip_reports_each_missing_field() {
        let issues = CreateTripInput::parse(&json!({})).unwrap_err();
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        for expected in [
            "title",
            "destination",
            "country",
            "startDate",
            "endDate",
            "budget",
            "travelGroup",
        ] {
            assert!(paths.contains(&expected), "missing issue for {}", expected);
        }
    }

    #[test]
    fn create_trip_rejects_unknown_enum_value() {
        let body = json!({
            "title": "x",
            "destination": "Rome",
            "country": "Italy",
            "startDate": "2025-06-01",
            "endDate": "2025-06-03",
            "budget": "CHEAP",
            "travelGroup": "SOLO"
        });
        let issues = CreateTripInput::parse(&body).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "budget");
        assert!(issues[0].message.contains("MID_RANGE"));
    }

    #[test]
    fn update_trip_accepts_empty_body_and_status() {
        let input = UpdateTripInput::parse(&json!({})).unwrap();
        assert!(input.title.is_none());
        assert!(input.status.is_none());

        let input = UpdateTripInput::parse(&json!({"status": "COMPLETED"})).unwrap();
        assert_eq!(input.status, Some(TripStatus::Completed));
    }

    #[test]
    fn update_trip_rejects_wrong_types() {
        let issues = UpdateTripInput::parse(&json!({"title": 42})).unwrap_err();
        assert_eq!(issues[0].path, "title");
        assert_eq!(issues[0].message, "Expected string");
    }

    #[test]
    fn register_enforces_field_rules() {
        let issues = RegisterInput::parse(&json!({
            "email": "not-an-email",
            "password": "short",
            "name": "x"
        }))
        .unwrap_err();
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["email", "password", "name"]);

        let input = RegisterInput::parse(&json!({
            "email": "traveler@example.com",
            "password": "secret123",
            "name": "Traveler"
        }))
        .unwrap();
        assert_eq!(input.email, "traveler@example.com");
    }

    #[test]
    fn generate_trip_rejects_inverted_date_range() {
        let issues = GenerateTripInput::parse(&json!({
            "destination": "Rome",
            "country": "Italy",
            "startDate": "2025-06-03",
            "endDate": "2025-06-01",
            "budget": "MID_RANGE",
            "travelGroup": "SOLO"
        }))
        .unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "endDate");
    }

    #[test]
    fn activity_requires_title_and_category() {
        let issues = CreateActivityInput::parse(&json!({"estimatedCost": "12"})).unwrap_err();
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"title"));
        assert!(paths.contains(&"estimatedCost"));
        assert!(paths.contains(&"category"));

        let input = CreateActivityInput::parse(&json!({
            "title": "Colosseum tour",
            "category": "SIGHTSEEING",
            "estimatedCost": 25.5
        }))
        .unwrap();
        assert_eq!(input.category, ActivityCategory::Sightseeing);
        assert_eq!(input.estimated_cost, Some(25.5));
        assert!(input.order.is_none());
    }

    #[test]
    fn destination_tags_must_be_strings() {
        let issues = CreateDestinationInput::parse(&json!({
            "name": "Kyoto",
            "country": "Japan",
            "tags": ["temples", 3]
        }))
        .unwrap_err();
        assert_eq!(issues[0].path, "tags.1");
    }

    #[test]
    fn destination_image_url_rules() {
        // empty string is treated as absent
        let input = CreateDestinationInput::parse(&json!({
            "name": "Kyoto",
            "country": "Japan",
            "imageUrl": ""
        }))
        .unwrap();
        assert!(input.image_url.is_none());

        let issues = CreateDestinationInput::parse(&json!({
            "name": "Kyoto",
            "country": "Japan",
            "imageUrl": "ftp://example.com/x.jpg"
        }))
        .unwrap_err();
        assert_eq!(issues[0].path, "imageUrl");
    }

    #[test]
    fn date_parsing_accepts_both_forms() {
        assert!(parse_date_string("2025-06-01").is_some());
        assert!(parse_date_string("2025-06-01T10:30:00Z").is_some());
        assert!(parse_date_string("June 1st").is_none());
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::trip::{ActivityCategory, TravelGroup, TripBudget};
use crate::services::trip_generation_service::{
    GeneratedActivity, GeneratedDay, GeneratedTrip, GenerationParams,
};

const GEMINI_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

#[derive(Debug)]
pub enum GeminiError {
    Http(String),
    Api(String),
    EmptyReply,
    Parse(String),
}

impl std::fmt::Display for GeminiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeminiError::Http(err) => write!(f, "HTTP request failed: {}", err),
            GeminiError::Api(err) => write!(f, "Gemini API error: {}", err),
            GeminiError::EmptyReply => write!(f, "Gemini returned no candidates"),
            GeminiError::Parse(err) => write!(f, "Failed to parse Gemini reply: {}", err),
        }
    }
}

impl std::error::Error for GeminiError {}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

fn budget_description(budget: TripBudget) -> &'static str {
    match budget {
        TripBudget::MidRange => "mid-range budget ($100-200 per day)",
        TripBudget::Luxury => "luxury budget ($200-400 per day)",
        TripBudget::Premium => "premium/ultra-luxury budget ($400+ per day)",
    }
}

fn travel_group_description(group: TravelGroup) -> &'static str {
    match group {
        TravelGroup::Solo => "solo traveler",
        TravelGroup::Couple => "romantic couple",
        TravelGroup::Friends => "group of friends",
        TravelGroup::Family => "family with children",
    }
}

pub fn build_prompt(params: &GenerationParams) -> String {
    let group = travel_group_description(params.travel_group);
    format!(
        r#"Generate a detailed {days}-day travel itinerary for {destination}, {country}.

Travel details:
- Budget level: {budget}
- Travel group: {group}
- Special preferences: {preferences}

Please provide a JSON response with this exact structure:
{{
  "description": "A brief 1-2 sentence description of the trip",
  "totalEstimate": <total estimated cost as a number in USD>,
  "itinerary": [
    {{
      "title": "Day 1: <descriptive title>",
      "description": "Brief description of the day",
      "activities": [
        {{
          "title": "Activity name",
          "description": "Detailed description of the activity",
          "startTime": "HH:MM (24-hour format)",
          "endTime": "HH:MM (24-hour format)",
          "location": "Specific location name",
          "estimatedCost": <cost as number in USD>,
          "category": "TRANSPORT" | "ACCOMMODATION" | "FOOD" | "SIGHTSEEING" | "ACTIVITY" | "SHOPPING" | "OTHER"
        }}
      ]
    }}
  ]
}}

Important requirements:
1. Include 4-5 activities per day
2. Activities should be realistic and specific to {destination}
3. Include actual restaurant names, attractions, and locations when possible
4. Times should flow logically through the day
5. Costs should be realistic for the {budget_name} budget level
6. Tailor activities to {group}
7. First day should include arrival, last day should include departure
8. Return ONLY valid JSON, no markdown or additional text"#,
        days = params.days,
        destination = params.destination,
        country = params.country,
        budget = budget_description(params.budget),
        group = group,
        preferences = params.preferences.as_deref().unwrap_or("None specified"),
        budget_name = params.budget.as_str(),
    )
}

/// Model replies sometimes arrive wrapped in a markdown code block despite
/// the prompt asking for bare JSON.
pub fn strip_code_fences(text: &str) -> &str {
    let mut trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        trimmed = rest;
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        trimmed = rest;
    }
    if let Some(rest) = trimmed.strip_suffix("```") {
        trimmed = rest;
    }
    trimmed.trim()
}

/// Field-by-field defaulting of the parsed reply. Missing or wrong-typed
/// fields never fail the generation; every field falls back independently.
pub fn sanitize_reply(parsed: &Value, params: &GenerationParams) -> GeneratedTrip {
    let description = parsed["description"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "A {}-day trip to {}, {}",
                params.days, params.destination, params.country
            )
        });

    let total_estimate = parsed["totalEstimate"]
        .as_f64()
        .unwrap_or(params.days as f64 * 200.0);

    let itinerary = match parsed["itinerary"].as_array() {
        Some(days) => days
            .iter()
            .enumerate()
            .map(|(index, day)| sanitize_day(day, index, params))
            .collect(),
        None => Vec::new(),
    };

    GeneratedTrip {
        description,
        total_estimate,
        itinerary,
    }
}

fn sanitize_day(day: &Value, index: usize, params: &GenerationParams) -> GeneratedDay {
    let activities = match day["activities"].as_array() {
        Some(activities) => activities
            .iter()
            .map(|activity| sanitize_activity(activity, params))
            .collect(),
        None => Vec::new(),
    };

    GeneratedDay {
        title: day["title"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Day {}", index + 1)),
        description: day["description"].as_str().unwrap_or("").to_string(),
        activities,
    }
}

fn sanitize_activity(activity: &Value, params: &GenerationParams) -> GeneratedActivity {
    let category = activity["category"]
        .as_str()
        .and_then(ActivityCategory::parse)
        .unwrap_or(ActivityCategory::Activity);

    GeneratedActivity {
        title: activity["title"].as_str().unwrap_or("Activity").to_string(),
        description: activity["description"].as_str().unwrap_or("").to_string(),
        start_time: activity["startTime"].as_str().unwrap_or("09:00").to_string(),
        end_time: activity["endTime"].as_str().unwrap_or("10:00").to_string(),
        location: activity["location"]
            .as_str()
            .unwrap_or(&params.destination)
            .to_string(),
        estimated_cost: activity["estimatedCost"].as_f64().unwrap_or(50.0),
        category,
    }
}

/// One attempt against the live model. Any failure here is reported to the
/// caller, which falls back to the offline synthesizer.
pub async fn generate_with_gemini(
    api_key: &str,
    params: &GenerationParams,
) -> Result<GeneratedTrip, GeminiError> {
    let prompt = build_prompt(params);
    let request = GenerateContentRequest {
        contents: vec![RequestContent {
            parts: vec![RequestPart { text: &prompt }],
        }],
    };

    let response = reqwest::Client::new()
        .post(GEMINI_ENDPOINT)
        .query(&[("key", api_key)])
        .json(&request)
        .send()
        .await
        .map_err(|e| GeminiError::Http(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GeminiError::Api(format!("{}: {}", status, body)));
    }

    let reply: GenerateContentResponse = response
        .json()
        .await
        .map_err(|e| GeminiError::Parse(e.to_string()))?;

    let text = reply
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or(GeminiError::EmptyReply)?;

    let parsed: Value = serde_json::from_str(strip_code_fences(&text))
        .map_err(|e| GeminiError::Parse(e.to_string()))?;

    Ok(sanitize_reply(&parsed, params))
}

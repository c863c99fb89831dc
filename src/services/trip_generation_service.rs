use crate::config::AppConfig;
use crate::models::trip::{ActivityCategory, TravelGroup, TripBudget};
use crate::services::gemini_service;

/// Inputs shared by both synthesizers. `days` is the inclusive span of the
/// requested date range and is always at least 1.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub destination: String,
    pub country: String,
    pub days: i64,
    pub budget: TripBudget,
    pub travel_group: TravelGroup,
    pub preferences: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedActivity {
    pub title: String,
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub estimated_cost: f64,
    pub category: ActivityCategory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDay {
    pub title: String,
    pub description: String,
    pub activities: Vec<GeneratedActivity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTrip {
    pub description: String,
    pub total_estimate: f64,
    pub itinerary: Vec<GeneratedDay>,
}

/// Strategy selector: live generation when a Gemini key is configured,
/// offline otherwise. Never fails; the live path falls back to the offline
/// synthesizer on any internal error, so callers only ever see a trip.
pub async fn generate_trip(config: &AppConfig, params: &GenerationParams) -> GeneratedTrip {
    match &config.gemini_api_key {
        Some(key) => match gemini_service::generate_with_gemini(key, params).await {
            Ok(trip) => trip,
            Err(err) => {
                log::warn!(
                    "Gemini generation failed, falling back to offline generator: {}",
                    err
                );
                generate_fallback_trip(params)
            }
        },
        None => generate_fallback_trip(params),
    }
}

fn group_activities(group: TravelGroup) -> [&'static str; 4] {
    match group {
        TravelGroup::Solo => [
            "Museum visit",
            "Local café exploration",
            "Walking tour",
            "Street food tasting",
        ],
        TravelGroup::Couple => ["Romantic dinner", "Sunset viewing", "Spa day", "Wine tasting"],
        TravelGroup::Friends => [
            "Bar hopping",
            "Adventure sports",
            "Beach party",
            "Local nightlife",
        ],
        TravelGroup::Family => [
            "Theme park",
            "Zoo visit",
            "Family restaurant",
            "Educational tour",
        ],
    }
}

fn budget_label(budget: TripBudget) -> String {
    budget.as_str().to_lowercase().replace('_', " ")
}

/// Deterministic offline synthesizer. Pure: same parameters, same plan.
/// Every day gets exactly five activities following fixed per-slot rules;
/// the first day opens with arrival and the last day closes with departure.
pub fn generate_fallback_trip(params: &GenerationParams) -> GeneratedTrip {
    let GenerationParams {
        destination,
        country,
        days,
        budget,
        travel_group,
        ..
    } = params;
    let days = *days;

    let multiplier = budget.multiplier();
    let activities = group_activities(*travel_group);
    let districts = ["Downtown", "Old Town", "Cultural District", "Waterfront"];

    let mut itinerary = Vec::with_capacity(days as usize);

    for i in 0..days {
        let is_first = i == 0;
        let is_last = i == days - 1;
        let mut day_activities = Vec::with_capacity(5);

        // Morning
        day_activities.push(if is_first {
            let lodging = match budget {
                TripBudget::Premium => "luxury",
                TripBudget::Luxury => "upscale",
                TripBudget::MidRange => "comfortable",
            };
            GeneratedActivity {
                title: format!("Arrival at {}", destination),
                description: format!(
                    "Arrive at {}, {}. Check into your {} accommodation.",
                    destination, country, lodging
                ),
                start_time: "14:00".to_string(),
                end_time: "16:00".to_string(),
                location: format!("{} Airport", destination),
                estimated_cost: 50.0 * multiplier,
                category: ActivityCategory::Transport,
            }
        } else {
            GeneratedActivity {
                title: "Morning exploration".to_string(),
                description: format!(
                    "Start your day with a refreshing breakfast and explore {}.",
                    destination
                ),
                start_time: "08:00".to_string(),
                end_time: "10:00".to_string(),
                location: format!("{} City Center", destination),
                estimated_cost: 20.0 * multiplier,
                category: ActivityCategory::Food,
            }
        });

        // Mid-day
        let mid_day = activities[(i % 4) as usize];
        day_activities.push(GeneratedActivity {
            title: mid_day.to_string(),
            description: format!(
                "Enjoy {} in the heart of {}.",
                mid_day.to_lowercase(),
                destination
            ),
            start_time: "11:00".to_string(),
            end_time: "14:00".to_string(),
            location: format!("{} {}", destination, districts[(i % 4) as usize]),
            estimated_cost: 60.0 * multiplier,
            category: ActivityCategory::Sightseeing,
        });

        // Lunch
        let restaurant = match budget {
            TripBudget::Premium => "Michelin-starred",
            TripBudget::Luxury => "renowned",
            TripBudget::MidRange => "popular local",
        };
        day_activities.push(GeneratedActivity {
            title: format!("Lunch at {} restaurant", restaurant),
            description: format!(
                "Savor {} cuisine at a {} restaurant.",
                country,
                budget_label(*budget)
            ),
            start_time: "14:00".to_string(),
            end_time: "15:30".to_string(),
            location: format!("{} Restaurant District", destination),
            estimated_cost: 40.0 * multiplier,
            category: ActivityCategory::Food,
        });

        // Afternoon
        if is_last {
            day_activities.push(GeneratedActivity {
                title: "Shopping for souvenirs".to_string(),
                description: format!("Pick up memorable souvenirs from {}.", destination),
                start_time: "16:00".to_string(),
                end_time: "18:30".to_string(),
                location: format!("{} Shopping Street", destination),
                estimated_cost: 100.0 * multiplier,
                category: ActivityCategory::Shopping,
            });
        } else {
            let afternoon = activities[((i + 1) % 4) as usize];
            day_activities.push(GeneratedActivity {
                title: afternoon.to_string(),
                description: format!("Continue exploring with {}.", afternoon.to_lowercase()),
                start_time: "16:00".to_string(),
                end_time: "18:30".to_string(),
                location: format!("{} Tourist Area", destination),
                estimated_cost: 50.0 * multiplier,
                category: ActivityCategory::Activity,
            });
        }

        // Evening
        if is_last {
            day_activities.push(GeneratedActivity {
                title: format!("Departure from {}", destination),
                description: format!(
                    "Say goodbye to {} and head to the airport for your departure.",
                    destination
                ),
                start_time: "19:00".to_string(),
                end_time: "21:00".to_string(),
                location: format!("{} Airport", destination),
                estimated_cost: 50.0 * multiplier,
                category: ActivityCategory::Transport,
            });
        } else {
            let evening = if *travel_group == TravelGroup::Couple {
                ("romantic evening", "Romantic Quarter")
            } else {
                ("entertainment", "Entertainment District")
            };
            day_activities.push(GeneratedActivity {
                title: format!("Dinner and {}", evening.0),
                description: format!(
                    "End the day with a wonderful dinner and {}'s evening attractions.",
                    destination
                ),
                start_time: "19:00".to_string(),
                end_time: "22:00".to_string(),
                location: format!("{} {}", destination, evening.1),
                estimated_cost: 80.0 * multiplier,
                category: ActivityCategory::Food,
            });
        }

        let (headline, summary) = if is_first {
            ("Arrival & First Impressions".to_string(), "Begin your adventure")
        } else if is_last {
            (format!("Farewell {}", destination), "Final day of exploration")
        } else {
            (format!("Exploring {}", destination), "Continue your journey")
        };

        itinerary.push(GeneratedDay {
            title: format!("Day {}: {}", i + 1, headline),
            description: format!("{} in beautiful {}, {}.", summary, destination, country),
            activities: day_activities,
        });
    }

    let total_estimate = days as f64 * 150.0 * multiplier + 200.0 * multiplier;
    let group_label = match travel_group {
        TravelGroup::Solo => "solo travelers".to_string(),
        other => other.as_str().to_lowercase(),
    };

    GeneratedTrip {
        description: format!(
            "A {}-day {} trip to {}, {}, perfect for {}.",
            days,
            budget_label(*budget),
            destination,
            country,
            group_label
        ),
        total_estimate,
        itinerary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(days: i64, budget: TripBudget, group: TravelGroup) -> GenerationParams {
        GenerationParams {
            destination: "Rome".to_string(),
            country: "Italy".to_string(),
            days,
            budget,
            travel_group: group,
            preferences: None,
        }
    }

    #[test]
    fn produces_exactly_five_activities_per_day() {
        for days in 1..=6 {
            let trip =
                generate_fallback_trip(&params(days, TripBudget::MidRange, TravelGroup::Solo));
            assert_eq!(trip.itinerary.len(), days as usize);
            for day in &trip.itinerary {
                assert_eq!(day.activities.len(), 5);
            }
        }
    }

    #[test]
    fn first_day_starts_with_arrival_transport() {
        let trip = generate_fallback_trip(&params(3, TripBudget::MidRange, TravelGroup::Solo));
        let first = &trip.itinerary[0].activities[0];
        assert!(first.title.contains("Arrival"));
        assert_eq!(first.category, ActivityCategory::Transport);

        let second_day_morning = &trip.itinerary[1].activities[0];
        assert_eq!(second_day_morning.title, "Morning exploration");
        assert_eq!(second_day_morning.category, ActivityCategory::Food);
    }

    #[test]
    fn last_day_ends_with_departure_and_shopping() {
        let trip = generate_fallback_trip(&params(3, TripBudget::MidRange, TravelGroup::Friends));
        let last_day = trip.itinerary.last().unwrap();
        let departure = last_day.activities.last().unwrap();
        assert!(departure.title.contains("Departure"));
        assert_eq!(departure.category, ActivityCategory::Transport);

        let afternoon = &last_day.activities[3];
        assert_eq!(afternoon.category, ActivityCategory::Shopping);

        // Non-final days keep the dinner slot
        let dinner = trip.itinerary[0].activities.last().unwrap();
        assert_eq!(dinner.category, ActivityCategory::Food);
        assert!(dinner.title.starts_with("Dinner"));
    }

    #[test]
    fn lunch_slot_is_always_food() {
        let trip = generate_fallback_trip(&params(4, TripBudget::Luxury, TravelGroup::Family));
        for day in &trip.itinerary {
            assert_eq!(day.activities[2].category, ActivityCategory::Food);
            assert!(day.activities[2].title.starts_with("Lunch"));
        }
    }

    #[test]
    fn rome_three_day_mid_range_totals_650() {
        let trip = generate_fallback_trip(&params(3, TripBudget::MidRange, TravelGroup::Solo));
        assert_eq!(trip.total_estimate, 650.0);
    }

    #[test]
    fn budget_tiers_are_monotonic() {
        let mid = generate_fallback_trip(&params(3, TripBudget::MidRange, TravelGroup::Solo));
        let lux = generate_fallback_trip(&params(3, TripBudget::Luxury, TravelGroup::Solo));
        let premium = generate_fallback_trip(&params(3, TripBudget::Premium, TravelGroup::Solo));
        assert!(premium.total_estimate > lux.total_estimate);
        assert!(lux.total_estimate > mid.total_estimate);
    }

    #[test]
    fn group_rotation_cycles_by_day() {
        let trip = generate_fallback_trip(&params(5, TripBudget::MidRange, TravelGroup::Couple));
        let rotation = ["Romantic dinner", "Sunset viewing", "Spa day", "Wine tasting"];
        for (i, day) in trip.itinerary.iter().enumerate() {
            assert_eq!(day.activities[1].title, rotation[i % 4]);
            assert_eq!(day.activities[1].category, ActivityCategory::Sightseeing);
        }
    }

    #[test]
    fn single_day_trip_is_both_arrival_and_departure() {
        let trip = generate_fallback_trip(&params(1, TripBudget::MidRange, TravelGroup::Solo));
        let day = &trip.itinerary[0];
        assert!(day.title.contains("Arrival & First Impressions"));
        assert_eq!(day.activities[0].category, ActivityCategory::Transport);
        assert_eq!(day.activities[3].category, ActivityCategory::Shopping);
        assert_eq!(day.activities[4].category, ActivityCategory::Transport);
        assert_eq!(trip.total_estimate, 150.0 + 200.0);
    }

    #[test]
    fn determinism() {
        let p = params(3, TripBudget::Premium, TravelGroup::Family);
        assert_eq!(generate_fallback_trip(&p), generate_fallback_trip(&p));
    }
}

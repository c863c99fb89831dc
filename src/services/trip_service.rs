use bson::oid::ObjectId;
use chrono::{DateTime as ChronoDateTime, Duration, Utc};
use mongodb::{bson::doc, Client, Collection};

use crate::db::mongo::{DB_NAME, DESTINATIONS, TRIPS};
use crate::models::destination::SavedDestination;
use crate::models::trip::{Activity, ItineraryDay, Trip, TripStatus};
use crate::schemas::GenerateTripInput;
use crate::services::trip_generation_service::GeneratedTrip;

pub fn trips_collection(client: &Client) -> Collection<Trip> {
    client.database(DB_NAME).collection(TRIPS)
}

pub fn destinations_collection(client: &Client) -> Collection<SavedDestination> {
    client.database(DB_NAME).collection(DESTINATIONS)
}

/// The one authorization primitive for trips: fetch only if owned.
/// Handlers translate `None` into 404, so "not yours" and "does not exist"
/// are indistinguishable to the caller.
pub async fn find_owned_trip(
    client: &Client,
    user_id: ObjectId,
    trip_id: ObjectId,
) -> Result<Option<Trip>, mongodb::error::Error> {
    trips_collection(client)
        .find_one(doc! { "_id": trip_id, "userId": user_id })
        .await
}

/// Activities are addressed by their own id but live inside a trip; the
/// owning trip is resolved (with the ownership check folded into the
/// filter) in a single query.
pub async fn find_trip_with_activity(
    client: &Client,
    user_id: ObjectId,
    activity_id: ObjectId,
) -> Result<Option<Trip>, mongodb::error::Error> {
    trips_collection(client)
        .find_one(doc! {
            "userId": user_id,
            "itineraryDays.activities._id": activity_id,
        })
        .await
}

pub async fn find_owned_destination(
    client: &Client,
    user_id: ObjectId,
    destination_id: ObjectId,
) -> Result<Option<SavedDestination>, mongodb::error::Error> {
    destinations_collection(client)
        .find_one(doc! { "_id": destination_id, "userId": user_id })
        .await
}

/// Persistence composer for the generation pipeline: assembles the trip,
/// its days (dated from the start date by 0-indexed offset), and each
/// day's activities (0-based order), then stores the whole tree with a
/// single insert. One document, so the write is atomic; a failure leaves
/// nothing behind.
pub async fn create_generated_trip(
    client: &Client,
    user_id: ObjectId,
    input: &GenerateTripInput,
    days: i64,
    generated: GeneratedTrip,
    images: Vec<String>,
) -> Result<Trip, mongodb::error::Error> {
    let itinerary_days = compose_days(input.start_date, generated.itinerary);
    let now = bson::DateTime::now();

    let mut trip = Trip {
        id: None,
        user_id,
        title: format!("{}-Day {} Adventure", days, input.destination),
        description: Some(generated.description),
        destination: input.destination.clone(),
        country: input.country.clone(),
        start_date: bson::DateTime::from_millis(input.start_date.timestamp_millis()),
        end_date: bson::DateTime::from_millis(input.end_date.timestamp_millis()),
        budget: input.budget,
        travel_group: input.travel_group,
        status: TripStatus::Upcoming,
        total_estimate: Some(generated.total_estimate),
        cover_image: images.first().cloned(),
        images,
        itinerary_days,
        created_at: Some(now),
        updated_at: Some(now),
    };

    let result = trips_collection(client).insert_one(&trip).await?;
    trip.id = result.inserted_id.as_object_id();
    Ok(trip)
}

fn compose_days(
    start_date: ChronoDateTime<Utc>,
    generated_days: Vec<crate::services::trip_generation_service::GeneratedDay>,
) -> Vec<ItineraryDay> {
    generated_days
        .into_iter()
        .enumerate()
        .map(|(index, day)| {
            let date = start_date + Duration::days(index as i64);
            let activities = day
                .activities
                .into_iter()
                .enumerate()
                .map(|(order, activity)| Activity {
                    id: ObjectId::new(),
                    title: activity.title,
                    description: Some(activity.description),
                    start_time: Some(activity.start_time),
                    end_time: Some(activity.end_time),
                    location: Some(activity.location),
                    estimated_cost: Some(activity.estimated_cost),
                    category: activity.category,
                    order: order as i32,
                })
                .collect();

            ItineraryDay {
                id: ObjectId::new(),
                day_number: index as i32 + 1,
                date: bson::DateTime::from_millis(date.timestamp_millis()),
                title: day.title,
                description: Some(day.description),
                activities,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::ActivityCategory;
    use crate::services::trip_generation_service::{GeneratedActivity, GeneratedDay};
    use chrono::TimeZone;

    fn generated_day(n: usize) -> GeneratedDay {
        GeneratedDay {
            title: format!("Day {}", n),
            description: "desc".to_string(),
            activities: (0..3)
                .map(|i| GeneratedActivity {
                    title: format!("activity {}", i),
                    description: String::new(),
                    start_time: "09:00".to_string(),
                    end_time: "10:00".to_string(),
                    location: "Rome".to_string(),
                    estimated_cost: 10.0,
                    category: ActivityCategory::Activity,
                })
                .collect(),
        }
    }

    #[test]
    fn days_are_numbered_and_dated_from_start() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let days = compose_days(start, vec![generated_day(1), generated_day(2)]);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].day_number, 1);
        assert_eq!(days[1].day_number, 2);
        assert_eq!(days[0].date.timestamp_millis(), start.timestamp_millis());
        assert_eq!(
            days[1].date.timestamp_millis(),
            (start + Duration::days(1)).timestamp_millis()
        );
    }

    #[test]
    fn activity_order_is_dense_and_zero_based() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let days = compose_days(start, vec![generated_day(1)]);
        let orders: Vec<i32> = days[0].activities.iter().map(|a| a.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }
}

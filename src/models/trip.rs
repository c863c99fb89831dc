use bson::DateTime;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripBudget {
    MidRange,
    Luxury,
    Premium,
}

impl TripBudget {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MID_RANGE" => Some(Self::MidRange),
            "LUXURY" => Some(Self::Luxury),
            "PREMIUM" => Some(Self::Premium),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MidRange => "MID_RANGE",
            Self::Luxury => "LUXURY",
            Self::Premium => "PREMIUM",
        }
    }

    /// Cost scaling applied to every per-slot base cost and to the trip
    /// total in the offline generator.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::MidRange => 1.0,
            Self::Luxury => 2.5,
            Self::Premium => 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelGroup {
    Solo,
    Couple,
    Friends,
    Family,
}

impl TravelGroup {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SOLO" => Some(Self::Solo),
            "COUPLE" => Some(Self::Couple),
            "FRIENDS" => Some(Self::Friends),
            "FAMILY" => Some(Self::Family),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solo => "SOLO",
            Self::Couple => "COUPLE",
            Self::Friends => "FRIENDS",
            Self::Family => "FAMILY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UPCOMING" => Some(Self::Upcoming),
            "ONGOING" => Some(Self::Ongoing),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "UPCOMING",
            Self::Ongoing => "ONGOING",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityCategory {
    Transport,
    Accommodation,
    Food,
    Sightseeing,
    Activity,
    Shopping,
    Other,
}

impl ActivityCategory {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "TRANSPORT" => Some(Self::Transport),
            "ACCOMMODATION" => Some(Self::Accommodation),
            "FOOD" => Some(Self::Food),
            "SIGHTSEEING" => Some(Self::Sightseeing),
            "ACTIVITY" => Some(Self::Activity),
            "SHOPPING" => Some(Self::Shopping),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "TRANSPORT",
            Self::Accommodation => "ACCOMMODATION",
            Self::Food => "FOOD",
            Self::Sightseeing => "SIGHTSEEING",
            Self::Activity => "ACTIVITY",
            Self::Shopping => "SHOPPING",
            Self::Other => "OTHER",
        }
    }
}

/// A single scheduled item inside an itinerary day. `order` is 0-based and
/// defines the display sequence within the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    pub category: ActivityCategory,
    pub order: i32,
}

/// One day of a trip. `day_number` is 1-based and sequential; `date` is the
/// trip start date plus the 0-indexed day offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDay {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub day_number: i32,
    pub date: DateTime,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// A trip document. Days and their activities are embedded, so creating a
/// generated trip is one insert and deleting a trip removes the whole tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub destination: String,
    pub country: String,
    pub start_date: DateTime,
    pub end_date: DateTime,
    pub budget: TripBudget,
    pub travel_group: TravelGroup,
    pub status: TripStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub itinerary_days: Vec<ItineraryDay>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

impl Trip {
    /// Responses guarantee days sorted by day number and activities sorted
    /// by order, independent of stored array order.
    pub fn sort_itinerary(&mut self) {
        self.itinerary_days.sort_by_key(|d| d.day_number);
        for day in &mut self.itinerary_days {
            day.activities.sort_by_key(|a| a.order);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_multipliers() {
        assert_eq!(TripBudget::MidRange.multiplier(), 1.0);
        assert_eq!(TripBudget::Luxury.multiplier(), 2.5);
        assert_eq!(TripBudget::Premium.multiplier(), 4.0);
    }

    #[test]
    fn enum_parse_round_trips() {
        for s in ["MID_RANGE", "LUXURY", "PREMIUM"] {
            assert_eq!(TripBudget::parse(s).unwrap().as_str(), s);
        }
        for s in ["SOLO", "COUPLE", "FRIENDS", "FAMILY"] {
            assert_eq!(TravelGroup::parse(s).unwrap().as_str(), s);
        }
        for s in ["UPCOMING", "ONGOING", "COMPLETED", "CANCELLED"] {
            assert_eq!(TripStatus::parse(s).unwrap().as_str(), s);
        }
        for s in [
            "TRANSPORT",
            "ACCOMMODATION",
            "FOOD",
            "SIGHTSEEING",
            "ACTIVITY",
            "SHOPPING",
            "OTHER",
        ] {
            assert_eq!(ActivityCategory::parse(s).unwrap().as_str(), s);
        }
        assert_eq!(TripBudget::parse("BUDGET"), None);
        assert_eq!(ActivityCategory::parse("food"), None);
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let v = serde_json::to_value(TripBudget::MidRange).unwrap();
        assert_eq!(v, serde_json::json!("MID_RANGE"));
        let parsed: ActivityCategory = serde_json::from_value(serde_json::json!("FOOD")).unwrap();
        assert_eq!(parsed, ActivityCategory::Food);
    }

    #[test]
    fn sort_itinerary_orders_days_and_activities() {
        let activity = |order: i32| Activity {
            id: ObjectId::new(),
            title: format!("a{}", order),
            description: None,
            start_time: None,
            end_time: None,
            location: None,
            estimated_cost: None,
            category: ActivityCategory::Other,
            order,
        };
        let day = |n: i32, orders: &[i32]| ItineraryDay {
            id: ObjectId::new(),
            day_number: n,
            date: DateTime::now(),
            title: format!("Day {}", n),
            description: None,
            activities: orders.iter().copied().map(activity).collect(),
        };

        let mut trip = Trip {
            id: None,
            user_id: ObjectId::new(),
            title: "t".into(),
            description: None,
            destination: "Rome".into(),
            country: "Italy".into(),
            start_date: DateTime::now(),
            end_date: DateTime::now(),
            budget: TripBudget::MidRange,
            travel_group: TravelGroup::Solo,
            status: TripStatus::Upcoming,
            total_estimate: None,
            cover_image: None,
            images: vec![],
            itinerary_days: vec![day(2, &[1, 0]), day(1, &[2, 0, 1])],
            created_at: None,
            updated_at: None,
        };

        trip.sort_itinerary();
        let numbers: Vec<i32> = trip.itinerary_days.iter().map(|d| d.day_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        let orders: Vec<i32> = trip.itinerary_days[0]
            .activities
            .iter()
            .map(|a| a.order)
            .collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }
}

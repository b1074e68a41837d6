use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::activity::StopActivity;

/// One city visit inside a trip. Stops are kept sorted by `order`,
/// starting at 1 with no gaps; insertion order is the itinerary order.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Stop {
    pub id: ObjectId,
    pub city_id: ObjectId,
    pub city_name: String,
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    pub order: u32,
    #[serde(default)]
    pub activities: Vec<StopActivity>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AccommodationItem {
    pub id: ObjectId,
    pub name: String,
    pub cost: f64,
    /// Night the charge lands on in the daily series. A missing date
    /// still counts toward the trip total.
    pub night_of: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Trip {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: f64,
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub accommodations: Vec<AccommodationItem>,
    /// Bumped on every write. Writers filter on the revision they
    /// loaded, so a concurrent edit cannot be silently overwritten.
    #[serde(default)]
    pub revision: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Trip {
    /// Inclusive day count, so a same-day trip is 1 day.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TripInput {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub budget: f64,
}

/// Stop with omitted dates gets a proposal from the route layer:
/// arrival = previous stop's departure (or trip start), departure =
/// arrival + 2 days. Ids arrive as hex strings and are parsed at the
/// boundary.
#[derive(Debug, Deserialize, Serialize)]
pub struct StopInput {
    pub city_id: String,
    pub arrival_date: Option<NaiveDate>,
    pub departure_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ActivityInput {
    pub activity_id: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AccommodationInput {
    pub name: String,
    pub cost: f64,
    pub night_of: Option<NaiveDate>,
}

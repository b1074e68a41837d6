use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Flight fare tier. Each class has its own fare and its own seat pool.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClassType {
    Economy,
    Business,
    First,
}

impl ClassType {
    /// Field name of the class inside `price` / `available_seats`
    /// subdocuments. Must stay in sync with the serde renames above.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassType::Economy => "economy",
            ClassType::Business => "business",
            ClassType::First => "first",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub struct ClassPrices {
    pub economy: f64,
    pub business: f64,
    pub first: f64,
}

impl ClassPrices {
    pub fn for_class(&self, class: &ClassType) -> f64 {
        match class {
            ClassType::Economy => self.economy,
            ClassType::Business => self.business,
            ClassType::First => self.first,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub struct SeatInventory {
    pub economy: i32,
    pub business: i32,
    pub first: i32,
}

impl SeatInventory {
    pub fn for_class(&self, class: &ClassType) -> i32 {
        match class {
            ClassType::Economy => self.economy,
            ClassType::Business => self.business,
            ClassType::First => self.first,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Flight {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub airline: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_datetime: DateTime<Utc>,
    pub arrival_datetime: DateTime<Utc>,
    pub price: ClassPrices,
    pub available_seats: SeatInventory,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

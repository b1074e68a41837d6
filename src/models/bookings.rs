use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::flight::ClassType;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlightBookingStatus {
    Upcoming,
    #[serde(rename = "check-in")]
    CheckIn,
    Completed,
    Cancelled,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CarBookingStatus {
    Upcoming,
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

/// Rental coverage level, priced per rental day.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsuranceTier {
    None,
    Basic,
    Premium,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TravelerType {
    Adult,
    Child,
    Infant,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default)]
pub struct TravelerCounts {
    #[serde(default)]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

impl TravelerCounts {
    /// Everyone on the booking, lap infants included. Seat holds and
    /// per-traveler add-ons both use this count. The counts come
    /// straight from the request body, so the sums saturate instead of
    /// wrapping; absurd totals are left for validation to reject.
    pub fn total(&self) -> u32 {
        self.adults
            .saturating_add(self.children)
            .saturating_add(self.infants)
    }

    /// Travelers who pay a seat fare.
    pub fn seated(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Passenger {
    pub first_name: String,
    pub last_name: String,
    pub traveler_type: TravelerType,
    pub date_of_birth: Option<NaiveDate>,
}

/// Passenger as submitted. The traveler type is assigned positionally
/// when the booking is built: adults first, then children, then infants.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PassengerInput {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default)]
pub struct FlightAddons {
    #[serde(default)]
    pub travel_insurance: bool,
    #[serde(default)]
    pub extra_baggage: bool,
    #[serde(default)]
    pub seat_selection: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default)]
pub struct CarAddons {
    #[serde(default)]
    pub gps: bool,
    #[serde(default)]
    pub child_seat: bool,
    #[serde(default)]
    pub additional_insurance: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FlightBooking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub trip_id: Option<ObjectId>,
    pub flight_id: ObjectId,
    pub booking_reference: String,
    // Display fields copied from the flight at booking time so the
    // booking stays readable if the catalog row changes later.
    pub airline: String,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub departure_datetime: DateTime<Utc>,
    pub class_type: ClassType,
    pub travelers: TravelerCounts,
    pub passengers: Vec<Passenger>,
    pub addons: FlightAddons,
    pub total_price: f64,
    pub status: FlightBookingStatus,
    pub payment_status: PaymentStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CarRentalBooking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub trip_id: Option<ObjectId>,
    pub stop_id: Option<ObjectId>,
    pub car_id: ObjectId,
    pub booking_reference: String,
    pub car_name: String,
    pub daily_rate: f64,
    pub pickup_location: String,
    pub pickup_datetime: DateTime<Utc>,
    pub return_datetime: DateTime<Utc>,
    pub rental_days: i64,
    pub driver_age: u32,
    pub additional_drivers: u32,
    pub insurance: InsuranceTier,
    pub addons: CarAddons,
    pub total_price: f64,
    pub status: CarBookingStatus,
    pub payment_status: PaymentStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// Input ids arrive as hex strings and are parsed at the boundary.
#[derive(Debug, Deserialize, Serialize)]
pub struct FlightBookingInput {
    pub flight_id: String,
    pub trip_id: Option<String>,
    pub class_type: ClassType,
    pub travelers: TravelerCounts,
    pub passengers: Vec<PassengerInput>,
    #[serde(default)]
    pub addons: FlightAddons,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CarRentalInput {
    pub car_id: String,
    pub trip_id: Option<String>,
    pub stop_id: Option<String>,
    pub pickup_location: String,
    pub pickup_datetime: DateTime<Utc>,
    pub return_datetime: DateTime<Utc>,
    pub driver_age: u32,
    #[serde(default)]
    pub additional_drivers: u32,
    #[serde(default = "InsuranceTier::default_tier")]
    pub insurance: InsuranceTier,
    #[serde(default)]
    pub addons: CarAddons,
}

impl InsuranceTier {
    fn default_tier() -> Self {
        InsuranceTier::None
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::{Client, Collection};
use tokio::sync::Mutex as AsyncMutex;

use crate::db::mongo::{BOOKINGS_DB, CATALOG_DB};
use crate::models::bookings::CarRentalBooking;
use crate::models::flight::{ClassType, Flight};
use crate::services::pricing_service::BookingError;

#[derive(Debug, Clone, Copy)]
pub struct LedgerSettings {
    /// Whether overlapping rental windows of the same car are rejected.
    pub prevent_double_booking: bool,
}

impl LedgerSettings {
    pub fn from_env() -> Self {
        let prevent_double_booking = std::env::var("PREVENT_DOUBLE_BOOKING")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self {
            prevent_double_booking,
        }
    }
}

/// Hands out one async mutex per car so the overlap check and the
/// insert that follows it run as a single critical section. Must be
/// created once, outside the server factory closure, or each worker
/// would get its own registry.
pub struct CarLockRegistry {
    locks: StdMutex<HashMap<ObjectId, Arc<AsyncMutex<()>>>>,
}

impl CarLockRegistry {
    pub fn new() -> Self {
        Self {
            locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn lock_for(&self, car_id: &ObjectId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(*car_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

pub struct AvailabilityService;

impl AvailabilityService {
    fn seat_field(class: &ClassType) -> String {
        format!("available_seats.{}", class.as_str())
    }

    /// Filter that only matches while the class still has `count` seats.
    /// Paired with the `$inc` below it forms a compare-and-swap: two
    /// concurrent requests for the last seat cannot both match.
    pub fn seat_reserve_filter(flight_id: &ObjectId, class: &ClassType, count: u32) -> Document {
        let mut filter = doc! { "_id": *flight_id };
        filter.insert(Self::seat_field(class), doc! { "$gte": count as i32 });
        filter
    }

    pub fn seat_reserve_update(class: &ClassType, count: u32) -> Document {
        let mut fields = Document::new();
        fields.insert(Self::seat_field(class), -(count as i32));
        doc! { "$inc": fields }
    }

    pub fn seat_release_update(class: &ClassType, count: u32) -> Document {
        let mut fields = Document::new();
        fields.insert(Self::seat_field(class), count as i32);
        doc! { "$inc": fields }
    }

    /// Snapshot capacity check against an already-loaded flight. The
    /// atomic reserve is the authority; this one only fails fast and
    /// reports what the snapshot had left.
    pub fn check_capacity(
        flight: &Flight,
        class: &ClassType,
        count: u32,
    ) -> Result<(), BookingError> {
        let available = flight.available_seats.for_class(class);
        if available < count as i32 {
            return Err(BookingError::InsufficientCapacity {
                requested: count,
                available,
            });
        }
        Ok(())
    }

    /// Half-open [pickup, return) windows; sharing an endpoint is fine.
    pub fn windows_overlap(
        a_start: DateTime<Utc>,
        a_end: DateTime<Utc>,
        b_start: DateTime<Utc>,
        b_end: DateTime<Utc>,
    ) -> bool {
        a_start < b_end && a_end > b_start
    }

    /// Atomically takes `count` seats from a flight class. A conflict
    /// loses the race and reports the capacity that is actually left.
    pub async fn reserve_seats(
        client: &Client,
        flight_id: &ObjectId,
        class: &ClassType,
        count: u32,
    ) -> Result<(), BookingError> {
        let flights: Collection<Flight> = client.database(CATALOG_DB).collection("Flights");

        let result = flights
            .update_one(
                Self::seat_reserve_filter(flight_id, class, count),
                Self::seat_reserve_update(class, count),
            )
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        if result.matched_count == 0 {
            // Either the flight is gone or the class ran out.
            let flight = flights
                .find_one(doc! { "_id": *flight_id })
                .await
                .map_err(|e| BookingError::Database(e.to_string()))?;

            return match flight {
                Some(flight) => Err(BookingError::InsufficientCapacity {
                    requested: count,
                    available: flight.available_seats.for_class(class),
                }),
                None => Err(BookingError::FlightNotFound),
            };
        }

        Ok(())
    }

    /// Returns seats to the pool after a cancellation.
    pub async fn release_seats(
        client: &Client,
        flight_id: &ObjectId,
        class: &ClassType,
        count: u32,
    ) -> Result<(), BookingError> {
        let flights: Collection<Flight> = client.database(CATALOG_DB).collection("Flights");

        let result = flights
            .update_one(
                doc! { "_id": *flight_id },
                Self::seat_release_update(class, count),
            )
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        if result.matched_count == 0 {
            eprintln!(
                "Seat release found no flight {}; inventory not restored",
                flight_id
            );
        }

        Ok(())
    }

    /// Checks the car's live rentals for a window collision. Call with
    /// the car's lock held so the answer stays true until the insert.
    pub async fn car_window_conflicts(
        client: &Client,
        car_id: &ObjectId,
        pickup: DateTime<Utc>,
        return_datetime: DateTime<Utc>,
    ) -> Result<bool, BookingError> {
        let rentals: Collection<CarRentalBooking> =
            client.database(BOOKINGS_DB).collection("CarRentalBookings");

        let existing = rentals
            .find(doc! { "car_id": *car_id, "status": { "$ne": "cancelled" } })
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?
            .try_collect::<Vec<CarRentalBooking>>()
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        Ok(existing.iter().any(|rental| {
            Self::windows_overlap(
                rental.pickup_datetime,
                rental.return_datetime,
                pickup,
                return_datetime,
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::flight::{ClassPrices, SeatInventory};
    use chrono::TimeZone;
    use serial_test::serial;

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, d, h, 0, 0).unwrap()
    }

    fn test_flight(economy: i32, business: i32, first: i32) -> Flight {
        Flight {
            id: Some(ObjectId::new()),
            airline: "Aerotest".to_string(),
            flight_number: "AT100".to_string(),
            origin: "CDG".to_string(),
            destination: "FCO".to_string(),
            departure_datetime: utc(1, 9),
            arrival_datetime: utc(1, 11),
            price: ClassPrices {
                economy: 120.0,
                business: 320.0,
                first: 640.0,
            },
            available_seats: SeatInventory {
                economy,
                business,
                first,
            },
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_check_capacity_reports_snapshot_remainder() {
        let flight = test_flight(2, 10, 4);

        let err =
            AvailabilityService::check_capacity(&flight, &ClassType::Economy, 3).unwrap_err();
        match err {
            BookingError::InsufficientCapacity {
                requested,
                available,
            } => {
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected a capacity error, got {:?}", other),
        }

        // The pools are per class: economy being short says nothing
        // about business.
        assert!(AvailabilityService::check_capacity(&flight, &ClassType::Economy, 2).is_ok());
        assert!(AvailabilityService::check_capacity(&flight, &ClassType::Business, 3).is_ok());
    }

    #[test]
    fn test_check_capacity_on_empty_class() {
        let flight = test_flight(0, 0, 0);
        let err =
            AvailabilityService::check_capacity(&flight, &ClassType::First, 1).unwrap_err();
        assert!(matches!(
            err,
            BookingError::InsufficientCapacity {
                requested: 1,
                available: 0
            }
        ));
    }

    #[test]
    fn test_windows_overlap() {
        // Plain collision.
        assert!(AvailabilityService::windows_overlap(
            utc(1, 10),
            utc(4, 10),
            utc(3, 10),
            utc(6, 10)
        ));
        // Containment.
        assert!(AvailabilityService::windows_overlap(
            utc(1, 10),
            utc(10, 10),
            utc(3, 10),
            utc(4, 10)
        ));
        // Disjoint.
        assert!(!AvailabilityService::windows_overlap(
            utc(1, 10),
            utc(2, 10),
            utc(5, 10),
            utc(6, 10)
        ));
        // Back-to-back: return at 10:00, next pickup at 10:00 is fine.
        assert!(!AvailabilityService::windows_overlap(
            utc(1, 10),
            utc(3, 10),
            utc(3, 10),
            utc(5, 10)
        ));
    }

    #[test]
    fn test_seat_reserve_filter_shape() {
        let flight_id = ObjectId::new();
        let filter =
            AvailabilityService::seat_reserve_filter(&flight_id, &ClassType::Economy, 2);

        assert_eq!(filter.get_object_id("_id").unwrap(), flight_id);
        let capacity = filter
            .get_document("available_seats.economy")
            .unwrap();
        assert_eq!(capacity.get_i32("$gte").unwrap(), 2);
    }

    #[test]
    fn test_seat_updates_are_symmetric() {
        let reserve = AvailabilityService::seat_reserve_update(&ClassType::Business, 3);
        let release = AvailabilityService::seat_release_update(&ClassType::Business, 3);

        let reserved = reserve
            .get_document("$inc")
            .unwrap()
            .get_i32("available_seats.business")
            .unwrap();
        let released = release
            .get_document("$inc")
            .unwrap()
            .get_i32("available_seats.business")
            .unwrap();

        assert_eq!(reserved, -3);
        assert_eq!(released, 3);
    }

    #[actix_rt::test]
    async fn test_car_lock_registry_serializes_per_car() {
        let registry = CarLockRegistry::new();
        let car = ObjectId::new();
        let other = ObjectId::new();

        let lock = registry.lock_for(&car);
        let same = registry.lock_for(&car);
        assert!(Arc::ptr_eq(&lock, &same));

        let guard = lock.lock().await;
        // Same car is blocked while the guard lives.
        assert!(same.try_lock().is_err());
        // A different car is not.
        assert!(registry.lock_for(&other).try_lock().is_ok());
        drop(guard);
        assert!(same.try_lock().is_ok());
    }

    #[test]
    #[serial]
    fn test_ledger_settings_from_env() {
        std::env::remove_var("PREVENT_DOUBLE_BOOKING");
        assert!(LedgerSettings::from_env().prevent_double_booking);

        std::env::set_var("PREVENT_DOUBLE_BOOKING", "false");
        assert!(!LedgerSettings::from_env().prevent_double_booking);

        std::env::set_var("PREVENT_DOUBLE_BOOKING", "true");
        assert!(LedgerSettings::from_env().prevent_double_booking);

        std::env::remove_var("PREVENT_DOUBLE_BOOKING");
    }
}

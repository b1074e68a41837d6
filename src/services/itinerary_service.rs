use chrono::{Duration, NaiveDate};
use mongodb::bson::oid::ObjectId;

use crate::models::activity::StopActivity;
use crate::models::trip::{Stop, Trip};

#[derive(Debug)]
pub enum ItineraryError {
    TripNotFound,
    StopNotFound,
    ActivityNotFound,
    CityNotFound,
    ConcurrentEdit,
    InvalidDateRange(String),
    Validation(String),
    Database(String),
}

impl std::fmt::Display for ItineraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItineraryError::TripNotFound => write!(f, "Trip not found"),
            ItineraryError::StopNotFound => write!(f, "Stop not found"),
            ItineraryError::ActivityNotFound => write!(f, "Activity not found"),
            ItineraryError::CityNotFound => write!(f, "City not found"),
            ItineraryError::ConcurrentEdit => {
                write!(f, "Trip was modified by another request")
            }
            ItineraryError::InvalidDateRange(err) => write!(f, "Invalid date range: {}", err),
            ItineraryError::Validation(err) => write!(f, "Validation error: {}", err),
            ItineraryError::Database(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for ItineraryError {}

/// Pure mutations over an in-memory trip. The caller persists the whole
/// document afterwards, so a single replace is atomic in the store.
pub struct ItineraryService;

impl ItineraryService {
    /// Trip-level invariants, checked on create and update.
    pub fn validate_trip(
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        budget: f64,
    ) -> Result<(), ItineraryError> {
        if name.trim().is_empty() {
            return Err(ItineraryError::Validation(
                "trip name must not be empty".to_string(),
            ));
        }
        if budget < 0.0 {
            return Err(ItineraryError::Validation(
                "budget must not be negative".to_string(),
            ));
        }
        if start_date > end_date {
            return Err(ItineraryError::InvalidDateRange(format!(
                "start date {} is after end date {}",
                start_date, end_date
            )));
        }
        Ok(())
    }

    /// Proposed window for a stop added without dates: pick up where the
    /// last stop leaves off (or the trip start) and stay two nights.
    pub fn default_stop_window(trip: &Trip) -> (NaiveDate, NaiveDate) {
        let arrival = trip
            .stops
            .last()
            .map(|stop| stop.departure_date)
            .unwrap_or(trip.start_date);
        (arrival, arrival + Duration::days(2))
    }

    /// Appends a stop at the end of the sequence. Order indices stay
    /// contiguous from 1; nothing is mutated when validation fails.
    pub fn add_stop(
        trip: &mut Trip,
        city_id: ObjectId,
        city_name: &str,
        arrival_date: NaiveDate,
        departure_date: NaiveDate,
    ) -> Result<Stop, ItineraryError> {
        if arrival_date >= departure_date {
            return Err(ItineraryError::InvalidDateRange(format!(
                "arrival {} must be before departure {}",
                arrival_date, departure_date
            )));
        }

        let stop = Stop {
            id: ObjectId::new(),
            city_id,
            city_name: city_name.to_string(),
            arrival_date,
            departure_date,
            order: trip.stops.len() as u32 + 1,
            activities: Vec::new(),
        };
        trip.stops.push(stop.clone());
        Ok(stop)
    }

    /// Removes a stop and its activities, then renumbers the remaining
    /// stops contiguously from 1.
    pub fn remove_stop(trip: &mut Trip, stop_id: &ObjectId) -> Result<Stop, ItineraryError> {
        let idx = trip
            .stops
            .iter()
            .position(|stop| stop.id == *stop_id)
            .ok_or(ItineraryError::StopNotFound)?;

        let removed = trip.stops.remove(idx);
        for (i, stop) in trip.stops.iter_mut().enumerate() {
            stop.order = i as u32 + 1;
        }
        Ok(removed)
    }

    pub fn add_activity(
        trip: &mut Trip,
        stop_id: &ObjectId,
        activity: StopActivity,
    ) -> Result<StopActivity, ItineraryError> {
        let stop = trip
            .stops
            .iter_mut()
            .find(|stop| stop.id == *stop_id)
            .ok_or(ItineraryError::StopNotFound)?;

        stop.activities.push(activity.clone());
        Ok(activity)
    }

    pub fn remove_activity(
        trip: &mut Trip,
        stop_id: &ObjectId,
        activity_id: &ObjectId,
    ) -> Result<StopActivity, ItineraryError> {
        let stop = trip
            .stops
            .iter_mut()
            .find(|stop| stop.id == *stop_id)
            .ok_or(ItineraryError::StopNotFound)?;

        let idx = stop
            .activities
            .iter()
            .position(|activity| activity.id == *activity_id)
            .ok_or(ItineraryError::ActivityNotFound)?;

        Ok(stop.activities.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::ActivityCategory;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_trip() -> Trip {
        Trip {
            id: Some(ObjectId::new()),
            user_id: ObjectId::new(),
            name: "Western Europe".to_string(),
            start_date: date(2025, 6, 1),
            end_date: date(2025, 6, 14),
            budget: 5000.0,
            stops: Vec::new(),
            accommodations: Vec::new(),
            revision: 0,
            created_at: None,
            updated_at: None,
        }
    }

    fn test_activity(category: ActivityCategory, cost: f64) -> StopActivity {
        StopActivity {
            id: ObjectId::new(),
            activity_id: ObjectId::new(),
            name: "Activity".to_string(),
            category,
            cost,
            duration_hours: 2.0,
        }
    }

    #[test]
    fn test_add_stop_assigns_contiguous_orders() {
        let mut trip = test_trip();

        let first = ItineraryService::add_stop(
            &mut trip,
            ObjectId::new(),
            "Paris",
            date(2025, 6, 1),
            date(2025, 6, 4),
        )
        .unwrap();
        let second = ItineraryService::add_stop(
            &mut trip,
            ObjectId::new(),
            "Lyon",
            date(2025, 6, 4),
            date(2025, 6, 7),
        )
        .unwrap();

        assert_eq!(first.order, 1);
        assert_eq!(second.order, 2);
        assert_eq!(trip.stops.len(), 2);
    }

    #[test]
    fn test_add_stop_rejects_inverted_dates_without_mutation() {
        let mut trip = test_trip();

        let result = ItineraryService::add_stop(
            &mut trip,
            ObjectId::new(),
            "Paris",
            date(2025, 6, 5),
            date(2025, 6, 3),
        );

        assert!(matches!(result, Err(ItineraryError::InvalidDateRange(_))));
        assert!(trip.stops.is_empty());
    }

    #[test]
    fn test_add_stop_rejects_zero_length_window() {
        let mut trip = test_trip();

        let result = ItineraryService::add_stop(
            &mut trip,
            ObjectId::new(),
            "Paris",
            date(2025, 6, 5),
            date(2025, 6, 5),
        );

        assert!(matches!(result, Err(ItineraryError::InvalidDateRange(_))));
        assert!(trip.stops.is_empty());
    }

    #[test]
    fn test_remove_stop_renumbers_from_one() {
        let mut trip = test_trip();
        for (i, city) in ["Paris", "Lyon", "Nice"].iter().enumerate() {
            let day = (i as u32) * 3 + 1;
            ItineraryService::add_stop(
                &mut trip,
                ObjectId::new(),
                city,
                date(2025, 6, day),
                date(2025, 6, day + 3),
            )
            .unwrap();
        }

        let middle = trip.stops[1].id;
        let removed = ItineraryService::remove_stop(&mut trip, &middle).unwrap();

        assert_eq!(removed.city_name, "Lyon");
        assert_eq!(trip.stops.len(), 2);
        assert_eq!(trip.stops[0].order, 1);
        assert_eq!(trip.stops[1].order, 2);
        assert_eq!(trip.stops[1].city_name, "Nice");
    }

    #[test]
    fn test_remove_missing_stop() {
        let mut trip = test_trip();
        let result = ItineraryService::remove_stop(&mut trip, &ObjectId::new());
        assert!(matches!(result, Err(ItineraryError::StopNotFound)));
    }

    #[test]
    fn test_orders_stay_contiguous_across_mixed_edits() {
        let mut trip = test_trip();

        for day in [1, 4, 7, 10] {
            ItineraryService::add_stop(
                &mut trip,
                ObjectId::new(),
                "City",
                date(2025, 6, day),
                date(2025, 6, day + 2),
            )
            .unwrap();
        }
        let first = trip.stops[0].id;
        let third = trip.stops[2].id;
        ItineraryService::remove_stop(&mut trip, &first).unwrap();
        ItineraryService::remove_stop(&mut trip, &third).unwrap();
        ItineraryService::add_stop(
            &mut trip,
            ObjectId::new(),
            "City",
            date(2025, 6, 20),
            date(2025, 6, 22),
        )
        .unwrap();

        let orders: Vec<u32> = trip.stops.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_activity_add_and_remove() {
        let mut trip = test_trip();
        let stop = ItineraryService::add_stop(
            &mut trip,
            ObjectId::new(),
            "Paris",
            date(2025, 6, 1),
            date(2025, 6, 4),
        )
        .unwrap();

        let activity = test_activity(ActivityCategory::Sightseeing, 25.0);
        let activity_id = activity.id;
        ItineraryService::add_activity(&mut trip, &stop.id, activity).unwrap();
        assert_eq!(trip.stops[0].activities.len(), 1);

        let removed =
            ItineraryService::remove_activity(&mut trip, &stop.id, &activity_id).unwrap();
        assert_eq!(removed.id, activity_id);
        assert!(trip.stops[0].activities.is_empty());
    }

    #[test]
    fn test_activity_errors() {
        let mut trip = test_trip();
        let stop = ItineraryService::add_stop(
            &mut trip,
            ObjectId::new(),
            "Paris",
            date(2025, 6, 1),
            date(2025, 6, 4),
        )
        .unwrap();

        let on_missing_stop = ItineraryService::add_activity(
            &mut trip,
            &ObjectId::new(),
            test_activity(ActivityCategory::Food, 30.0),
        );
        assert!(matches!(on_missing_stop, Err(ItineraryError::StopNotFound)));

        let missing_activity =
            ItineraryService::remove_activity(&mut trip, &stop.id, &ObjectId::new());
        assert!(matches!(
            missing_activity,
            Err(ItineraryError::ActivityNotFound)
        ));
    }

    #[test]
    fn test_removing_stop_drops_its_activities() {
        let mut trip = test_trip();
        let stop = ItineraryService::add_stop(
            &mut trip,
            ObjectId::new(),
            "Paris",
            date(2025, 6, 1),
            date(2025, 6, 4),
        )
        .unwrap();
        ItineraryService::add_activity(
            &mut trip,
            &stop.id,
            test_activity(ActivityCategory::Culture, 18.0),
        )
        .unwrap();

        ItineraryService::remove_stop(&mut trip, &stop.id).unwrap();
        assert!(trip.stops.is_empty());
    }

    #[test]
    fn test_default_stop_window() {
        let mut trip = test_trip();

        let (arrival, departure) = ItineraryService::default_stop_window(&trip);
        assert_eq!(arrival, date(2025, 6, 1));
        assert_eq!(departure, date(2025, 6, 3));

        ItineraryService::add_stop(
            &mut trip,
            ObjectId::new(),
            "Paris",
            date(2025, 6, 1),
            date(2025, 6, 5),
        )
        .unwrap();

        let (arrival, departure) = ItineraryService::default_stop_window(&trip);
        assert_eq!(arrival, date(2025, 6, 5));
        assert_eq!(departure, date(2025, 6, 7));
    }

    #[test]
    fn test_validate_trip() {
        assert!(ItineraryService::validate_trip(
            "Summer",
            date(2025, 6, 1),
            date(2025, 6, 1),
            0.0
        )
        .is_ok());

        let inverted =
            ItineraryService::validate_trip("Summer", date(2025, 6, 2), date(2025, 6, 1), 100.0);
        assert!(matches!(inverted, Err(ItineraryError::InvalidDateRange(_))));

        let unnamed = ItineraryService::validate_trip("  ", date(2025, 6, 1), date(2025, 6, 2), 100.0);
        assert!(matches!(unnamed, Err(ItineraryError::Validation(_))));

        let negative =
            ItineraryService::validate_trip("Summer", date(2025, 6, 1), date(2025, 6, 2), -1.0);
        assert!(matches!(negative, Err(ItineraryError::Validation(_))));
    }
}

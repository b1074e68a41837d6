use chrono::{DateTime, Utc};

use crate::models::bookings::{
    CarAddons, FlightAddons, InsuranceTier, Passenger, PassengerInput, TravelerCounts,
    TravelerType,
};

/// Largest party one booking can carry.
pub const MAX_TRAVELERS_PER_BOOKING: u32 = 9;

#[derive(Debug)]
pub enum BookingError {
    FlightNotFound,
    CarNotFound,
    BookingNotFound,
    InsufficientCapacity { requested: u32, available: i32 },
    CarUnavailable,
    AlreadyCancelled,
    InvalidDateRange(String),
    Validation(String),
    Database(String),
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::FlightNotFound => write!(f, "Flight not found"),
            BookingError::CarNotFound => write!(f, "Car not found"),
            BookingError::BookingNotFound => write!(f, "Booking not found"),
            BookingError::InsufficientCapacity {
                requested,
                available,
            } => write!(
                f,
                "Insufficient capacity: requested {} seats, {} available",
                requested, available
            ),
            BookingError::CarUnavailable => write!(f, "Car is not available for this window"),
            BookingError::AlreadyCancelled => write!(f, "Booking is already cancelled"),
            BookingError::InvalidDateRange(err) => write!(f, "Invalid date range: {}", err),
            BookingError::Validation(err) => write!(f, "Validation error: {}", err),
            BookingError::Database(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for BookingError {}

pub struct PricingService;

impl PricingService {
    /// Flight base fare: seat fare × (adults + children). Infants ride
    /// on a lap and pay no fare.
    pub fn flight_base(fare: f64, travelers: &TravelerCounts) -> f64 {
        fare * travelers.seated() as f64
    }

    /// Flight add-ons, each charged per traveler including infants:
    /// travel insurance +50, extra baggage +30, seat selection +15.
    pub fn flight_addon_total(travelers: &TravelerCounts, addons: &FlightAddons) -> f64 {
        let headcount = travelers.total() as f64;
        let mut total = 0.0;
        if addons.travel_insurance {
            total += 50.0 * headcount;
        }
        if addons.extra_baggage {
            total += 30.0 * headcount;
        }
        if addons.seat_selection {
            total += 15.0 * headcount;
        }
        total
    }

    pub fn price_flight(fare: f64, travelers: &TravelerCounts, addons: &FlightAddons) -> f64 {
        Self::flight_base(fare, travelers) + Self::flight_addon_total(travelers, addons)
    }

    /// Rental length in whole days, partial days rounded up.
    pub fn rental_days(
        pickup: DateTime<Utc>,
        return_datetime: DateTime<Utc>,
    ) -> Result<i64, BookingError> {
        let seconds = (return_datetime - pickup).num_seconds();
        if seconds <= 0 {
            return Err(BookingError::InvalidDateRange(format!(
                "return {} must be after pickup {}",
                return_datetime, pickup
            )));
        }
        Ok((seconds + 86_399) / 86_400)
    }

    /// Car rental total. Base is dailyRate × days; insurance is per day
    /// (basic +15, premium +25); add-ons are per day (gps +5, child seat
    /// +8, additional insurance +12, +10 per additional driver); drivers
    /// under 25 pay +20/day. Nothing is pro-rated below a day.
    pub fn price_car_rental(
        daily_rate: f64,
        days: i64,
        driver_age: u32,
        additional_drivers: u32,
        insurance: InsuranceTier,
        addons: &CarAddons,
    ) -> f64 {
        let days = days as f64;
        let mut total = daily_rate * days;

        total += match insurance {
            InsuranceTier::None => 0.0,
            InsuranceTier::Basic => 15.0,
            InsuranceTier::Premium => 25.0,
        } * days;

        if addons.gps {
            total += 5.0 * days;
        }
        if addons.child_seat {
            total += 8.0 * days;
        }
        if addons.additional_insurance {
            total += 12.0 * days;
        }
        total += 10.0 * additional_drivers as f64 * days;

        if driver_age < 25 {
            total += 20.0 * days;
        }

        total
    }

    /// Pairs submitted passengers with traveler types by position:
    /// adults first, then children, then infants. The passenger list
    /// must cover every traveler and carry real names; the party size
    /// is capped at `MAX_TRAVELERS_PER_BOOKING`.
    pub fn assign_passengers(
        travelers: &TravelerCounts,
        passengers: &[PassengerInput],
    ) -> Result<Vec<Passenger>, BookingError> {
        if travelers.total() > MAX_TRAVELERS_PER_BOOKING {
            return Err(BookingError::Validation(format!(
                "at most {} travelers per booking",
                MAX_TRAVELERS_PER_BOOKING
            )));
        }
        if travelers.total() == 0 {
            return Err(BookingError::Validation(
                "at least one traveler is required".to_string(),
            ));
        }
        if passengers.len() as u32 != travelers.total() {
            return Err(BookingError::Validation(format!(
                "expected {} passenger records, got {}",
                travelers.total(),
                passengers.len()
            )));
        }

        let mut assigned = Vec::with_capacity(passengers.len());
        for (i, passenger) in passengers.iter().enumerate() {
            if passenger.first_name.trim().is_empty() || passenger.last_name.trim().is_empty() {
                return Err(BookingError::Validation(format!(
                    "passenger {} is missing a name",
                    i + 1
                )));
            }

            let traveler_type = if (i as u32) < travelers.adults {
                TravelerType::Adult
            } else if (i as u32) < travelers.adults + travelers.children {
                TravelerType::Child
            } else {
                TravelerType::Infant
            };

            assigned.push(Passenger {
                first_name: passenger.first_name.trim().to_string(),
                last_name: passenger.last_name.trim().to_string(),
                traveler_type,
                date_of_birth: passenger.date_of_birth,
            });
        }
        Ok(assigned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn travelers(adults: u32, children: u32, infants: u32) -> TravelerCounts {
        TravelerCounts {
            adults,
            children,
            infants,
        }
    }

    fn passenger(name: &str) -> PassengerInput {
        PassengerInput {
            first_name: name.to_string(),
            last_name: "Tester".to_string(),
            date_of_birth: None,
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_flight_price_two_adults_no_addons() {
        let total = PricingService::price_flight(750.0, &travelers(2, 0, 0), &FlightAddons::default());
        assert_eq!(total, 1500.0);
    }

    #[test]
    fn test_infants_pay_no_fare_but_count_for_addons() {
        let group = travelers(2, 0, 1);

        let bare = PricingService::price_flight(100.0, &group, &FlightAddons::default());
        assert_eq!(bare, 200.0);

        let insured = PricingService::price_flight(
            100.0,
            &group,
            &FlightAddons {
                travel_insurance: true,
                ..Default::default()
            },
        );
        assert_eq!(insured, 200.0 + 3.0 * 50.0);
    }

    #[test]
    fn test_flight_addons_stack_per_traveler() {
        let group = travelers(1, 0, 0);
        let all = FlightAddons {
            travel_insurance: true,
            extra_baggage: true,
            seat_selection: true,
        };
        assert_eq!(
            PricingService::price_flight(200.0, &group, &all),
            200.0 + 50.0 + 30.0 + 15.0
        );
    }

    #[test]
    fn test_flight_price_monotonic_in_addons() {
        let group = travelers(2, 1, 1);
        let fare = 320.0;
        let steps = [
            FlightAddons::default(),
            FlightAddons {
                travel_insurance: true,
                ..Default::default()
            },
            FlightAddons {
                travel_insurance: true,
                extra_baggage: true,
                ..Default::default()
            },
            FlightAddons {
                travel_insurance: true,
                extra_baggage: true,
                seat_selection: true,
            },
        ];

        let mut last = 0.0;
        for addons in &steps {
            let price = PricingService::price_flight(fare, &group, addons);
            assert!(price >= last);
            last = price;
        }
    }

    #[test]
    fn test_rental_days_rounds_up() {
        let pickup = utc(2025, 3, 1, 10);

        let exact = PricingService::rental_days(pickup, utc(2025, 3, 4, 10)).unwrap();
        assert_eq!(exact, 3);

        let partial = PricingService::rental_days(pickup, utc(2025, 3, 4, 11)).unwrap();
        assert_eq!(partial, 4);
    }

    #[test]
    fn test_rental_days_rejects_return_before_pickup() {
        let pickup = utc(2025, 3, 4, 10);
        let result = PricingService::rental_days(pickup, utc(2025, 3, 1, 10));
        assert!(matches!(result, Err(BookingError::InvalidDateRange(_))));

        let same = PricingService::rental_days(pickup, pickup);
        assert!(matches!(same, Err(BookingError::InvalidDateRange(_))));
    }

    #[test]
    fn test_young_driver_basic_insurance_gps_scenario() {
        // 3 days at 45/day, basic insurance, gps, driver under 25.
        let total = PricingService::price_car_rental(
            45.0,
            3,
            22,
            0,
            InsuranceTier::Basic,
            &CarAddons {
                gps: true,
                ..Default::default()
            },
        );
        assert_eq!(total, 135.0 + 45.0 + 15.0 + 60.0);
        assert_eq!(total, 255.0);
    }

    #[test]
    fn test_insurance_tiers_ordered() {
        let quote = |tier| {
            PricingService::price_car_rental(50.0, 4, 30, 0, tier, &CarAddons::default())
        };
        let none = quote(InsuranceTier::None);
        let basic = quote(InsuranceTier::Basic);
        let premium = quote(InsuranceTier::Premium);

        assert_eq!(none, 200.0);
        assert_eq!(basic, 200.0 + 4.0 * 15.0);
        assert_eq!(premium, 200.0 + 4.0 * 25.0);
        assert!(none < basic && basic < premium);
    }

    #[test]
    fn test_car_price_monotonic_in_days_and_drivers() {
        let mut last = 0.0;
        for days in 1..=10 {
            let price = PricingService::price_car_rental(
                45.0,
                days,
                30,
                0,
                InsuranceTier::None,
                &CarAddons::default(),
            );
            assert!(price >= last);
            last = price;
        }

        let mut last = 0.0;
        for drivers in 0..=4 {
            let price = PricingService::price_car_rental(
                45.0,
                3,
                30,
                drivers,
                InsuranceTier::None,
                &CarAddons::default(),
            );
            assert!(price >= last);
            last = price;
        }
    }

    #[test]
    fn test_additional_driver_and_young_driver_are_independent() {
        // Young-driver is a flat per-day surcharge, not per driver.
        let base = PricingService::price_car_rental(
            40.0,
            2,
            30,
            2,
            InsuranceTier::None,
            &CarAddons::default(),
        );
        assert_eq!(base, 80.0 + 2.0 * 10.0 * 2.0);

        let young = PricingService::price_car_rental(
            40.0,
            2,
            22,
            2,
            InsuranceTier::None,
            &CarAddons::default(),
        );
        assert_eq!(young, base + 2.0 * 20.0);
    }

    #[test]
    fn test_assign_passengers_by_position() {
        let group = travelers(2, 1, 1);
        let inputs = vec![
            passenger("Ana"),
            passenger("Ben"),
            passenger("Cleo"),
            passenger("Dot"),
        ];

        let assigned = PricingService::assign_passengers(&group, &inputs).unwrap();
        let types: Vec<TravelerType> = assigned.iter().map(|p| p.traveler_type).collect();
        assert_eq!(
            types,
            vec![
                TravelerType::Adult,
                TravelerType::Adult,
                TravelerType::Child,
                TravelerType::Infant
            ]
        );
    }

    #[test]
    fn test_assign_passengers_validation() {
        let count_mismatch =
            PricingService::assign_passengers(&travelers(2, 0, 0), &[passenger("Solo")]);
        assert!(matches!(count_mismatch, Err(BookingError::Validation(_))));

        let unnamed = PricingService::assign_passengers(
            &travelers(1, 0, 0),
            &[PassengerInput {
                first_name: "  ".to_string(),
                last_name: "Tester".to_string(),
                date_of_birth: None,
            }],
        );
        assert!(matches!(unnamed, Err(BookingError::Validation(_))));

        let nobody = PricingService::assign_passengers(&travelers(0, 0, 0), &[]);
        assert!(matches!(nobody, Err(BookingError::Validation(_))));
    }

    #[test]
    fn test_traveler_counts_saturate_instead_of_wrapping() {
        let absurd = travelers(u32::MAX, 1, 1);
        assert_eq!(absurd.total(), u32::MAX);
        assert_eq!(absurd.seated(), u32::MAX);
    }

    #[test]
    fn test_assign_passengers_rejects_oversized_party() {
        // Counts that would wrap u32 surface as validation, not a panic,
        // and cannot alias down to a small party that matches the list.
        let absurd = travelers(u32::MAX - 5, 10, 0);
        let result = PricingService::assign_passengers(
            &absurd,
            &[passenger("Ana"), passenger("Ben"), passenger("Cleo"), passenger("Dot")],
        );
        assert!(matches!(result, Err(BookingError::Validation(_))));

        let ten = PricingService::assign_passengers(
            &travelers(5, 4, 1),
            &(0..10).map(|_| passenger("Traveler")).collect::<Vec<_>>(),
        );
        assert!(matches!(ten, Err(BookingError::Validation(_))));

        let nine = PricingService::assign_passengers(
            &travelers(4, 3, 2),
            &(0..9).map(|_| passenger("Traveler")).collect::<Vec<_>>(),
        );
        assert!(nine.is_ok());
    }
}

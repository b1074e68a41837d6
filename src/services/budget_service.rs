use chrono::{Duration, NaiveDate};

use crate::models::activity::ActivityCategory;
use crate::models::bookings::{
    CarBookingStatus, CarRentalBooking, FlightBooking, FlightBookingStatus,
};
use crate::models::budget::{BudgetSummary, CategoryAmount, CategoryBreakdown, DailySpend};
use crate::models::trip::Trip;

pub struct BudgetService;

impl BudgetService {
    /// Consolidates a trip's costs into the budget view. Pure over its
    /// inputs, so recomputing without intervening edits gives the same
    /// summary.
    ///
    /// Category mapping: flights and car rentals are transport, food
    /// activities are meals, every other activity is activities, and
    /// accommodation items are accommodation. Each cost lands in
    /// exactly one category, so the breakdown sums to the total.
    pub fn compute(
        trip: &Trip,
        flights: &[FlightBooking],
        cars: &[CarRentalBooking],
    ) -> BudgetSummary {
        let duration_days = trip.duration_days();
        let mut daily = vec![0.0_f64; duration_days as usize];

        let mut transport = 0.0;
        let mut accommodation = 0.0;
        let mut meals = 0.0;
        let mut activities = 0.0;
        let other = 0.0;

        for booking in flights {
            if booking.status == FlightBookingStatus::Cancelled {
                continue;
            }
            transport += booking.total_price;
            Self::attribute(
                &mut daily,
                trip.start_date,
                booking.departure_datetime.date_naive(),
                booking.total_price,
            );
        }

        for rental in cars {
            if rental.status == CarBookingStatus::Cancelled {
                continue;
            }
            transport += rental.total_price;
            Self::attribute(
                &mut daily,
                trip.start_date,
                rental.pickup_datetime.date_naive(),
                rental.total_price,
            );
        }

        for stop in &trip.stops {
            for activity in &stop.activities {
                if activity.category == ActivityCategory::Food {
                    meals += activity.cost;
                } else {
                    activities += activity.cost;
                }
                Self::attribute(&mut daily, trip.start_date, stop.arrival_date, activity.cost);
            }
        }

        for item in &trip.accommodations {
            accommodation += item.cost;
            Self::attribute(
                &mut daily,
                trip.start_date,
                item.night_of.unwrap_or(trip.start_date),
                item.cost,
            );
        }

        let total_estimated = transport + accommodation + meals + activities + other;
        let per_day_limit = trip.budget / duration_days as f64;

        let daily_spend = daily
            .into_iter()
            .enumerate()
            .map(|(i, amount)| DailySpend {
                date: trip.start_date + Duration::days(i as i64),
                amount,
                over_limit: amount > per_day_limit,
            })
            .collect();

        BudgetSummary {
            total_budget: trip.budget,
            total_estimated,
            breakdown: CategoryBreakdown {
                transport: Self::category(transport, total_estimated),
                accommodation: Self::category(accommodation, total_estimated),
                activities: Self::category(activities, total_estimated),
                meals: Self::category(meals, total_estimated),
                other: Self::category(other, total_estimated),
            },
            cost_per_day: total_estimated / duration_days as f64,
            remaining: trip.budget - total_estimated,
            over_budget: total_estimated > trip.budget,
            duration_days,
            daily_spend,
        }
    }

    /// Adds a cost to the day its date falls on. Dates outside the trip
    /// range still count toward the totals, just not toward any day.
    fn attribute(daily: &mut [f64], trip_start: NaiveDate, date: NaiveDate, amount: f64) {
        let offset = (date - trip_start).num_days();
        if offset >= 0 && (offset as usize) < daily.len() {
            daily[offset as usize] += amount;
        }
    }

    fn category(amount: f64, total: f64) -> CategoryAmount {
        let percent = if total > 0.0 {
            amount / total * 100.0
        } else {
            0.0
        };
        CategoryAmount { amount, percent }
    }
}

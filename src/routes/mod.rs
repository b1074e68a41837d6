use actix_web::HttpResponse;

use crate::services::itinerary_service::ItineraryError;
use crate::services::pricing_service::BookingError;

pub mod car;
pub mod catalog;
pub mod flight;
pub mod health;
pub mod trip;

/// Maps sequencer errors onto responses. Database details stay in the
/// server log, not the body.
pub(crate) fn itinerary_error_response(err: ItineraryError) -> HttpResponse {
    match &err {
        ItineraryError::TripNotFound
        | ItineraryError::StopNotFound
        | ItineraryError::ActivityNotFound
        | ItineraryError::CityNotFound => HttpResponse::NotFound().body(err.to_string()),
        ItineraryError::ConcurrentEdit => HttpResponse::Conflict().body(err.to_string()),
        ItineraryError::InvalidDateRange(_) | ItineraryError::Validation(_) => {
            HttpResponse::BadRequest().body(err.to_string())
        }
        ItineraryError::Database(detail) => {
            eprintln!("Itinerary database error: {}", detail);
            HttpResponse::InternalServerError().body("Internal server error")
        }
    }
}

/// Maps booking errors onto responses. Capacity and double-booking
/// rejections are conflicts, not client mistakes.
pub(crate) fn booking_error_response(err: BookingError) -> HttpResponse {
    match &err {
        BookingError::FlightNotFound
        | BookingError::CarNotFound
        | BookingError::BookingNotFound => HttpResponse::NotFound().body(err.to_string()),
        BookingError::InsufficientCapacity { .. }
        | BookingError::CarUnavailable
        | BookingError::AlreadyCancelled => HttpResponse::Conflict().body(err.to_string()),
        BookingError::InvalidDateRange(_) | BookingError::Validation(_) => {
            HttpResponse::BadRequest().body(err.to_string())
        }
        BookingError::Database(detail) => {
            eprintln!("Booking database error: {}", detail);
            HttpResponse::InternalServerError().body("Internal server error")
        }
    }
}

use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{bson::doc, bson::oid::ObjectId, Client, Collection};
use std::sync::Arc;

use crate::db::mongo::{BOOKINGS_DB, CATALOG_DB, TRIPS_DB};
use crate::middleware::auth::Claims;
use crate::models::bookings::{
    FlightBooking, FlightBookingInput, FlightBookingStatus, PaymentStatus,
};
use crate::models::flight::Flight;
use crate::models::trip::Trip;
use crate::services::availability_service::AvailabilityService;
use crate::services::pricing_service::{BookingError, PricingService};
use crate::services::reference_service::{
    unique_reference, ReferenceGenerator, FLIGHT_REFERENCE_PREFIX,
};

use super::booking_error_response;

pub async fn book_flight(
    data: web::Data<Arc<Client>>,
    generator: web::Data<Arc<dyn ReferenceGenerator>>,
    input: web::Json<FlightBookingInput>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let input = input.into_inner();

    let flight_id = match ObjectId::parse_str(&input.flight_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid flight ID format"),
    };
    let trip_id = match &input.trip_id {
        Some(raw) => match ObjectId::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID format"),
        },
        None => None,
    };

    let passengers = match PricingService::assign_passengers(&input.travelers, &input.passengers) {
        Ok(passengers) => passengers,
        Err(err) => return booking_error_response(err),
    };

    let client = data.into_inner();
    let flights: mongodb::Collection<Flight> = client.database(CATALOG_DB).collection("Flights");

    let flight = match flights.find_one(doc! { "_id": flight_id }).await {
        Ok(Some(flight)) => flight,
        Ok(None) => return booking_error_response(BookingError::FlightNotFound),
        Err(err) => {
            eprintln!("Failed to fetch flight: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch flight");
        }
    };

    // Every traveler occupies a seat, infants included; only the fare
    // skips them. Fail fast on a snapshot read; the reserve below
    // re-checks atomically.
    let seats_needed = input.travelers.total();
    if let Err(err) = AvailabilityService::check_capacity(&flight, &input.class_type, seats_needed)
    {
        return booking_error_response(err);
    }

    if let Some(trip_id) = trip_id {
        let trips: mongodb::Collection<Trip> = client.database(TRIPS_DB).collection("Trips");
        match trips
            .find_one(doc! { "_id": trip_id, "user_id": user_id })
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => return HttpResponse::NotFound().body("Trip not found"),
            Err(err) => {
                eprintln!("Failed to fetch trip: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to fetch trip");
            }
        }
    }

    let fare = flight.price.for_class(&input.class_type);
    let total_price = PricingService::price_flight(fare, &input.travelers, &input.addons);

    let bookings: Collection<FlightBooking> =
        client.database(BOOKINGS_DB).collection("FlightBookings");
    let booking_reference =
        match unique_reference(generator.get_ref().as_ref(), &bookings, FLIGHT_REFERENCE_PREFIX)
            .await
        {
            Ok(reference) => reference,
            Err(err) => return booking_error_response(err),
        };

    if let Err(err) =
        AvailabilityService::reserve_seats(&client, &flight_id, &input.class_type, seats_needed)
            .await
    {
        return booking_error_response(err);
    }

    let now = Utc::now();
    let mut booking = FlightBooking {
        id: None,
        user_id,
        trip_id,
        flight_id,
        booking_reference,
        airline: flight.airline.clone(),
        flight_number: flight.flight_number.clone(),
        origin: flight.origin.clone(),
        destination: flight.destination.clone(),
        departure_datetime: flight.departure_datetime,
        class_type: input.class_type,
        travelers: input.travelers,
        passengers,
        addons: input.addons,
        total_price,
        status: FlightBookingStatus::Upcoming,
        payment_status: PaymentStatus::Pending,
        created_at: Some(now),
        updated_at: Some(now),
    };

    match bookings.insert_one(&booking).await {
        Ok(result) => {
            booking.id = result.inserted_id.as_object_id();
            HttpResponse::Ok().json(booking)
        }
        Err(err) => {
            eprintln!("Failed to store flight booking: {:?}", err);
            // Hand the reserved seats back so the failed insert does not strand them.
            if let Err(release_err) = AvailabilityService::release_seats(
                &client,
                &flight_id,
                &input.class_type,
                seats_needed,
            )
            .await
            {
                eprintln!("Failed to release seats: {:?}", release_err);
            }
            HttpResponse::InternalServerError().body("Failed to store booking")
        }
    }
}

pub async fn get_flight_bookings(data: web::Data<Arc<Client>>, claims: Claims) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };

    let client = data.into_inner();
    let bookings: Collection<FlightBooking> =
        client.database(BOOKINGS_DB).collection("FlightBookings");

    match bookings.find(doc! { "user_id": user_id }).await {
        Ok(cursor) => match cursor.try_collect::<Vec<FlightBooking>>().await {
            Ok(results) => HttpResponse::Ok().json(results),
            Err(err) => {
                eprintln!("Failed to collect flight bookings: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to collect bookings")
            }
        },
        Err(err) => {
            eprintln!("Failed to fetch flight bookings: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch bookings")
        }
    }
}

pub async fn get_flight_booking(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let booking_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid booking ID format"),
    };

    let client = data.into_inner();
    let bookings: Collection<FlightBooking> =
        client.database(BOOKINGS_DB).collection("FlightBookings");

    match bookings
        .find_one(doc! { "_id": booking_id, "user_id": user_id })
        .await
    {
        Ok(Some(booking)) => HttpResponse::Ok().json(booking),
        Ok(None) => booking_error_response(BookingError::BookingNotFound),
        Err(err) => {
            eprintln!("Failed to fetch flight booking: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch booking")
        }
    }
}

pub async fn cancel_flight_booking(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let booking_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid booking ID format"),
    };

    let client = data.into_inner();
    let bookings: Collection<FlightBooking> =
        client.database(BOOKINGS_DB).collection("FlightBookings");

    let booking = match bookings
        .find_one(doc! { "_id": booking_id, "user_id": user_id })
        .await
    {
        Ok(Some(booking)) => booking,
        Ok(None) => return booking_error_response(BookingError::BookingNotFound),
        Err(err) => {
            eprintln!("Failed to fetch flight booking: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch booking");
        }
    };

    // Guarded flip: a second cancel of the same booking matches nothing.
    let filter = doc! {
        "_id": booking_id,
        "user_id": user_id,
        "status": { "$ne": "cancelled" },
    };
    let update = doc! {
        "$set": {
            "status": "cancelled",
            "payment_status": "refunded",
            "updated_at": Utc::now().to_rfc3339(),
        }
    };

    match bookings.update_one(filter, update).await {
        Ok(result) => {
            if result.matched_count == 0 {
                return booking_error_response(BookingError::AlreadyCancelled);
            }

            // Seats go back only once the flip is known to have won.
            if let Err(err) = AvailabilityService::release_seats(
                &client,
                &booking.flight_id,
                &booking.class_type,
                booking.travelers.total(),
            )
            .await
            {
                eprintln!("Failed to release seats after cancellation: {:?}", err);
            }

            HttpResponse::Ok().body("Booking cancelled")
        }
        Err(err) => {
            eprintln!("Failed to cancel flight booking: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to cancel booking")
        }
    }
}

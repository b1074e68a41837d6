use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{bson::doc, bson::oid::ObjectId, Client, Collection};
use std::sync::Arc;

use crate::db::mongo::{BOOKINGS_DB, CATALOG_DB, TRIPS_DB};
use crate::middleware::auth::Claims;
use crate::models::bookings::{CarBookingStatus, CarRentalBooking, CarRentalInput, PaymentStatus};
use crate::models::car::Car;
use crate::models::trip::Trip;
use crate::services::availability_service::{AvailabilityService, CarLockRegistry, LedgerSettings};
use crate::services::pricing_service::{BookingError, PricingService};
use crate::services::reference_service::{
    unique_reference, ReferenceGenerator, CAR_REFERENCE_PREFIX,
};

use super::booking_error_response;

pub async fn book_car(
    data: web::Data<Arc<Client>>,
    generator: web::Data<Arc<dyn ReferenceGenerator>>,
    registry: web::Data<CarLockRegistry>,
    settings: web::Data<LedgerSettings>,
    input: web::Json<CarRentalInput>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let input = input.into_inner();

    let car_id = match ObjectId::parse_str(&input.car_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid car ID format"),
    };
    let trip_id = match &input.trip_id {
        Some(raw) => match ObjectId::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID format"),
        },
        None => None,
    };
    let stop_id = match &input.stop_id {
        Some(raw) => match ObjectId::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => return HttpResponse::BadRequest().body("Invalid stop ID format"),
        },
        None => None,
    };

    if input.pickup_location.trim().is_empty() {
        return booking_error_response(BookingError::Validation(
            "pickup location must not be empty".to_string(),
        ));
    }

    let rental_days = match PricingService::rental_days(input.pickup_datetime, input.return_datetime)
    {
        Ok(days) => days,
        Err(err) => return booking_error_response(err),
    };

    let client = data.into_inner();
    let cars: mongodb::Collection<Car> = client.database(CATALOG_DB).collection("Cars");

    let car = match cars.find_one(doc! { "_id": car_id }).await {
        Ok(Some(car)) => car,
        Ok(None) => return booking_error_response(BookingError::CarNotFound),
        Err(err) => {
            eprintln!("Failed to fetch car: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch car");
        }
    };

    if !car.available {
        return booking_error_response(BookingError::CarUnavailable);
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

    let total_price = PricingService::price_car_rental(
        car.daily_rate,
        rental_days,
        input.driver_age,
        input.additional_drivers,
        input.insurance,
        &input.addons,
    );

    let bookings: Collection<CarRentalBooking> =
        client.database(BOOKINGS_DB).collection("CarRentalBookings");
    let booking_reference =
        match unique_reference(generator.get_ref().as_ref(), &bookings, CAR_REFERENCE_PREFIX).await
        {
            Ok(reference) => reference,
            Err(err) => return booking_error_response(err),
        };

    let now = Utc::now();
    let mut booking = CarRentalBooking {
        id: None,
        user_id,
        trip_id,
        stop_id,
        car_id,
        booking_reference,
        car_name: car.name.clone(),
        daily_rate: car.daily_rate,
        pickup_location: input.pickup_location.trim().to_string(),
        pickup_datetime: input.pickup_datetime,
        return_datetime: input.return_datetime,
        rental_days,
        driver_age: input.driver_age,
        additional_drivers: input.additional_drivers,
        insurance: input.insurance,
        addons: input.addons,
        total_price,
        status: CarBookingStatus::Upcoming,
        payment_status: PaymentStatus::Pending,
        created_at: Some(now),
        updated_at: Some(now),
    };

    // The overlap check and the insert must not interleave with another
    // request for the same car, so both happen under the car's lock.
    let insert_result = if settings.prevent_double_booking {
        let lock = registry.lock_for(&car_id);
        let _guard = lock.lock().await;

        match AvailabilityService::car_window_conflicts(
            &client,
            &car_id,
            input.pickup_datetime,
            input.return_datetime,
        )
        .await
        {
            Ok(true) => return booking_error_response(BookingError::CarUnavailable),
            Ok(false) => {}
            Err(err) => return booking_error_response(err),
        }

        bookings.insert_one(&booking).await
    } else {
        bookings.insert_one(&booking).await
    };

    match insert_result {
        Ok(result) => {
            booking.id = result.inserted_id.as_object_id();
            HttpResponse::Ok().json(booking)
        }
        Err(err) => {
            eprintln!("Failed to store car rental booking: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to store booking")
        }
    }
}

pub async fn get_car_bookings(data: web::Data<Arc<Client>>, claims: Claims) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };

    let client = data.into_inner();
    let bookings: Collection<CarRentalBooking> =
        client.database(BOOKINGS_DB).collection("CarRentalBookings");

    match bookings.find(doc! { "user_id": user_id }).await {
        Ok(cursor) => match cursor.try_collect::<Vec<CarRentalBooking>>().await {
            Ok(results) => HttpResponse::Ok().json(results),
            Err(err) => {
                eprintln!("Failed to collect car rental bookings: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to collect bookings")
            }
        },
        Err(err) => {
            eprintln!("Failed to fetch car rental bookings: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch bookings")
        }
    }
}

pub async fn get_car_booking(
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
    let bookings: Collection<CarRentalBooking> =
        client.database(BOOKINGS_DB).collection("CarRentalBookings");

    match bookings
        .find_one(doc! { "_id": booking_id, "user_id": user_id })
        .await
    {
        Ok(Some(booking)) => HttpResponse::Ok().json(booking),
        Ok(None) => booking_error_response(BookingError::BookingNotFound),
        Err(err) => {
            eprintln!("Failed to fetch car rental booking: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch booking")
        }
    }
}

pub async fn cancel_car_booking(
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
    let bookings: Collection<CarRentalBooking> =
        client.database(BOOKINGS_DB).collection("CarRentalBookings");

    match bookings
        .find_one(doc! { "_id": booking_id, "user_id": user_id })
        .await
    {
        Ok(Some(_)) => {}
        Ok(None) => return booking_error_response(BookingError::BookingNotFound),
        Err(err) => {
            eprintln!("Failed to fetch car rental booking: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch booking");
        }
    }

    // Guarded flip: cancelling twice matches nothing the second time.
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
            HttpResponse::Ok().body("Booking cancelled")
        }
        Err(err) => {
            eprintln!("Failed to cancel car rental booking: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to cancel booking")
        }
    }
}

use actix_web::{web, HttpResponse, Responder};
use chrono::{Duration, Utc};
use futures::TryStreamExt;
use mongodb::{bson::doc, bson::oid::ObjectId, bson::Document, Client, Collection};
use std::sync::Arc;

use crate::db::mongo::{BOOKINGS_DB, CATALOG_DB, TRIPS_DB};
use crate::middleware::auth::Claims;
use crate::models::activity::{ActivityOption, StopActivity};
use crate::models::bookings::{CarRentalBooking, FlightBooking};
use crate::models::city::City;
use crate::models::trip::{
    AccommodationInput, AccommodationItem, ActivityInput, StopInput, Trip, TripInput,
};
use crate::services::budget_service::BudgetService;
use crate::services::itinerary_service::{ItineraryError, ItineraryService};

use super::itinerary_error_response;

/// Filter matching the trip only at the revision this request loaded.
fn revision_guard(trip_id: ObjectId, revision: i64) -> Document {
    doc! { "_id": trip_id, "revision": revision }
}

/// Writes the whole trip back, guarded by the loaded revision. A
/// replace that matches nothing lost to a concurrent edit of the same
/// trip; the edit is not applied.
async fn persist_trip(
    trips: &Collection<Trip>,
    trip_id: ObjectId,
    trip: &mut Trip,
) -> Result<(), ItineraryError> {
    let loaded_revision = trip.revision;
    trip.revision = loaded_revision + 1;
    trip.updated_at = Some(Utc::now());

    let result = trips
        .replace_one(revision_guard(trip_id, loaded_revision), &*trip)
        .await
        .map_err(|e| ItineraryError::Database(e.to_string()))?;

    if result.matched_count == 0 {
        return Err(ItineraryError::ConcurrentEdit);
    }
    Ok(())
}

async fn load_trip_bookings(
    client: &Client,
    trip_id: ObjectId,
    user_id: ObjectId,
) -> Result<(Vec<FlightBooking>, Vec<CarRentalBooking>), mongodb::error::Error> {
    let filter = doc! { "trip_id": trip_id, "user_id": user_id };

    let flights: Collection<FlightBooking> =
        client.database(BOOKINGS_DB).collection("FlightBookings");
    let flight_bookings = flights
        .find(filter.clone())
        .await?
        .try_collect::<Vec<FlightBooking>>()
        .await?;

    let cars: Collection<CarRentalBooking> =
        client.database(BOOKINGS_DB).collection("CarRentalBookings");
    let car_bookings = cars
        .find(filter)
        .await?
        .try_collect::<Vec<CarRentalBooking>>()
        .await?;

    Ok((flight_bookings, car_bookings))
}

pub async fn create_trip(
    data: web::Data<Arc<Client>>,
    input: web::Json<TripInput>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let input = input.into_inner();

    if let Err(err) = ItineraryService::validate_trip(
        &input.name,
        input.start_date,
        input.end_date,
        input.budget,
    ) {
        return itinerary_error_response(err);
    }

    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(TRIPS_DB).collection("Trips");

    let now = Utc::now();
    let mut trip = Trip {
        id: None,
        user_id,
        name: input.name.trim().to_string(),
        start_date: input.start_date,
        end_date: input.end_date,
        budget: input.budget,
        stops: Vec::new(),
        accommodations: Vec::new(),
        revision: 0,
        created_at: Some(now),
        updated_at: Some(now),
    };

    match trips.insert_one(&trip).await {
        Ok(result) => {
            trip.id = result.inserted_id.as_object_id();
            HttpResponse::Ok().json(trip)
        }
        Err(err) => {
            eprintln!("Failed to create trip: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to create trip")
        }
    }
}

pub async fn get_trips(data: web::Data<Arc<Client>>, claims: Claims) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };

    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(TRIPS_DB).collection("Trips");

    match trips.find(doc! { "user_id": user_id }).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Trip>>().await {
            Ok(results) => HttpResponse::Ok().json(results),
            Err(err) => {
                eprintln!("Failed to collect trips: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to collect trips")
            }
        },
        Err(err) => {
            eprintln!("Failed to fetch trips: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch trips")
        }
    }
}

pub async fn get_trip(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let trip_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID format"),
    };

    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(TRIPS_DB).collection("Trips");

    match trips
        .find_one(doc! { "_id": trip_id, "user_id": user_id })
        .await
    {
        Ok(Some(trip)) => HttpResponse::Ok().json(trip),
        Ok(None) => HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            eprintln!("Failed to fetch trip: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch trip")
        }
    }
}

pub async fn update_trip(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<TripInput>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let trip_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID format"),
    };
    let input = input.into_inner();

    if let Err(err) = ItineraryService::validate_trip(
        &input.name,
        input.start_date,
        input.end_date,
        input.budget,
    ) {
        return itinerary_error_response(err);
    }

    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(TRIPS_DB).collection("Trips");

    let mut trip = match trips
        .find_one(doc! { "_id": trip_id, "user_id": user_id })
        .await
    {
        Ok(Some(trip)) => trip,
        Ok(None) => return HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            eprintln!("Failed to fetch trip: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch trip");
        }
    };

    trip.name = input.name.trim().to_string();
    trip.start_date = input.start_date;
    trip.end_date = input.end_date;
    trip.budget = input.budget;

    match persist_trip(&trips, trip_id, &mut trip).await {
        Ok(_) => HttpResponse::Ok().json(trip),
        Err(err) => itinerary_error_response(err),
    }
}

pub async fn add_stop(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<StopInput>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let trip_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID format"),
    };
    let city_id = match ObjectId::parse_str(&input.city_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid city ID format"),
    };

    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(TRIPS_DB).collection("Trips");

    let mut trip = match trips
        .find_one(doc! { "_id": trip_id, "user_id": user_id })
        .await
    {
        Ok(Some(trip)) => trip,
        Ok(None) => return HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            eprintln!("Failed to fetch trip: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch trip");
        }
    };

    let cities: mongodb::Collection<City> = client.database(CATALOG_DB).collection("Cities");
    let city = match cities.find_one(doc! { "_id": city_id }).await {
        Ok(Some(city)) => city,
        Ok(None) => return itinerary_error_response(ItineraryError::CityNotFound),
        Err(err) => {
            eprintln!("Failed to fetch city: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch city");
        }
    };

    // Omitted dates fall back to the proposed window: pick up where the
    // itinerary leaves off and stay two nights.
    let (default_arrival, _) = ItineraryService::default_stop_window(&trip);
    let arrival_date = input.arrival_date.unwrap_or(default_arrival);
    let departure_date = input
        .departure_date
        .unwrap_or_else(|| arrival_date + Duration::days(2));

    match ItineraryService::add_stop(&mut trip, city_id, &city.name, arrival_date, departure_date)
    {
        Ok(stop) => match persist_trip(&trips, trip_id, &mut trip).await {
            Ok(_) => HttpResponse::Ok().json(stop),
            Err(err) => itinerary_error_response(err),
        },
        Err(err) => itinerary_error_response(err),
    }
}

pub async fn remove_stop(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let (trip_id, stop_id) = path.into_inner();
    let trip_id = match ObjectId::parse_str(&trip_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID format"),
    };
    let stop_id = match ObjectId::parse_str(&stop_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid stop ID format"),
    };

    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(TRIPS_DB).collection("Trips");

    let mut trip = match trips
        .find_one(doc! { "_id": trip_id, "user_id": user_id })
        .await
    {
        Ok(Some(trip)) => trip,
        Ok(None) => return HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            eprintln!("Failed to fetch trip: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch trip");
        }
    };

    match ItineraryService::remove_stop(&mut trip, &stop_id) {
        Ok(_) => match persist_trip(&trips, trip_id, &mut trip).await {
            Ok(_) => HttpResponse::Ok().json(trip),
            Err(err) => itinerary_error_response(err),
        },
        Err(err) => itinerary_error_response(err),
    }
}

pub async fn add_activity(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
    input: web::Json<ActivityInput>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let (trip_id, stop_id) = path.into_inner();
    let trip_id = match ObjectId::parse_str(&trip_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID format"),
    };
    let stop_id = match ObjectId::parse_str(&stop_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid stop ID format"),
    };
    let activity_id = match ObjectId::parse_str(&input.activity_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid activity ID format"),
    };

    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(TRIPS_DB).collection("Trips");

    let mut trip = match trips
        .find_one(doc! { "_id": trip_id, "user_id": user_id })
        .await
    {
        Ok(Some(trip)) => trip,
        Ok(None) => return HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            eprintln!("Failed to fetch trip: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch trip");
        }
    };

    let catalog: mongodb::Collection<ActivityOption> =
        client.database(CATALOG_DB).collection("Activities");
    let option = match catalog.find_one(doc! { "_id": activity_id }).await {
        Ok(Some(option)) => option,
        Ok(None) => return itinerary_error_response(ItineraryError::ActivityNotFound),
        Err(err) => {
            eprintln!("Failed to fetch activity: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch activity");
        }
    };

    let activity = StopActivity::from_option(&option);
    match ItineraryService::add_activity(&mut trip, &stop_id, activity) {
        Ok(added) => match persist_trip(&trips, trip_id, &mut trip).await {
            Ok(_) => HttpResponse::Ok().json(added),
            Err(err) => itinerary_error_response(err),
        },
        Err(err) => itinerary_error_response(err),
    }
}

pub async fn remove_activity(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String, String)>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let (trip_id, stop_id, activity_id) = path.into_inner();
    let trip_id = match ObjectId::parse_str(&trip_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID format"),
    };
    let stop_id = match ObjectId::parse_str(&stop_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid stop ID format"),
    };
    let activity_id = match ObjectId::parse_str(&activity_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid activity ID format"),
    };

    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(TRIPS_DB).collection("Trips");

    let mut trip = match trips
        .find_one(doc! { "_id": trip_id, "user_id": user_id })
        .await
    {
        Ok(Some(trip)) => trip,
        Ok(None) => return HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            eprintln!("Failed to fetch trip: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch trip");
        }
    };

    match ItineraryService::remove_activity(&mut trip, &stop_id, &activity_id) {
        Ok(_) => match persist_trip(&trips, trip_id, &mut trip).await {
            Ok(_) => HttpResponse::Ok().json(trip),
            Err(err) => itinerary_error_response(err),
        },
        Err(err) => itinerary_error_response(err),
    }
}

pub async fn add_accommodation(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<AccommodationInput>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let trip_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID format"),
    };
    let input = input.into_inner();

    if input.name.trim().is_empty() {
        return itinerary_error_response(ItineraryError::Validation(
            "accommodation name must not be empty".to_string(),
        ));
    }
    if input.cost < 0.0 {
        return itinerary_error_response(ItineraryError::Validation(
            "accommodation cost must not be negative".to_string(),
        ));
    }

    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(TRIPS_DB).collection("Trips");

    let mut trip = match trips
        .find_one(doc! { "_id": trip_id, "user_id": user_id })
        .await
    {
        Ok(Some(trip)) => trip,
        Ok(None) => return HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            eprintln!("Failed to fetch trip: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch trip");
        }
    };

    let item = AccommodationItem {
        id: ObjectId::new(),
        name: input.name.trim().to_string(),
        cost: input.cost,
        night_of: input.night_of,
    };
    trip.accommodations.push(item.clone());

    match persist_trip(&trips, trip_id, &mut trip).await {
        Ok(_) => HttpResponse::Ok().json(item),
        Err(err) => itinerary_error_response(err),
    }
}

pub async fn remove_accommodation(
    data: web::Data<Arc<Client>>,
    path: web::Path<(String, String)>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let (trip_id, item_id) = path.into_inner();
    let trip_id = match ObjectId::parse_str(&trip_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID format"),
    };
    let item_id = match ObjectId::parse_str(&item_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid accommodation ID format"),
    };

    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(TRIPS_DB).collection("Trips");

    let mut trip = match trips
        .find_one(doc! { "_id": trip_id, "user_id": user_id })
        .await
    {
        Ok(Some(trip)) => trip,
        Ok(None) => return HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            eprintln!("Failed to fetch trip: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch trip");
        }
    };

    let idx = match trip.accommodations.iter().position(|item| item.id == item_id) {
        Some(idx) => idx,
        None => return HttpResponse::NotFound().body("Accommodation item not found"),
    };
    trip.accommodations.remove(idx);

    match persist_trip(&trips, trip_id, &mut trip).await {
        Ok(_) => HttpResponse::Ok().json(trip),
        Err(err) => itinerary_error_response(err),
    }
}

pub async fn get_budget(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let trip_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID format"),
    };

    let client = data.into_inner();
    let trips: mongodb::Collection<Trip> = client.database(TRIPS_DB).collection("Trips");

    let trip = match trips
        .find_one(doc! { "_id": trip_id, "user_id": user_id })
        .await
    {
        Ok(Some(trip)) => trip,
        Ok(None) => return HttpResponse::NotFound().body("Trip not found"),
        Err(err) => {
            eprintln!("Failed to fetch trip: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch trip");
        }
    };

    match load_trip_bookings(&client, trip_id, user_id).await {
        Ok((flight_bookings, car_bookings)) => {
            let summary = BudgetService::compute(&trip, &flight_bookings, &car_bookings);
            HttpResponse::Ok().json(summary)
        }
        Err(err) => {
            eprintln!("Failed to fetch bookings for budget: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch bookings")
        }
    }
}

pub async fn get_trip_bookings(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    claims: Claims,
) -> impl Responder {
    let user_id = match claims.user_object_id() {
        Ok(id) => id,
        Err(_) => return HttpResponse::Unauthorized().body("Invalid user id in token"),
    };
    let trip_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid trip ID format"),
    };

    let client = data.into_inner();
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

    match load_trip_bookings(&client, trip_id, user_id).await {
        Ok((flight_bookings, car_bookings)) => HttpResponse::Ok().json(serde_json::json!({
            "flights": flight_bookings,
            "cars": car_bookings,
        })),
        Err(err) => {
            eprintln!("Failed to fetch trip bookings: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch bookings")
        }
    }
}

use actix_web::{web, HttpResponse, Responder};
use futures::TryStreamExt;
use mongodb::{bson::doc, bson::oid::ObjectId, options::FindOptions, Client};
use std::sync::Arc;

use crate::db::mongo::CATALOG_DB;
use crate::models::activity::ActivityOption;
use crate::models::car::Car;
use crate::models::city::City;
use crate::models::flight::Flight;

#[derive(serde::Deserialize)]
pub struct CityQuery {
    limit: Option<u16>,
    search: Option<String>,
}

pub async fn get_cities(
    data: web::Data<Arc<Client>>,
    params: web::Query<CityQuery>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<City> = client.database(CATALOG_DB).collection("Cities");

    let mut options = FindOptions::default();
    if let Some(limit) = params.limit {
        options.limit = Some(limit.into());
    }
    let filter = match &params.search {
        Some(search_text) if !search_text.is_empty() => {
            doc! {
                "name": {
                    "$regex": format!("^{}", regex::escape(search_text)),
                    "$options": "i"
                }
            }
        }
        _ => doc! {},
    };

    match collection.find(filter).with_options(options).await {
        Ok(cursor) => match cursor.try_collect::<Vec<City>>().await {
            Ok(cities) => HttpResponse::Ok().json(cities),
            Err(err) => {
                eprintln!("Failed to collect cities: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to collect cities.")
            }
        },
        Err(err) => {
            eprintln!("Failed to find cities: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to find cities.")
        }
    }
}

#[derive(serde::Deserialize)]
pub struct ActivityQuery {
    city_id: Option<String>,
}

pub async fn get_activities(
    data: web::Data<Arc<Client>>,
    params: web::Query<ActivityQuery>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<ActivityOption> =
        client.database(CATALOG_DB).collection("Activities");

    let filter = match &params.city_id {
        Some(raw) => match ObjectId::parse_str(raw) {
            Ok(city_id) => doc! { "city_id": city_id },
            Err(_) => return HttpResponse::BadRequest().body("Invalid city ID format"),
        },
        None => doc! {},
    };

    match collection.find(filter).await {
        Ok(cursor) => match cursor.try_collect::<Vec<ActivityOption>>().await {
            Ok(activities) => HttpResponse::Ok().json(activities),
            Err(err) => {
                eprintln!("Failed to collect activities: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to collect activities.")
            }
        },
        Err(err) => {
            eprintln!("Failed to find activities: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to find activities.")
        }
    }
}

#[derive(serde::Deserialize)]
pub struct FlightQuery {
    origin: Option<String>,
    destination: Option<String>,
}

pub async fn get_flights(
    data: web::Data<Arc<Client>>,
    params: web::Query<FlightQuery>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Flight> =
        client.database(CATALOG_DB).collection("Flights");

    let mut filter = doc! {};
    if let Some(origin) = params.origin.as_deref().filter(|s| !s.is_empty()) {
        filter.insert(
            "origin",
            doc! { "$regex": format!("^{}$", regex::escape(origin)), "$options": "i" },
        );
    }
    if let Some(destination) = params.destination.as_deref().filter(|s| !s.is_empty()) {
        filter.insert(
            "destination",
            doc! { "$regex": format!("^{}$", regex::escape(destination)), "$options": "i" },
        );
    }

    match collection.find(filter).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Flight>>().await {
            Ok(flights) => HttpResponse::Ok().json(flights),
            Err(err) => {
                eprintln!("Failed to collect flights: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to collect flights.")
            }
        },
        Err(err) => {
            eprintln!("Failed to find flights: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to find flights.")
        }
    }
}

pub async fn get_flight_by_id(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let flight_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid flight ID format"),
    };

    let client = data.into_inner();
    let collection: mongodb::Collection<Flight> =
        client.database(CATALOG_DB).collection("Flights");

    match collection.find_one(doc! { "_id": flight_id }).await {
        Ok(Some(flight)) => HttpResponse::Ok().json(flight),
        Ok(None) => HttpResponse::NotFound().body("Flight not found"),
        Err(err) => {
            eprintln!("Failed to fetch flight: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch flight.")
        }
    }
}

#[derive(serde::Deserialize)]
pub struct CarQuery {
    location: Option<String>,
}

pub async fn get_cars(
    data: web::Data<Arc<Client>>,
    params: web::Query<CarQuery>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: mongodb::Collection<Car> = client.database(CATALOG_DB).collection("Cars");

    let filter = match params.location.as_deref().filter(|s| !s.is_empty()) {
        Some(location) => doc! {
            "location": {
                "$regex": format!("^{}", regex::escape(location)),
                "$options": "i"
            }
        },
        None => doc! {},
    };

    match collection.find(filter).await {
        Ok(cursor) => match cursor.try_collect::<Vec<Car>>().await {
            Ok(cars) => HttpResponse::Ok().json(cars),
            Err(err) => {
                eprintln!("Failed to collect cars: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to collect cars.")
            }
        },
        Err(err) => {
            eprintln!("Failed to find cars: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to find cars.")
        }
    }
}

pub async fn get_car_by_id(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
) -> impl Responder {
    let car_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid car ID format"),
    };

    let client = data.into_inner();
    let collection: mongodb::Collection<Car> = client.database(CATALOG_DB).collection("Cars");

    match collection.find_one(doc! { "_id": car_id }).await {
        Ok(Some(car)) => HttpResponse::Ok().json(car),
        Ok(None) => HttpResponse::NotFound().body("Car not found"),
        Err(err) => {
            eprintln!("Failed to fetch car: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch car.")
        }
    }
}

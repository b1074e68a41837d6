use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

mod db;
mod middleware;
mod models;
mod routes;
mod services;

use services::availability_service::{CarLockRegistry, LedgerSettings};
use services::reference_service::{RandomReferenceGenerator, ReferenceGenerator};

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    println!("Logger initialized");

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    } else {
        println!("Release mode");
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);
    println!("Attempting to bind to {}:{}", host, port);

    let mongo_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    println!("Got MongoDB URI, attempting connection...");
    let client = db::mongo::create_mongo_client(&mongo_uri).await;
    println!("MongoDB connection established");

    // Built once so every worker shares the same car locks and settings.
    let reference_generator: Arc<dyn ReferenceGenerator> = Arc::new(RandomReferenceGenerator);
    let reference_generator = web::Data::new(reference_generator);
    let car_locks = web::Data::new(CarLockRegistry::new());
    let ledger_settings = web::Data::new(LedgerSettings::from_env());

    println!("Starting HTTP server...");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .route("/health", web::get().to(routes::health::health_check))
            .app_data(web::Data::new(client.clone()))
            .app_data(reference_generator.clone())
            .app_data(car_locks.clone())
            .app_data(ledger_settings.clone())
            .service(
                web::scope("/api")
                    // Public catalog routes
                    .route("/cities", web::get().to(routes::catalog::get_cities))
                    .route(
                        "/activities",
                        web::get().to(routes::catalog::get_activities),
                    )
                    .route("/flights", web::get().to(routes::catalog::get_flights))
                    .route(
                        "/flights/{id}",
                        web::get().to(routes::catalog::get_flight_by_id),
                    )
                    .route("/cars", web::get().to(routes::catalog::get_cars))
                    .route("/cars/{id}", web::get().to(routes::catalog::get_car_by_id))
                    // Protected routes
                    .service(
                        web::scope("/trips")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route("", web::post().to(routes::trip::create_trip))
                            .route("", web::get().to(routes::trip::get_trips))
                            .route("/{id}", web::get().to(routes::trip::get_trip))
                            .route("/{id}", web::put().to(routes::trip::update_trip))
                            .route("/{id}/budget", web::get().to(routes::trip::get_budget))
                            .route(
                                "/{id}/bookings",
                                web::get().to(routes::trip::get_trip_bookings),
                            )
                            .route("/{id}/stops", web::post().to(routes::trip::add_stop))
                            .route(
                                "/{id}/stops/{stop_id}",
                                web::delete().to(routes::trip::remove_stop),
                            )
                            .route(
                                "/{id}/stops/{stop_id}/activities",
                                web::post().to(routes::trip::add_activity),
                            )
                            .route(
                                "/{id}/stops/{stop_id}/activities/{activity_id}",
                                web::delete().to(routes::trip::remove_activity),
                            )
                            .route(
                                "/{id}/accommodations",
                                web::post().to(routes::trip::add_accommodation),
                            )
                            .route(
                                "/{id}/accommodations/{item_id}",
                                web::delete().to(routes::trip::remove_accommodation),
                            ),
                    )
                    .service(
                        web::scope("/bookings")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route("/flights", web::post().to(routes::flight::book_flight))
                            .route(
                                "/flights",
                                web::get().to(routes::flight::get_flight_bookings),
                            )
                            .route(
                                "/flights/{id}",
                                web::get().to(routes::flight::get_flight_booking),
                            )
                            .route(
                                "/flights/{id}/cancel",
                                web::put().to(routes::flight::cancel_flight_booking),
                            )
                            .route("/cars", web::post().to(routes::car::book_car))
                            .route("/cars", web::get().to(routes::car::get_car_bookings))
                            .route("/cars/{id}", web::get().to(routes::car::get_car_booking))
                            .route(
                                "/cars/{id}/cancel",
                                web::put().to(routes::car::cancel_car_booking),
                            ),
                    ),
            )
    })
    .bind((host, port))?
    .run()
    .await
}

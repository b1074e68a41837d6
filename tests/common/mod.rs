use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{middleware::Logger, web, App};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;
use std::time::Duration;

use wayfare_api::middleware::auth::{AuthMiddleware, Claims};
use wayfare_api::routes;
use wayfare_api::services::availability_service::{CarLockRegistry, LedgerSettings};
use wayfare_api::services::reference_service::{RandomReferenceGenerator, ReferenceGenerator};

pub struct TestApp {
    pub client: Arc<mongodb::Client>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mongo_uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        // Short selection timeout so requests that are rejected before any
        // query do not wait on a server that may not be listening.
        let mut options = mongodb::options::ClientOptions::parse(&mongo_uri)
            .await
            .expect("invalid MongoDB URI");
        options.server_selection_timeout = Some(Duration::from_secs(1));
        options.connect_timeout = Some(Duration::from_secs(1));

        let client = Arc::new(
            mongodb::Client::with_options(options).expect("failed to create MongoDB client"),
        );

        Self { client }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let reference_generator: Arc<dyn ReferenceGenerator> = Arc::new(RandomReferenceGenerator);

        App::new()
            .app_data(web::Data::new(self.client.clone()))
            .app_data(web::Data::new(reference_generator))
            .app_data(web::Data::new(CarLockRegistry::new()))
            .app_data(web::Data::new(LedgerSettings::from_env()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            // In a running server actix-http's dispatcher renders service-level
            // errors (e.g. AuthMiddleware rejections) into responses; the
            // in-process test service has no dispatcher, so replicate that here
            // or `test::call_service` panics on the bare Err. The original
            // request is consumed by the inner call (and must not be cloned —
            // routing mutates it via Rc::get_mut), so the error response is
            // carried on a synthetic request.
            .wrap_fn(|req, srv| {
                let fut = srv.call(req);
                async move {
                    match fut.await {
                        Ok(res) => Ok(res.map_into_left_body()),
                        Err(err) => {
                            let res = err.error_response();
                            let http_req = actix_web::test::TestRequest::default().to_http_request();
                            Ok(ServiceResponse::new(http_req, res).map_into_right_body())
                        }
                    }
                }
            })
            .route("/health", web::get().to(routes::health::health_check))
            .service(
                web::scope("/api")
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
                    .service(
                        web::scope("/trips")
                            .wrap(AuthMiddleware)
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
                            .wrap(AuthMiddleware)
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
    }
}

pub fn get_test_user_id() -> String {
    "665f1f77bcf86cd799439011".to_string()
}

/// Signs a token the way the server verifies them, including the
/// fallback secret used when JWT_SECRET is unset.
pub fn auth_header() -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: "traveler@example.com".to_string(),
        exp: (now + 3600) as usize,
        iat: now as usize,
        user_id: get_test_user_id(),
    };

    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "default_secret".to_string());
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to sign test token");

    format!("Bearer {}", token)
}

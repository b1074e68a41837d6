use mongodb::bson::doc;
use mongodb::Collection;
use rand::{distributions::Alphanumeric, Rng};

use crate::services::pricing_service::BookingError;

pub const FLIGHT_REFERENCE_PREFIX: &str = "FL";
pub const CAR_REFERENCE_PREFIX: &str = "CR";

/// Source of booking reference codes. Injected so formatting and
/// uniqueness stay testable with a deterministic double.
pub trait ReferenceGenerator: Send + Sync {
    fn generate(&self, prefix: &str) -> String;
}

pub struct RandomReferenceGenerator;

impl ReferenceGenerator for RandomReferenceGenerator {
    fn generate(&self, prefix: &str) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect::<String>()
            .to_uppercase();

        format!("{}{}", prefix, suffix)
    }
}

/// Draws references until one is unused. Collisions are rare enough
/// that running out of attempts means something is wrong with the
/// store, not the generator.
pub async fn unique_reference<T: Send + Sync>(
    generator: &dyn ReferenceGenerator,
    bookings: &Collection<T>,
    prefix: &str,
) -> Result<String, BookingError> {
    for _ in 0..5 {
        let candidate = generator.generate(prefix);
        let taken = bookings
            .count_documents(doc! { "booking_reference": &candidate })
            .await
            .map_err(|e| BookingError::Database(e.to_string()))?;

        if taken == 0 {
            return Ok(candidate);
        }
    }

    Err(BookingError::Database(
        "could not allocate a unique booking reference".to_string(),
    ))
}

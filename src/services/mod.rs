pub mod availability_service;
pub mod budget_service;
pub mod itinerary_service;
pub mod pricing_service;
pub mod reference_service;

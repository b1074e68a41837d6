pub mod activity;
pub mod bookings;
pub mod budget;
pub mod car;
pub mod city;
pub mod flight;
pub mod trip;

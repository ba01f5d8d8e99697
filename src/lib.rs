pub mod configuration;
pub mod errors;
pub mod outbound;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod workers;

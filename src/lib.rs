pub mod api;
pub mod config;
pub mod error;
pub mod ppm;
pub mod telemetry;

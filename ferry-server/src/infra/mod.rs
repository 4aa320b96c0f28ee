pub mod app_context;
pub mod startup;
pub mod telemetry;

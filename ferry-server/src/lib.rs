//! # Ferry Server
//!
//! Import service process: sweeps the inbox on a fixed interval and answers a
//! single liveness route over HTTP.
//!
//! The binary wires [`ferry_config`] into [`server::run_with_hooks`]; tests
//! drive the same entry point with their own [`infra::startup::StartupHooks`].

pub mod infra;
pub mod routes;
pub mod server;

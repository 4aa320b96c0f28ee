//! Configuration loading for Ferry.
//!
//! Values are resolved from environment variables, then a TOML file, then
//! built-in defaults. `.env` files are honoured through `dotenvy`. Loading
//! ends with guard rails that reject unusable settings and collect warnings
//! for the ones that were patched.

#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{Config, ConfigMetadata, DirectoryConfig, ServerConfig};
pub use sources::{EnvConfig, FileConfig};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};

//! Configuration for the Courier runtime.
//!
//! Settings are layered with figment: built-in defaults, then a
//! `courier.toml` file, then `COURIER_*` environment variables, then
//! programmatic overrides.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    CourierConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, MediatorConfig, PipelineConfig,
    SpanEventConfig,
};

//! Courier Runtime - configuration and logging bootstrap for the Courier mediator.
//!
//! This crate provides:
//! - Layered configuration ([`config::ConfigLoader`]) over defaults, `courier.toml`
//!   and `COURIER_*` environment variables
//! - A [`config::CourierConfig::mediator_builder`] preloaded with the configured
//!   publish strategy and pipeline stages
//! - Logging setup ([`logging::LoggingBuilder`], [`logging::init_from_config`])
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: TOML files and inline TOML sources
//! - `json-log`: the `json` log format
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use courier_core::Registry;
//! use courier_runtime::{config::ConfigLoader, logging};
//!
//! let config = ConfigLoader::new().load()?;
//! logging::init_from_config(&config.logging);
//!
//! let registry = Arc::new(Registry::new());
//! let mediator = config.mediator_builder().registry(registry).build()?;
//! ```

pub mod config;
pub mod logging;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, CourierConfig, LoggingConfig, MediatorConfig,
    load_config, load_config_from_file,
};
pub use logging::{LoggingBuilder, SpanEvents, init_from_config};

// Re-export tracing for downstream crates
pub use tracing;

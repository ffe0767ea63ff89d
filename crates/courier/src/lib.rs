//! # Courier
//!
//! An in-process mediator: typed requests are dispatched to a single handler
//! through a composable middleware pipeline, and notifications are fanned out
//! to every subscriber under a selectable publish strategy.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐ send    ┌────────────────────────────────────────────┐
//! │          │────────▶│ middleware ─▶ pre ─▶ post ─▶ exceptions ─▶ │──▶ RequestHandler
//! │ Mediator │         └────────────────────────────────────────────┘
//! │          │ publish ┌──────────────────────────┐
//! │          │────────▶│ PublishStrategy          │──▶ NotificationHandler × N
//! └──────────┘         └──────────────────────────┘
//!       ▲ resolves every component from a ServiceRegistry
//! ```
//!
//! - **core**: message contracts, pipeline stages, strategies, [`core::Mediator`]
//! - **runtime**: figment configuration and `tracing-subscriber` setup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use courier::prelude::*;
//!
//! struct UserCreated { id: u64 }
//! impl Notification for UserCreated {}
//!
//! struct SendWelcome;
//!
//! #[async_trait]
//! impl NotificationHandler<UserCreated> for SendWelcome {
//!     async fn handle(&self, event: &UserCreated, _cancel: &CancellationToken) -> MediatorResult<()> {
//!         tracing::info!(user = event.id, "welcome sent");
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().load()?;
//!     init_from_config(&config.logging);
//!
//!     let registry = Arc::new(Registry::new());
//!     registry.notification_handler::<UserCreated>(SendWelcome);
//!
//!     let mediator = config.mediator_builder().registry(registry).build()?;
//!     mediator.publish(UserCreated { id: 1 }, &CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `json-log`: JSON log output

pub use courier_core as core;
pub use courier_runtime as runtime;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use courier_core::prelude::*;

    pub use courier_core::{
        ByOrder, Comparer, Fallback, ParallelWhenAll, ParallelWhenAny, PipelineOptions,
        Sequentially, comparer_fn,
    };

    pub use courier_runtime::config::{ConfigLoader, CourierConfig};
    pub use courier_runtime::logging::{LoggingBuilder, SpanEvents, init_from_config};
}

//! # Courier Core
//!
//! The dispatch and pipeline-composition engine of the Courier mediator.
//!
//! A [`Mediator`] routes two kinds of messages:
//!
//! - **Requests** ([`Request`]) are answered by exactly one
//!   [`RequestHandler`], after passing through an ordered middleware pipeline.
//!   Commands ([`Command`]) are requests producing `()`.
//! - **Notifications** ([`Notification`]) are broadcast to every registered
//!   [`NotificationHandler`] according to a [`PublishStrategy`].
//!
//! Handlers, middleware, processors and exception handlers are resolved from a
//! [`ServiceRegistry`]; [`Registry`] is the in-memory implementation.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! - **Message contracts**: [`Request`], [`Command`], [`Notification`]
//! - **Fault hierarchy**: [`FaultKind`], [`Fault`]
//! - **Errors**: [`MediatorError`], [`MediatorResult`]
//! - **Ordering**: [`Comparer`], [`Fallback`]
//!
//! ### Framework Layer
//!
//! - **Handlers**: [`RequestHandler`], [`CommandHandler`], [`NotificationHandler`]
//! - **Pipeline**: [`Middleware`], [`Next`]
//! - **Built-in stages**: [`ExceptionHandlingMiddleware`],
//!   [`PreProcessingMiddleware`], [`PostProcessingMiddleware`]
//! - **Strategies**: [`ParallelWhenAll`], [`ParallelWhenAny`], [`Sequentially`]
//!
//! ### Integration Layer
//!
//! - **Registry boundary**: [`ServiceRegistry`], [`ServiceRegistryExt`], [`Registry`]
//! - **Wrapper cache**: [`WrapperCache`]
//!
//! ## Request Flow
//!
//! ```text
//! send(request)
//!   └─▶ RequestWrapper (cached per type)
//!         └─▶ contract middleware (last registered outermost)
//!               └─▶ pre-processing ─▶ post-processing ─▶ exception handling
//!                     └─▶ RequestHandler
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use courier_core::prelude::*;
//!
//! struct GetBalance {
//!     account: u64,
//! }
//!
//! impl Request for GetBalance {
//!     type Output = i64;
//! }
//!
//! struct GetBalanceHandler;
//!
//! #[async_trait]
//! impl RequestHandler<GetBalance> for GetBalanceHandler {
//!     async fn handle(&self, request: &GetBalance, _cancel: &CancellationToken) -> MediatorResult<i64> {
//!         Ok(request.account as i64 * 100)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> MediatorResult<()> {
//!     let registry = Arc::new(Registry::new());
//!     registry.request_handler::<GetBalance>(GetBalanceHandler);
//!
//!     let mediator = Mediator::new(registry);
//!     let balance = mediator
//!         .send(GetBalance { account: 7 }, &CancellationToken::new())
//!         .await?;
//!     assert_eq!(balance, 700);
//!     Ok(())
//! }
//! ```

// Architectural layers
pub mod foundation;
pub mod framework;
pub mod integration;
pub mod mediator;

// Re-export foundation types
pub use foundation::{
    Command, Comparer, ComparerFn, Fallback, Fault, FaultKind, MediatorError, MediatorResult,
    Notification, Request, comparer_fn, guard,
};

// Re-export framework types
pub use framework::{
    BoundHandler, ByOrder, CommandHandler, CommandHandlerAdapter, ExceptionContext,
    ExceptionHandler, ExceptionHandlingMiddleware, Middleware, Next, NotificationHandler,
    NotificationWrapper, ParallelWhenAll, ParallelWhenAny, PipelineOptions, PostProcessingMiddleware,
    PostProcessor, PostProcessorContext, PreProcessingMiddleware, PreProcessor, Publication,
    PublishStrategy, PublishStrategyKind, RequestHandler, RequestWrapper, Sequentially,
};

// Re-export integration types
pub use integration::{Registry, ServiceArc, ServiceRegistry, ServiceRegistryExt, WrapperCache};

pub use mediator::{Mediator, MediatorBuilder};

pub use async_trait::async_trait;
pub use futures::future::BoxFuture;
pub use tokio_util::sync::CancellationToken;

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::{
        Command, Fault, FaultKind, MediatorError, MediatorResult, Notification, Request,
    };
    pub use super::framework::{
        CommandHandler, ExceptionContext, ExceptionHandler, Middleware, Next, NotificationHandler,
        PostProcessor, PostProcessorContext, PreProcessor, PublishStrategy, PublishStrategyKind,
        RequestHandler,
    };
    pub use super::integration::{Registry, ServiceRegistry, ServiceRegistryExt};
    pub use super::mediator::{Mediator, MediatorBuilder};
    pub use super::{BoxFuture, CancellationToken, async_trait};
}

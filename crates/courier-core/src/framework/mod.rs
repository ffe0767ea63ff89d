//! Framework layer - handlers, pipeline stages and publish strategies.
//!
//! - [`handler`]: terminal handlers for requests, commands and notifications
//! - [`middleware`]: the [`Middleware`] trait and the [`Next`] continuation
//! - [`exception`]: recovery of pipeline failures by fault kind
//! - [`processing`]: pre- and post-processors and their middleware
//! - [`strategy`]: notification fan-out strategies
//! - [`dispatcher`]: per-type request and notification wrappers

pub mod dispatcher;
pub mod exception;
pub mod handler;
pub mod middleware;
pub mod processing;
pub mod strategy;

pub use dispatcher::{NotificationWrapper, PipelineOptions, RequestWrapper};
pub use exception::{ExceptionContext, ExceptionHandler, ExceptionHandlingMiddleware};
pub use handler::{CommandHandler, CommandHandlerAdapter, NotificationHandler, RequestHandler};
pub use middleware::{Middleware, Next};
pub use processing::{
    ByOrder, PostProcessingMiddleware, PostProcessor, PostProcessorContext,
    PreProcessingMiddleware, PreProcessor,
};
pub use strategy::{
    BoundHandler, ParallelWhenAll, ParallelWhenAny, Publication, PublishStrategy,
    PublishStrategyKind, Sequentially,
};

//! Per-type dispatch wrappers.
//!
//! The mediator keeps one wrapper per request type and one per notification
//! type. A wrapper is cheap and holds no services: handlers, middleware and
//! processors are resolved from the registry on every call, so services added
//! to a live registry are picked up by the next dispatch.
//!
//! Only the wrapper is cached. The middleware chain, including the sorted
//! exception-handler list, is resolved, ordered and built anew on every
//! `handle`; nothing about it is memoized between calls.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::foundation::error::{MediatorError, MediatorResult};
use crate::foundation::message::{Notification, Request, short_type_name};
use crate::foundation::ordering::{Comparer, Fallback, arrange};
use crate::framework::exception::{ExceptionHandler, ExceptionHandlingMiddleware};
use crate::framework::handler::{NotificationHandler, RequestHandler};
use crate::framework::middleware::{Middleware, Next};
use crate::framework::processing::{
    PostProcessingMiddleware, PostProcessor, PreProcessingMiddleware, PreProcessor,
};
use crate::framework::strategy::{Publication, PublishStrategy};
use crate::integration::registry::{ServiceRegistry, ServiceRegistryExt};

/// Which built-in middleware is composed into every request pipeline.
///
/// A built-in stage is only added when the registry holds at least one
/// exception handler or processor for the request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Compose [`ExceptionHandlingMiddleware`].
    pub exception_handling: bool,
    /// Compose [`PreProcessingMiddleware`].
    pub pre_processing: bool,
    /// Compose [`PostProcessingMiddleware`].
    pub post_processing: bool,
}

impl PipelineOptions {
    /// Every built-in stage enabled.
    pub const ALL: Self = Self {
        exception_handling: true,
        pre_processing: true,
        post_processing: true,
    };

    /// No built-in stage; only registered middleware runs.
    pub const NONE: Self = Self {
        exception_handling: false,
        pre_processing: false,
        post_processing: false,
    };
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::ALL
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Dispatches requests of type `R`.
///
/// Holds only the pipeline options; [`pipeline`](Self::pipeline) runs on each
/// call.
pub struct RequestWrapper<R: Request> {
    options: PipelineOptions,
    _request: PhantomData<fn() -> R>,
}

impl<R: Request> RequestWrapper<R> {
    /// Creates a wrapper composing the built-in stages selected by `options`.
    pub fn new(options: PipelineOptions) -> Self {
        debug!(request = short_type_name::<R>(), ?options, "Built request wrapper");
        Self {
            options,
            _request: PhantomData,
        }
    }

    /// Runs `request` through its pipeline.
    ///
    /// Fails fast with [`MediatorError::Cancelled`] before resolving anything,
    /// and with [`MediatorError::MissingService`] when no handler is
    /// registered for `R`.
    pub async fn handle(
        &self,
        request: &mut R,
        registry: &dyn ServiceRegistry,
        cancel: &CancellationToken,
    ) -> MediatorResult<R::Output> {
        if cancel.is_cancelled() {
            return Err(MediatorError::Cancelled);
        }

        let handler = registry.resolve_required::<dyn RequestHandler<R>>()?;
        let chain = self.pipeline(registry);
        trace!(
            request = short_type_name::<R>(),
            stages = ?chain.iter().map(|m| m.name()).collect::<Vec<_>>(),
            "Composed pipeline"
        );

        Next::new(&chain, handler.as_ref(), cancel).run(request).await
    }

    /// Resolves and orders the middleware for `R`, outermost first.
    ///
    /// Built-in stages are registered ahead of contract middleware in the
    /// order exception handling, post-processing, pre-processing. With a
    /// registered comparer the sorted order is used as is; without one the
    /// registration order is reversed, so later registrations wrap earlier
    /// ones.
    pub fn pipeline(&self, registry: &dyn ServiceRegistry) -> Vec<Arc<dyn Middleware<R>>> {
        let mut chain: Vec<Arc<dyn Middleware<R>>> = Vec::new();

        if self.options.exception_handling {
            let handlers = registry.resolve_many::<dyn ExceptionHandler<R>>();
            if !handlers.is_empty() {
                chain.push(Arc::new(ExceptionHandlingMiddleware::new(handlers)));
            }
        }

        if self.options.post_processing {
            let processors = registry.resolve_many::<dyn PostProcessor<R>>();
            if !processors.is_empty() {
                let comparer = registry.resolve::<dyn Comparer<dyn PostProcessor<R>>>();
                chain.push(Arc::new(PostProcessingMiddleware::new(
                    processors,
                    comparer.as_deref(),
                )));
            }
        }

        if self.options.pre_processing {
            let processors = registry.resolve_many::<dyn PreProcessor<R>>();
            if !processors.is_empty() {
                let comparer = registry.resolve::<dyn Comparer<dyn PreProcessor<R>>>();
                chain.push(Arc::new(PreProcessingMiddleware::new(
                    processors,
                    comparer.as_deref(),
                )));
            }
        }

        chain.extend(registry.resolve_many::<dyn Middleware<R>>());

        let comparer = registry.resolve::<dyn Comparer<dyn Middleware<R>>>();
        arrange(&mut chain, comparer.as_deref(), Fallback::Reversed);
        chain
    }
}

impl<R: Request> fmt::Debug for RequestWrapper<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestWrapper")
            .field("request", &short_type_name::<R>())
            .field("options", &self.options)
            .finish()
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// Dispatches notifications of type `N`.
pub struct NotificationWrapper<N: Notification> {
    _notification: PhantomData<fn() -> N>,
}

impl<N: Notification> NotificationWrapper<N> {
    /// Creates the wrapper.
    pub fn new() -> Self {
        debug!(notification = short_type_name::<N>(), "Built notification wrapper");
        Self {
            _notification: PhantomData,
        }
    }

    /// Publishes `notification` to every registered handler with `strategy`.
    pub async fn handle(
        &self,
        notification: N,
        strategy: &dyn PublishStrategy,
        registry: &dyn ServiceRegistry,
        cancel: &CancellationToken,
    ) -> MediatorResult<()> {
        if cancel.is_cancelled() {
            return Err(MediatorError::Cancelled);
        }

        let handlers = registry.resolve_many::<dyn NotificationHandler<N>>();
        trace!(
            notification = short_type_name::<N>(),
            handlers = handlers.len(),
            "Resolved notification handlers"
        );

        let publication = Publication::new(Arc::new(notification), handlers);
        strategy.publish(publication, cancel.clone()).await
    }
}

impl<N: Notification> Default for NotificationWrapper<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Notification> fmt::Debug for NotificationWrapper<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationWrapper")
            .field("notification", &short_type_name::<N>())
            .finish()
    }
}

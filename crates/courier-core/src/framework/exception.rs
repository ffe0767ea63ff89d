//! Exception handling inside the request pipeline.
//!
//! [`ExceptionHandlingMiddleware`] lets downstream failures be recovered by
//! registered [`ExceptionHandler`]s. Every handler declares the [`FaultKind`]
//! it understands; a handler matches a failure when the failure's kind is that
//! kind or one of its descendants.
//!
//! On failure the middleware walks from the failure's kind up to the root.
//! At each level it offers the failure to every matching handler that has not
//! been tried yet, narrowest declared kind first. The first handler that marks
//! the [`ExceptionContext`] as handled supplies the response. Each handler is
//! tried at most once per failure, however many levels it matches. If the walk
//! ends unhandled, the original error is returned unchanged.
//!
//! Cancellation is not a failure: [`MediatorError::Cancelled`] always passes
//! through untouched.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::foundation::error::{MediatorError, MediatorResult};
use crate::foundation::fault::FaultKind;
use crate::foundation::message::{Request, short_type_name};
use crate::foundation::ordering::by_specificity;
use crate::framework::middleware::{Middleware, Next};

/// Outcome slot shared by the exception handlers of one failure.
#[derive(Debug)]
pub struct ExceptionContext<T> {
    response: Option<T>,
}

impl<T> ExceptionContext<T> {
    /// Creates an unhandled context.
    pub fn new() -> Self {
        Self { response: None }
    }

    /// Marks the failure handled, replacing it with `response`.
    pub fn handled(&mut self, response: T) {
        self.response = Some(response);
    }

    /// Returns `true` once a handler has supplied a response.
    pub fn is_handled(&self) -> bool {
        self.response.is_some()
    }

    /// Returns the supplied response, if any.
    pub fn response(&self) -> Option<&T> {
        self.response.as_ref()
    }

    fn take(&mut self) -> Option<T> {
        self.response.take()
    }
}

impl ExceptionContext<()> {
    /// Marks a command failure handled.
    pub fn mark_handled(&mut self) {
        self.handled(());
    }
}

impl<T> Default for ExceptionContext<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Recovers failures of request `R`.
///
/// Handlers that leave the context unhandled let the failure continue to the
/// next candidate. Returning an error aborts recovery and propagates that
/// error instead.
#[async_trait]
pub trait ExceptionHandler<R: Request>: Send + Sync {
    /// The kind of failure this handler understands. Defaults to the root kind,
    /// which matches every failure.
    fn fault_kind(&self) -> FaultKind {
        FaultKind::ROOT
    }

    /// Inspects `error` and optionally marks `context` handled.
    async fn handle(
        &self,
        request: &R,
        error: &MediatorError,
        context: &mut ExceptionContext<R::Output>,
        cancel: &CancellationToken,
    ) -> MediatorResult<()>;
}

/// Middleware that offers downstream failures to [`ExceptionHandler`]s.
pub struct ExceptionHandlingMiddleware<R: Request> {
    handlers: Vec<Arc<dyn ExceptionHandler<R>>>,
}

impl<R: Request> ExceptionHandlingMiddleware<R> {
    /// Creates the middleware, ordering `handlers` narrowest kind first.
    pub fn new(handlers: impl IntoIterator<Item = Arc<dyn ExceptionHandler<R>>>) -> Self {
        Self {
            handlers: by_specificity(handlers, |handler| handler.fault_kind()),
        }
    }

    /// Returns the number of handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    async fn recover(
        &self,
        request: &R,
        error: MediatorError,
        cancel: &CancellationToken,
    ) -> MediatorResult<R::Output> {
        let mut context = ExceptionContext::new();
        let mut attempted = vec![false; self.handlers.len()];
        let mut level = Some(error.kind());

        while let Some(kind) = level {
            for (index, handler) in self.handlers.iter().enumerate() {
                if attempted[index] || !kind.is_a(handler.fault_kind()) {
                    continue;
                }
                attempted[index] = true;

                trace!(level = %kind, declared = %handler.fault_kind(), "Offering failure to exception handler");
                handler.handle(request, &error, &mut context, cancel).await?;

                if let Some(response) = context.take() {
                    debug!(
                        request = short_type_name::<R>(),
                        fault = %error.kind(),
                        handled_at = %kind,
                        "Failure recovered by exception handler"
                    );
                    return Ok(response);
                }
            }
            level = kind.parent();
        }

        Err(error)
    }
}

#[async_trait]
impl<R: Request> Middleware<R> for ExceptionHandlingMiddleware<R> {
    fn name(&self) -> &'static str {
        "ExceptionHandlingMiddleware"
    }

    async fn execute(
        &self,
        request: &mut R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> MediatorResult<R::Output> {
        match next.run(request).await {
            Ok(response) => Ok(response),
            Err(error) if error.is_cancelled() || self.handlers.is_empty() => Err(error),
            Err(error) => self.recover(request, error, cancel).await,
        }
    }
}

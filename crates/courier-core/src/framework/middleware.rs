//! Pipeline middleware and the continuation that links it.
//!
//! A request pipeline is a slice of middleware ending in the terminal handler.
//! Index 0 is the outermost stage. Each stage receives a [`Next`] that runs the
//! rest of the slice; a stage that never calls it short-circuits the pipeline.
//!
//! ```text
//! send(request)
//!   └─▶ middleware[0] ──next──▶ middleware[1] ──next──▶ … ──▶ handler
//!       ◀─────────────── result / error propagates back ───────┘
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::foundation::error::{MediatorError, MediatorResult};
use crate::foundation::message::{Request, short_type_name};
use crate::framework::handler::RequestHandler;

/// A pipeline stage registered for request `R`.
///
/// ```rust,ignore
/// struct Audit;
///
/// #[async_trait]
/// impl Middleware<Transfer> for Audit {
///     async fn execute(
///         &self,
///         request: &mut Transfer,
///         next: Next<'_, Transfer>,
///         _cancel: &CancellationToken,
///     ) -> MediatorResult<Receipt> {
///         info!(amount = request.amount, "transfer requested");
///         next.run(request).await
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware<R: Request>: Send + Sync {
    /// Name used in logs and by comparers.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Runs this stage. Call `next.run(request)` to continue the pipeline.
    async fn execute(
        &self,
        request: &mut R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> MediatorResult<R::Output>;
}

/// The remainder of a pipeline.
pub struct Next<'a, R: Request> {
    chain: &'a [Arc<dyn Middleware<R>>],
    handler: &'a dyn RequestHandler<R>,
    cancel: &'a CancellationToken,
}

impl<'a, R: Request> Next<'a, R> {
    /// Creates a continuation over `chain`, ending in `handler`.
    pub fn new(
        chain: &'a [Arc<dyn Middleware<R>>],
        handler: &'a dyn RequestHandler<R>,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            chain,
            handler,
            cancel,
        }
    }

    /// Number of middleware stages left before the terminal handler.
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }

    /// Runs the remaining stages against `request`.
    ///
    /// Fails with [`MediatorError::Cancelled`] if cancellation was requested
    /// before the next stage starts.
    pub fn run<'r>(self, request: &'r mut R) -> BoxFuture<'r, MediatorResult<R::Output>>
    where
        'a: 'r,
    {
        Box::pin(async move {
            if self.cancel.is_cancelled() {
                return Err(MediatorError::Cancelled);
            }

            match self.chain.split_first() {
                Some((middleware, rest)) => {
                    trace!(stage = middleware.name(), remaining = rest.len(), "Entering middleware");
                    let next = Next::new(rest, self.handler, self.cancel);
                    middleware.execute(request, next, self.cancel).await
                }
                None => {
                    trace!("Invoking terminal handler");
                    self.handler.handle(request, self.cancel).await
                }
            }
        })
    }
}

impl<R: Request> fmt::Debug for Next<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field(
                "chain",
                &self.chain.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

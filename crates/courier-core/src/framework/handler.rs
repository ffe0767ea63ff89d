//! Terminal handlers for requests, commands and notifications.
//!
//! A request type has exactly one [`RequestHandler`]; a notification type may
//! have any number of [`NotificationHandler`]s. Command handlers are adapted
//! into request handlers producing `()` so both share one dispatch path.

use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::foundation::error::MediatorResult;
use crate::foundation::message::{Command, Notification, Request, short_type_name};

/// Produces the response for request `R`.
///
/// ```rust,ignore
/// struct GetBalanceHandler;
///
/// #[async_trait]
/// impl RequestHandler<GetBalance> for GetBalanceHandler {
///     async fn handle(&self, request: &GetBalance, _cancel: &CancellationToken) -> MediatorResult<i64> {
///         Ok(lookup(request.account))
///     }
/// }
/// ```
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    /// Handles `request`.
    async fn handle(&self, request: &R, cancel: &CancellationToken) -> MediatorResult<R::Output>;
}

/// Handles command `C`, which produces no value.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    /// Handles `command`.
    async fn handle(&self, command: &C, cancel: &CancellationToken) -> MediatorResult<()>;
}

/// Handles notification `N`.
#[async_trait]
pub trait NotificationHandler<N: Notification>: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Reacts to `notification`.
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> MediatorResult<()>;
}

/// Exposes a [`CommandHandler`] as a [`RequestHandler`] producing `()`.
pub struct CommandHandlerAdapter<H> {
    inner: H,
}

impl<H> CommandHandlerAdapter<H> {
    /// Wraps `inner`.
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    /// Returns the wrapped command handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<C, H> RequestHandler<C> for CommandHandlerAdapter<H>
where
    C: Command,
    H: CommandHandler<C>,
{
    async fn handle(&self, request: &C, cancel: &CancellationToken) -> MediatorResult<()> {
        self.inner.handle(request, cancel).await
    }
}

impl<H> fmt::Debug for CommandHandlerAdapter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandlerAdapter")
            .field("inner", &std::any::type_name::<H>())
            .finish()
    }
}

//! The mediator facade.
//!
//! [`Mediator`] is the single entry point for sending requests and publishing
//! notifications. It owns two wrapper caches, one per message kind, a shared
//! handle to the [`ServiceRegistry`] and the default [`PublishStrategy`].
//!
//! ```rust,ignore
//! let registry = Arc::new(Registry::new());
//! registry
//!     .request_handler::<GetBalance>(GetBalanceHandler)
//!     .notification_handler::<Deposited>(Mailer);
//!
//! let mediator = Mediator::builder()
//!     .registry(registry)
//!     .publish_strategy_kind(PublishStrategyKind::Sequentially)
//!     .build()?;
//!
//! let cancel = CancellationToken::new();
//! let balance = mediator.send(GetBalance { account: 7 }, &cancel).await?;
//! mediator.publish(Deposited { account: 7, amount: 100 }, &cancel).await?;
//! ```

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug_span};

use crate::foundation::error::{MediatorError, MediatorResult, guard};
use crate::foundation::message::{Notification, Request, short_type_name};
use crate::framework::dispatcher::{NotificationWrapper, PipelineOptions, RequestWrapper};
use crate::framework::strategy::{self, ParallelWhenAll, PublishStrategy, PublishStrategyKind};
use crate::integration::cache::WrapperCache;
use crate::integration::registry::ServiceRegistry;

/// Routes requests and notifications to their handlers.
///
/// `Mediator` is `Send + Sync`; share it behind an `Arc`.
pub struct Mediator {
    registry: Arc<dyn ServiceRegistry>,
    options: PipelineOptions,
    default_strategy: Arc<dyn PublishStrategy>,
    requests: WrapperCache,
    notifications: WrapperCache,
}

impl Mediator {
    /// Creates a mediator with every built-in stage enabled and
    /// [`ParallelWhenAll`] as the default strategy.
    pub fn new(registry: Arc<dyn ServiceRegistry>) -> Self {
        Self {
            registry,
            options: PipelineOptions::default(),
            default_strategy: Arc::new(ParallelWhenAll),
            requests: WrapperCache::new(),
            notifications: WrapperCache::new(),
        }
    }

    /// Starts building a mediator.
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::default()
    }

    /// The registry services are resolved from.
    pub fn registry(&self) -> &Arc<dyn ServiceRegistry> {
        &self.registry
    }

    /// The built-in stages composed into request pipelines.
    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// The strategy used by [`publish`](Self::publish).
    pub fn default_strategy(&self) -> &dyn PublishStrategy {
        self.default_strategy.as_ref()
    }

    /// Sends `request` to its handler through the request pipeline.
    pub async fn send<R: Request>(
        &self,
        request: R,
        cancel: &CancellationToken,
    ) -> MediatorResult<R::Output> {
        let span = debug_span!("send", request = short_type_name::<R>());
        async move {
            if cancel.is_cancelled() {
                return Err(MediatorError::Cancelled);
            }

            let options = self.options;
            let wrapper = self.requests.get_or_add(|| RequestWrapper::<R>::new(options));
            let mut request = request;
            wrapper
                .handle(&mut request, self.registry.as_ref(), cancel)
                .await
        }
        .instrument(span)
        .await
    }

    /// Publishes `notification` with the default strategy.
    pub async fn publish<N: Notification>(
        &self,
        notification: N,
        cancel: &CancellationToken,
    ) -> MediatorResult<()> {
        self.publish_with(notification, self.default_strategy.as_ref(), cancel)
            .await
    }

    /// Publishes `notification` with `strategy`.
    pub async fn publish_with<N: Notification>(
        &self,
        notification: N,
        strategy: &dyn PublishStrategy,
        cancel: &CancellationToken,
    ) -> MediatorResult<()> {
        let span = debug_span!(
            "publish",
            notification = short_type_name::<N>(),
            strategy = strategy.name()
        );
        async move {
            if cancel.is_cancelled() {
                return Err(MediatorError::Cancelled);
            }

            let wrapper = self.notifications.get_or_add(NotificationWrapper::<N>::new);
            wrapper
                .handle(notification, strategy, self.registry.as_ref(), cancel)
                .await
        }
        .instrument(span)
        .await
    }

    /// Publishes `notification` with the built-in strategy called `strategy`.
    ///
    /// Unknown names fail with [`MediatorError::InvalidArgument`] naming
    /// `publish_strategy`, before cancellation is checked.
    pub async fn publish_by_name<N: Notification>(
        &self,
        notification: N,
        strategy: &str,
        cancel: &CancellationToken,
    ) -> MediatorResult<()> {
        let strategy = strategy::from_name(strategy)?;
        self.publish_with(notification, strategy.as_ref(), cancel)
            .await
    }

    /// Number of request types with a cached wrapper.
    pub fn cached_request_types(&self) -> usize {
        self.requests.len()
    }

    /// Number of notification types with a cached wrapper.
    pub fn cached_notification_types(&self) -> usize {
        self.notifications.len()
    }

    /// Drops every cached wrapper. They are rebuilt on next use.
    pub fn clear_cache(&self) {
        self.requests.clear();
        self.notifications.clear();
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("options", &self.options)
            .field("default_strategy", &self.default_strategy.name())
            .field("requests", &self.requests)
            .field("notifications", &self.notifications)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// MediatorBuilder
// =============================================================================

/// Builder for [`Mediator`].
#[derive(Default)]
pub struct MediatorBuilder {
    registry: Option<Arc<dyn ServiceRegistry>>,
    options: PipelineOptions,
    strategy: Option<Arc<dyn PublishStrategy>>,
}

impl MediatorBuilder {
    /// Sets the registry. Required.
    pub fn registry(mut self, registry: Arc<dyn ServiceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replaces every pipeline toggle at once.
    pub fn pipeline(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Toggles the exception-handling stage.
    pub fn with_exception_handling(mut self, enabled: bool) -> Self {
        self.options.exception_handling = enabled;
        self
    }

    /// Toggles the pre-processing stage.
    pub fn with_pre_processing(mut self, enabled: bool) -> Self {
        self.options.pre_processing = enabled;
        self
    }

    /// Toggles the post-processing stage.
    pub fn with_post_processing(mut self, enabled: bool) -> Self {
        self.options.post_processing = enabled;
        self
    }

    /// Toggles all built-in stages.
    pub fn with_core_middleware(self, enabled: bool) -> Self {
        self.pipeline(if enabled {
            PipelineOptions::ALL
        } else {
            PipelineOptions::NONE
        })
    }

    /// Sets the default publish strategy.
    pub fn publish_strategy(mut self, strategy: Arc<dyn PublishStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Sets the default publish strategy to a built-in one.
    pub fn publish_strategy_kind(self, kind: PublishStrategyKind) -> Self {
        self.publish_strategy(kind.strategy())
    }

    /// Builds the mediator.
    ///
    /// Fails with [`MediatorError::InvalidArgument`] naming `registry` when no
    /// registry was set.
    pub fn build(self) -> MediatorResult<Mediator> {
        let registry = guard::not_null(self.registry, "registry")?;
        let mut mediator = Mediator::new(registry);
        mediator.options = self.options;
        if let Some(strategy) = self.strategy {
            mediator.default_strategy = strategy;
        }
        Ok(mediator)
    }
}

impl fmt::Debug for MediatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediatorBuilder")
            .field("has_registry", &self.registry.is_some())
            .field("options", &self.options)
            .field("strategy", &self.strategy.as_ref().map(|s| s.name().to_owned()))
            .finish()
    }
}

//! Notification publish strategies.
//!
//! A [`PublishStrategy`] decides how the handlers of one notification run.
//! Three are built in:
//!
//! | Strategy            | Handlers run   | Completes when                          |
//! |---------------------|----------------|-----------------------------------------|
//! | [`ParallelWhenAll`] | concurrently   | all finish, or cancellation fires       |
//! | [`ParallelWhenAny`] | concurrently   | the first one finishes                  |
//! | [`Sequentially`]    | one at a time  | all finish; stops launching on cancel   |
//!
//! Parallel strategies spawn each handler as a tokio task. Returning early
//! never aborts those tasks; they run to completion in the background.
//!
//! Custom strategies implement [`PublishStrategy`] and receive a
//! [`Publication`]: the notification plus its handlers, already bound to it.

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all, select_all};
use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::foundation::error::{MediatorError, MediatorResult};
use crate::foundation::message::{Notification, short_type_name};
use crate::framework::handler::NotificationHandler;

type Invocation = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, MediatorResult<()>> + Send>;

/// A notification handler bound to the notification it will receive.
pub struct BoundHandler {
    name: &'static str,
    invoke: Invocation,
}

impl BoundHandler {
    /// Binds `handler` to `notification`.
    pub fn new<N: Notification>(notification: Arc<N>, handler: Arc<dyn NotificationHandler<N>>) -> Self {
        Self {
            name: handler.name(),
            invoke: Box::new(move |cancel| {
                async move { handler.handle(&notification, &cancel).await }.boxed()
            }),
        }
    }

    /// The handler's name, for logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Runs the handler.
    pub fn invoke(self, cancel: CancellationToken) -> BoxFuture<'static, MediatorResult<()>> {
        (self.invoke)(cancel)
    }

    /// Runs the handler on its own task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<MediatorResult<()>> {
        trace!(handler = self.name, "Spawning notification handler");
        tokio::spawn(self.invoke(cancel))
    }
}

impl fmt::Debug for BoundHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundHandler")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// One notification and the handlers that will receive it.
pub struct Publication {
    notification_type: &'static str,
    notification: Arc<dyn Any + Send + Sync>,
    handlers: Vec<BoundHandler>,
}

impl Publication {
    /// Binds each of `handlers` to `notification`.
    pub fn new<N: Notification>(
        notification: Arc<N>,
        handlers: impl IntoIterator<Item = Arc<dyn NotificationHandler<N>>>,
    ) -> Self {
        let handlers = handlers
            .into_iter()
            .map(|handler| BoundHandler::new(Arc::clone(&notification), handler))
            .collect();
        Self {
            notification_type: short_type_name::<N>(),
            notification,
            handlers,
        }
    }

    /// Short type name of the notification.
    pub fn notification_type(&self) -> &'static str {
        self.notification_type
    }

    /// The notification, if it is an `N`.
    pub fn downcast_ref<N: Notification>(&self) -> Option<&N> {
        self.notification.downcast_ref::<N>()
    }

    /// The bound handlers, in resolved order.
    pub fn handlers(&self) -> &[BoundHandler] {
        &self.handlers
    }

    /// Number of bound handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when nobody listens.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Takes the bound handlers.
    pub fn into_handlers(self) -> Vec<BoundHandler> {
        self.handlers
    }
}

impl fmt::Debug for Publication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publication")
            .field("notification_type", &self.notification_type)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

/// Fans a [`Publication`] out to its handlers.
pub trait PublishStrategy: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Runs the handlers of `publication`.
    fn publish(
        &self,
        publication: Publication,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, MediatorResult<()>>;
}

/// Runs every handler concurrently and waits for all of them.
///
/// Cancellation races the handlers: if it fires first the publish reports
/// [`MediatorError::Cancelled`] while the handlers keep running. Otherwise the
/// first handler error, in resolved order, is returned.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParallelWhenAll;

impl PublishStrategy for ParallelWhenAll {
    fn name(&self) -> &str {
        PublishStrategyKind::ParallelWhenAll.as_str()
    }

    fn publish(
        &self,
        publication: Publication,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, MediatorResult<()>> {
        Box::pin(async move {
            let tasks: Vec<_> = publication
                .into_handlers()
                .into_iter()
                .map(|handler| handler.spawn(cancel.clone()))
                .collect();

            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(MediatorError::Cancelled),
                results = join_all(tasks) => results
                    .into_iter()
                    .map(join_outcome)
                    .fold(Ok(()), |first, outcome| first.and(outcome)),
            }
        })
    }
}

/// Runs every handler concurrently and returns when the first finishes.
///
/// The outcome is that of the first handler to finish. An empty publication
/// completes immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParallelWhenAny;

impl PublishStrategy for ParallelWhenAny {
    fn name(&self) -> &str {
        PublishStrategyKind::ParallelWhenAny.as_str()
    }

    fn publish(
        &self,
        publication: Publication,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, MediatorResult<()>> {
        Box::pin(async move {
            if publication.is_empty() {
                return Ok(());
            }

            let tasks: Vec<_> = publication
                .into_handlers()
                .into_iter()
                .map(|handler| handler.spawn(cancel.clone()))
                .collect();

            let (first, _, rest) = select_all(tasks).await;
            trace!(still_running = rest.len(), "First notification handler finished");
            join_outcome(first)
        })
    }
}

/// Runs handlers one after another in resolved order.
///
/// Cancellation is checked before each handler; the first error stops the
/// remaining handlers from starting.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sequentially;

impl PublishStrategy for Sequentially {
    fn name(&self) -> &str {
        PublishStrategyKind::Sequentially.as_str()
    }

    fn publish(
        &self,
        publication: Publication,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, MediatorResult<()>> {
        Box::pin(async move {
            for handler in publication.into_handlers() {
                if cancel.is_cancelled() {
                    return Err(MediatorError::Cancelled);
                }
                trace!(handler = handler.name(), "Running notification handler");
                handler.invoke(cancel.clone()).await?;
            }
            Ok(())
        })
    }
}

fn join_outcome(joined: Result<MediatorResult<()>, JoinError>) -> MediatorResult<()> {
    match joined {
        Ok(outcome) => outcome,
        Err(err) if err.is_panic() => {
            let payload = err.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_owned());
            warn!(%message, "Notification handler panicked");
            Err(MediatorError::Panicked { message })
        }
        Err(_) => Err(MediatorError::Cancelled),
    }
}

// =============================================================================
// Selection by name
// =============================================================================

/// The built-in strategies, selectable by name.
///
/// Names parse case-insensitively with or without separators, so
/// `parallel_when_any`, `ParallelWhenAny` and `parallel-when-any` are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStrategyKind {
    /// See [`ParallelWhenAll`].
    #[default]
    #[serde(alias = "ParallelWhenAll")]
    ParallelWhenAll,
    /// See [`ParallelWhenAny`].
    #[serde(alias = "ParallelWhenAny")]
    ParallelWhenAny,
    /// See [`Sequentially`].
    #[serde(alias = "Sequentially")]
    Sequentially,
}

impl PublishStrategyKind {
    /// Every built-in strategy.
    pub const ALL: [PublishStrategyKind; 3] = [
        PublishStrategyKind::ParallelWhenAll,
        PublishStrategyKind::ParallelWhenAny,
        PublishStrategyKind::Sequentially,
    ];

    /// The canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParallelWhenAll => "parallel_when_all",
            Self::ParallelWhenAny => "parallel_when_any",
            Self::Sequentially => "sequentially",
        }
    }

    /// Instantiates the strategy.
    pub fn strategy(&self) -> Arc<dyn PublishStrategy> {
        match self {
            Self::ParallelWhenAll => Arc::new(ParallelWhenAll),
            Self::ParallelWhenAny => Arc::new(ParallelWhenAny),
            Self::Sequentially => Arc::new(Sequentially),
        }
    }
}

impl fmt::Display for PublishStrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublishStrategyKind {
    type Err = MediatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "parallelwhenall" => Ok(Self::ParallelWhenAll),
            "parallelwhenany" => Ok(Self::ParallelWhenAny),
            "sequentially" => Ok(Self::Sequentially),
            _ => Err(MediatorError::invalid_argument(
                "publish_strategy",
                format!("unknown publish strategy '{s}'"),
            )),
        }
    }
}

/// Resolves a built-in strategy by name.
///
/// Unknown names fail with [`MediatorError::InvalidArgument`] whose `name` is
/// `publish_strategy`. Callers matching on the camelCase `publishStrategy`
/// will not see it; the argument name is always the snake_case form.
pub fn from_name(name: &str) -> MediatorResult<Arc<dyn PublishStrategy>> {
    name.parse::<PublishStrategyKind>().map(|kind| kind.strategy())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::foundation::fault::Fault;

    struct Tick;

    impl Notification for Tick {}

    struct Delayed {
        delay: Duration,
        done: Arc<AtomicBool>,
    }

    impl Delayed {
        fn new(millis: u64) -> (Arc<dyn NotificationHandler<Tick>>, Arc<AtomicBool>) {
            let done = Arc::new(AtomicBool::new(false));
            let handler: Arc<dyn NotificationHandler<Tick>> = Arc::new(Self {
                delay: Duration::from_millis(millis),
                done: Arc::clone(&done),
            });
            (handler, done)
        }
    }

    #[async_trait]
    impl NotificationHandler<Tick> for Delayed {
        async fn handle(&self, _notification: &Tick, _cancel: &CancellationToken) -> MediatorResult<()> {
            tokio::time::sleep(self.delay).await;
            self.done.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl NotificationHandler<Tick> for Failing {
        async fn handle(&self, _notification: &Tick, _cancel: &CancellationToken) -> MediatorResult<()> {
            Err(Fault::msg("listener failed").into())
        }
    }

    struct Panicking;

    #[async_trait]
    impl NotificationHandler<Tick> for Panicking {
        async fn handle(&self, _notification: &Tick, _cancel: &CancellationToken) -> MediatorResult<()> {
            panic!("listener exploded");
        }
    }

    struct Recording {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        cancel_after: Option<CancellationToken>,
    }

    #[async_trait]
    impl NotificationHandler<Tick> for Recording {
        async fn handle(&self, _notification: &Tick, _cancel: &CancellationToken) -> MediatorResult<()> {
            self.log.lock().push(self.label);
            if let Some(token) = &self.cancel_after {
                token.cancel();
            }
            Ok(())
        }
    }

    fn publication(handlers: Vec<Arc<dyn NotificationHandler<Tick>>>) -> Publication {
        Publication::new(Arc::new(Tick), handlers)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_when_all_waits_for_every_handler() {
        let (fast, fast_done) = Delayed::new(5);
        let (slow, slow_done) = Delayed::new(55);

        ParallelWhenAll
            .publish(publication(vec![fast, slow]), CancellationToken::new())
            .await
            .unwrap();

        assert!(fast_done.load(Ordering::SeqCst));
        assert!(slow_done.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_when_any_returns_after_first() {
        let (fast, fast_done) = Delayed::new(5);
        let (slow, slow_done) = Delayed::new(55);

        ParallelWhenAny
            .publish(publication(vec![slow, fast]), CancellationToken::new())
            .await
            .unwrap();

        assert!(fast_done.load(Ordering::SeqCst));
        assert!(!slow_done.load(Ordering::SeqCst));

        // The slow handler keeps running in the background.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(slow_done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_when_any_empty_completes() {
        ParallelWhenAny
            .publish(publication(Vec::new()), CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_when_all_reports_cancellation() {
        let (slow, slow_done) = Delayed::new(80);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let result = ParallelWhenAll.publish(publication(vec![slow]), cancel).await;

        assert!(matches!(result, Err(MediatorError::Cancelled)));
        assert!(!slow_done.load(Ordering::SeqCst));

        // Cancellation stops the wait, not the handler already started.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(slow_done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_when_all_surfaces_handler_error() {
        let (ok, ok_done) = Delayed::new(1);
        let result = ParallelWhenAll
            .publish(publication(vec![ok, Arc::new(Failing)]), CancellationToken::new())
            .await;

        assert_eq!(result.unwrap_err().to_string(), "error: listener failed");
        assert!(ok_done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_when_all_maps_panic() {
        let result = ParallelWhenAll
            .publish(publication(vec![Arc::new(Panicking)]), CancellationToken::new())
            .await;

        match result {
            Err(MediatorError::Panicked { message }) => assert_eq!(message, "listener exploded"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sequential_runs_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handlers: Vec<Arc<dyn NotificationHandler<Tick>>> = ["first", "second", "third"]
            .into_iter()
            .map(|label| {
                Arc::new(Recording {
                    label,
                    log: Arc::clone(&log),
                    cancel_after: None,
                }) as Arc<dyn NotificationHandler<Tick>>
            })
            .collect();

        Sequentially
            .publish(publication(handlers), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_sequential_stops_after_cancellation() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let cancel = CancellationToken::new();
        let handlers: Vec<Arc<dyn NotificationHandler<Tick>>> = vec![
            Arc::new(Recording {
                label: "first",
                log: Arc::clone(&log),
                cancel_after: Some(cancel.clone()),
            }),
            Arc::new(Recording {
                label: "second",
                log: Arc::clone(&log),
                cancel_after: None,
            }),
        ];

        let result = Sequentially.publish(publication(handlers), cancel).await;

        assert!(matches!(result, Err(MediatorError::Cancelled)));
        assert_eq!(*log.lock(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_sequential_stops_at_first_error() {
        let calls = Arc::new(AtomicUsize::new(0));

        struct Counting(Arc<AtomicUsize>);

        #[async_trait]
        impl NotificationHandler<Tick> for Counting {
            async fn handle(&self, _notification: &Tick, _cancel: &CancellationToken) -> MediatorResult<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let handlers: Vec<Arc<dyn NotificationHandler<Tick>>> =
            vec![Arc::new(Failing), Arc::new(Counting(Arc::clone(&calls)))];
        let result = Sequentially.publish(publication(handlers), CancellationToken::new()).await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_parse_names() {
        for (name, expected) in [
            ("parallel_when_all", PublishStrategyKind::ParallelWhenAll),
            ("ParallelWhenAny", PublishStrategyKind::ParallelWhenAny),
            ("parallel-when-any", PublishStrategyKind::ParallelWhenAny),
            (" Sequentially ", PublishStrategyKind::Sequentially),
        ] {
            assert_eq!(name.parse::<PublishStrategyKind>().unwrap(), expected);
        }
    }

    #[test]
    fn test_unknown_name_is_invalid_argument() {
        let err = from_name("round_robin").err().unwrap();
        assert!(matches!(
            err,
            MediatorError::InvalidArgument { name: "publish_strategy", .. }
        ));
    }

    #[test]
    fn test_strategy_names_round_trip() {
        for kind in PublishStrategyKind::ALL {
            assert_eq!(kind.strategy().name(), kind.as_str());
            assert_eq!(kind.to_string().parse::<PublishStrategyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_publication_exposes_notification() {
        let publication = publication(vec![Arc::new(Failing)]);
        assert_eq!(publication.notification_type(), "Tick");
        assert!(publication.downcast_ref::<Tick>().is_some());
        assert_eq!(publication.handlers()[0].name(), "Failing");
    }
}

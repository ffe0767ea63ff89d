//! The service registry boundary.
//!
//! The engine resolves handlers, middleware, processors and comparers through
//! [`ServiceRegistry`]. A contract is identified by the `TypeId` of its trait
//! object type, e.g. `dyn RequestHandler<GetBalance>`. Each registered value is
//! stored as an `Arc<dyn Any>` wrapping an `Arc<dyn Contract>`; consumers
//! downcast it back through [`ServiceRegistryExt`].
//!
//! [`Registry`] is the in-memory implementation. Any dependency-injection
//! container can stand in for it by implementing the two erased lookups.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::foundation::error::{MediatorError, MediatorResult};
use crate::foundation::message::{Command, Notification, Request};
use crate::foundation::ordering::Comparer;
use crate::framework::exception::ExceptionHandler;
use crate::framework::handler::{CommandHandler, CommandHandlerAdapter, NotificationHandler, RequestHandler};
use crate::framework::middleware::Middleware;
use crate::framework::processing::{PostProcessor, PreProcessor};

/// Type alias for the heterogeneous values stored in a registry.
///
/// The inner `dyn Any` is an `Arc<dyn Contract>` upcast to `Any`.
pub type ServiceArc = Arc<dyn Any + Send + Sync>;

/// Resolves services by contract.
///
/// Implementations must be safe for concurrent lookups. Absence is never an
/// error at this level.
pub trait ServiceRegistry: Send + Sync {
    /// Returns the single service registered for `contract`.
    ///
    /// When several are registered, the most recent registration wins.
    fn resolve_erased(&self, contract: TypeId) -> Option<ServiceArc>;

    /// Returns every service registered for `contract`, in registration order.
    fn resolve_all_erased(&self, contract: TypeId) -> Option<Vec<ServiceArc>>;
}

/// Typed lookups on top of [`ServiceRegistry`].
pub trait ServiceRegistryExt: ServiceRegistry {
    /// Resolves the service registered for contract `T`, if any.
    fn resolve<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.resolve_erased(TypeId::of::<T>())
            .and_then(|service| service.downcast_ref::<Arc<T>>().map(Arc::clone))
    }

    /// Resolves every service registered for contract `T`, in registration
    /// order. Returns an empty list when none are registered.
    fn resolve_many<T: ?Sized + 'static>(&self) -> Vec<Arc<T>> {
        self.resolve_all_erased(TypeId::of::<T>())
            .unwrap_or_default()
            .iter()
            .filter_map(|service| service.downcast_ref::<Arc<T>>().map(Arc::clone))
            .collect()
    }

    /// Resolves the service for contract `T`, failing with
    /// [`MediatorError::MissingService`] naming the contract.
    fn resolve_required<T: ?Sized + 'static>(&self) -> MediatorResult<Arc<T>> {
        self.resolve::<T>()
            .ok_or_else(MediatorError::missing_service::<T>)
    }
}

impl<S: ServiceRegistry + ?Sized> ServiceRegistryExt for S {}

// =============================================================================
// In-memory registry
// =============================================================================

/// In-memory [`ServiceRegistry`].
///
/// Registration takes `&self`, so a registry shared with a running
/// [`Mediator`](crate::Mediator) can still gain services; later dispatches
/// observe them.
///
/// # Example
///
/// ```rust,ignore
/// let registry = Registry::new();
/// registry
///     .request_handler::<GetBalance>(GetBalanceHandler)
///     .middleware::<GetBalance>(AuditMiddleware)
///     .notification_handler::<Deposited>(Mailer);
/// let mediator = Mediator::new(Arc::new(registry));
/// ```
#[derive(Default)]
pub struct Registry {
    services: RwLock<HashMap<TypeId, Vec<ServiceArc>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `service` under contract `T`.
    pub fn add<T: ?Sized + Send + Sync + 'static>(&self, service: Arc<T>) -> &Self {
        trace!(contract = std::any::type_name::<T>(), "Registered service");
        let erased: ServiceArc = Arc::new(service);
        self.services
            .write()
            .entry(TypeId::of::<T>())
            .or_default()
            .push(erased);
        self
    }

    /// Registers the terminal handler for request `R`.
    pub fn request_handler<R: Request>(&self, handler: impl RequestHandler<R> + 'static) -> &Self {
        self.add::<dyn RequestHandler<R>>(Arc::new(handler))
    }

    /// Registers the terminal handler for command `C`.
    pub fn command_handler<C: Command>(&self, handler: impl CommandHandler<C> + 'static) -> &Self {
        self.add::<dyn RequestHandler<C>>(Arc::new(CommandHandlerAdapter::new(handler)))
    }

    /// Adds a handler for notification `N`.
    pub fn notification_handler<N: Notification>(
        &self,
        handler: impl NotificationHandler<N> + 'static,
    ) -> &Self {
        self.add::<dyn NotificationHandler<N>>(Arc::new(handler))
    }

    /// Adds a middleware for request `R`.
    pub fn middleware<R: Request>(&self, middleware: impl Middleware<R> + 'static) -> &Self {
        self.add::<dyn Middleware<R>>(Arc::new(middleware))
    }

    /// Adds a pre-processor for request `R`.
    pub fn pre_processor<R: Request>(&self, processor: impl PreProcessor<R> + 'static) -> &Self {
        self.add::<dyn PreProcessor<R>>(Arc::new(processor))
    }

    /// Adds a post-processor for request `R`.
    pub fn post_processor<R: Request>(&self, processor: impl PostProcessor<R> + 'static) -> &Self {
        self.add::<dyn PostProcessor<R>>(Arc::new(processor))
    }

    /// Adds an exception handler for request `R`.
    pub fn exception_handler<R: Request>(
        &self,
        handler: impl ExceptionHandler<R> + 'static,
    ) -> &Self {
        self.add::<dyn ExceptionHandler<R>>(Arc::new(handler))
    }

    /// Sets the middleware ordering for request `R`.
    pub fn middleware_comparer<R: Request>(
        &self,
        comparer: impl Comparer<dyn Middleware<R>> + 'static,
    ) -> &Self {
        self.add::<dyn Comparer<dyn Middleware<R>>>(Arc::new(comparer))
    }

    /// Sets the pre-processor ordering for request `R`.
    pub fn pre_processor_comparer<R: Request>(
        &self,
        comparer: impl Comparer<dyn PreProcessor<R>> + 'static,
    ) -> &Self {
        self.add::<dyn Comparer<dyn PreProcessor<R>>>(Arc::new(comparer))
    }

    /// Sets the post-processor ordering for request `R`.
    pub fn post_processor_comparer<R: Request>(
        &self,
        comparer: impl Comparer<dyn PostProcessor<R>> + 'static,
    ) -> &Self {
        self.add::<dyn Comparer<dyn PostProcessor<R>>>(Arc::new(comparer))
    }

    /// Removes every service registered under contract `T`.
    pub fn remove<T: ?Sized + 'static>(&self) -> usize {
        self.services
            .write()
            .remove(&TypeId::of::<T>())
            .map_or(0, |removed| removed.len())
    }

    /// Returns the number of services registered under contract `T`.
    pub fn count<T: ?Sized + 'static>(&self) -> usize {
        self.services
            .read()
            .get(&TypeId::of::<T>())
            .map_or(0, Vec::len)
    }
}

impl ServiceRegistry for Registry {
    fn resolve_erased(&self, contract: TypeId) -> Option<ServiceArc> {
        self.services
            .read()
            .get(&contract)
            .and_then(|services| services.last().cloned())
    }

    fn resolve_all_erased(&self, contract: TypeId) -> Option<Vec<ServiceArc>> {
        self.services.read().get(&contract).cloned()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("contracts", &self.services.read().len())
            .finish()
    }
}

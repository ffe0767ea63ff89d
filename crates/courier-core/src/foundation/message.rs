//! Message contracts routed by the mediator.
//!
//! - A [`Request`] is answered by exactly one handler and produces a
//!   [`Request::Output`].
//! - A [`Command`] is a request whose output is `()`, so queries and commands
//!   share a single dispatch path.
//! - A [`Notification`] is broadcast to zero or more handlers and produces no
//!   output.
//!
//! Messages are identified by their concrete type; the engine never inspects
//! their contents.

/// A message answered by a single handler.
///
/// ```rust
/// use courier_core::Request;
///
/// struct GetBalance {
///     account: u64,
/// }
///
/// impl Request for GetBalance {
///     type Output = i64;
/// }
/// ```
pub trait Request: Send + Sync + 'static {
    /// The value produced by the handler.
    type Output: Send + 'static;
}

/// A request that produces no value.
///
/// Implemented automatically for every `Request<Output = ()>`.
pub trait Command: Request<Output = ()> {}

impl<T: Request<Output = ()>> Command for T {}

/// A message broadcast to every registered handler.
pub trait Notification: Send + Sync + 'static {}

/// Returns the short type name of `T` for logs, without its module path.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(index) => &full[index + 2..],
        None => full,
    }
}

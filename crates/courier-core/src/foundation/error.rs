//! Unified error types for the Courier engine.

use thiserror::Error;

use super::fault::{Fault, FaultKind};

/// Errors surfaced by [`Mediator`](crate::Mediator) operations.
#[derive(Debug, Clone, Error)]
pub enum MediatorError {
    /// An argument was missing or malformed.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// The offending parameter.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// No service is registered for a required contract.
    #[error("no service registered for type '{contract}'")]
    MissingService {
        /// The fully qualified contract type name.
        contract: &'static str,
    },

    /// The operation observed a cancellation request.
    #[error("operation was cancelled")]
    Cancelled,

    /// A handler, middleware or processor failed.
    #[error(transparent)]
    Fault(#[from] Fault),

    /// A spawned notification handler panicked.
    #[error("notification handler panicked: {message}")]
    Panicked {
        /// The panic payload, when it was a string.
        message: String,
    },
}

impl MediatorError {
    /// Creates an invalid-argument error.
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// Creates a missing-service error for contract `T`.
    pub fn missing_service<T: ?Sized>() -> Self {
        Self::MissingService {
            contract: std::any::type_name::<T>(),
        }
    }

    /// Places this error in the fault hierarchy.
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::InvalidArgument { .. } => FaultKind::ARGUMENT,
            Self::MissingService { .. } => FaultKind::INVALID_OPERATION,
            // Reported for logs only. Exception handlers never see `Cancelled`;
            // a `Fault` of this kind raised by a handler is still matchable.
            Self::Cancelled => FaultKind::OPERATION_CANCELED,
            Self::Fault(fault) => fault.kind(),
            Self::Panicked { .. } => FaultKind::SYSTEM,
        }
    }

    /// Returns `true` for [`MediatorError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the inner fault, if this error wraps one.
    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

/// Result type for mediator operations.
pub type MediatorResult<T> = Result<T, MediatorError>;

/// Argument guards for the dynamic entry points.
pub mod guard {
    use super::{MediatorError, MediatorResult};

    /// Unwraps `value`, failing with an invalid-argument error naming `name`.
    pub fn not_null<T>(value: Option<T>, name: &'static str) -> MediatorResult<T> {
        value.ok_or_else(|| MediatorError::invalid_argument(name, "value must not be null"))
    }
}

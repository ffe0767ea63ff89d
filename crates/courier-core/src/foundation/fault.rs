//! Fault kinds and handler-raised failures.
//!
//! Failures travelling through a request pipeline carry a [`FaultKind`]. Kinds
//! form an explicit tree rooted at [`FaultKind::ROOT`]; every kind except the
//! root names exactly one parent. The exception-handling middleware walks this
//! tree instead of inspecting runtime types.
//!
//! ```text
//! error
//! └── system
//!     ├── argument
//!     ├── invalid_operation
//!     ├── not_implemented
//!     ├── timeout
//!     └── operation_canceled
//! ```
//!
//! Applications extend the tree with their own kinds:
//!
//! ```rust
//! use courier_core::FaultKind;
//!
//! const BILLING: FaultKind = FaultKind::new("billing", &FaultKind::ROOT);
//! const CARD_DECLINED: FaultKind = FaultKind::new("card_declined", &BILLING);
//!
//! assert!(CARD_DECLINED.is_a(BILLING));
//! assert!(CARD_DECLINED.is_a(FaultKind::ROOT));
//! assert!(!BILLING.is_a(CARD_DECLINED));
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// A node in the fault hierarchy.
///
/// Two kinds are equal when their names and their whole ancestor chains are
/// equal, so kinds declared as `const` items compare correctly regardless of
/// where they were promoted.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaultKind {
    name: &'static str,
    parent: Option<&'static FaultKind>,
}

impl FaultKind {
    /// The root of the hierarchy. Every kind is a descendant of it.
    pub const ROOT: FaultKind = FaultKind {
        name: "error",
        parent: None,
    };

    /// Failures raised by the runtime or the engine itself.
    pub const SYSTEM: FaultKind = FaultKind::new("system", &FaultKind::ROOT);

    /// An argument was missing or malformed.
    pub const ARGUMENT: FaultKind = FaultKind::new("argument", &FaultKind::SYSTEM);

    /// The operation is not valid in the current configuration or state.
    pub const INVALID_OPERATION: FaultKind =
        FaultKind::new("invalid_operation", &FaultKind::SYSTEM);

    /// The requested behavior has not been implemented.
    pub const NOT_IMPLEMENTED: FaultKind = FaultKind::new("not_implemented", &FaultKind::SYSTEM);

    /// The operation did not complete in time.
    pub const TIMEOUT: FaultKind = FaultKind::new("timeout", &FaultKind::SYSTEM);

    /// The operation observed a cancellation request.
    pub const OPERATION_CANCELED: FaultKind =
        FaultKind::new("operation_canceled", &FaultKind::SYSTEM);

    /// Declares a new kind below `parent`.
    pub const fn new(name: &'static str, parent: &'static FaultKind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// Returns the kind's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the immediate parent, or `None` for the root.
    pub fn parent(&self) -> Option<FaultKind> {
        self.parent.copied()
    }

    /// Returns `true` for [`FaultKind::ROOT`].
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Iterates from this kind up to the root, both inclusive.
    pub fn ancestors(self) -> impl Iterator<Item = FaultKind> {
        std::iter::successors(Some(self), FaultKind::parent)
    }

    /// Returns `true` if `self` equals `other` or descends from it.
    pub fn is_a(self, other: FaultKind) -> bool {
        self.ancestors().any(|kind| kind == other)
    }

    /// Returns `true` if `self` descends from `other` and is not equal to it.
    pub fn is_strict_subkind_of(self, other: FaultKind) -> bool {
        self != other && self.is_a(other)
    }

    /// Number of edges between this kind and the root.
    pub fn depth(self) -> usize {
        self.ancestors().count() - 1
    }

    /// The slash-separated path from the root, e.g. `error/system/timeout`.
    pub fn path(self) -> String {
        let mut names: Vec<&str> = self.ancestors().map(|kind| kind.name).collect();
        names.reverse();
        names.join("/")
    }
}

impl Default for FaultKind {
    fn default() -> Self {
        Self::ROOT
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Debug for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FaultKind({})", self.path())
    }
}

/// A failure raised by a handler, middleware or processor.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct Fault {
    kind: FaultKind,
    message: String,
    #[source]
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl Fault {
    /// Creates a fault of the given kind.
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a fault of the root kind.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(FaultKind::ROOT, message)
    }

    /// Creates a [`FaultKind::TIMEOUT`] fault.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FaultKind::TIMEOUT, message)
    }

    /// Creates a [`FaultKind::INVALID_OPERATION`] fault.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(FaultKind::INVALID_OPERATION, message)
    }

    /// Creates a [`FaultKind::NOT_IMPLEMENTED`] fault.
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(FaultKind::NOT_IMPLEMENTED, message)
    }

    /// Attaches the underlying error.
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Returns the fault's kind.
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BILLING: FaultKind = FaultKind::new("billing", &FaultKind::ROOT);
    const CARD_DECLINED: FaultKind = FaultKind::new("card_declined", &BILLING);

    #[test]
    fn test_builtin_hierarchy() {
        assert!(FaultKind::TIMEOUT.is_a(FaultKind::SYSTEM));
        assert!(FaultKind::TIMEOUT.is_a(FaultKind::ROOT));
        assert!(FaultKind::TIMEOUT.is_a(FaultKind::TIMEOUT));
        assert!(!FaultKind::TIMEOUT.is_a(FaultKind::NOT_IMPLEMENTED));
        assert!(!FaultKind::SYSTEM.is_a(FaultKind::TIMEOUT));
        assert!(FaultKind::ROOT.is_root());
    }

    #[test]
    fn test_strict_subkind() {
        assert!(CARD_DECLINED.is_strict_subkind_of(BILLING));
        assert!(!BILLING.is_strict_subkind_of(BILLING));
        assert!(!BILLING.is_strict_subkind_of(FaultKind::SYSTEM));
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let names: Vec<_> = FaultKind::TIMEOUT.ancestors().map(|k| k.name()).collect();
        assert_eq!(names, vec!["timeout", "system", "error"]);
        assert_eq!(FaultKind::TIMEOUT.depth(), 2);
        assert_eq!(CARD_DECLINED.path(), "error/billing/card_declined");
    }

    #[test]
    fn test_same_name_different_parent_is_distinct() {
        const OTHER_TIMEOUT: FaultKind = FaultKind::new("timeout", &BILLING);
        assert_ne!(OTHER_TIMEOUT, FaultKind::TIMEOUT);
        assert!(!OTHER_TIMEOUT.is_a(FaultKind::SYSTEM));
    }

    #[test]
    fn test_fault_display_and_source() {
        let io = std::io::Error::other("socket closed");
        let fault = Fault::timeout("upstream took too long").with_source(io);

        assert_eq!(fault.kind(), FaultKind::TIMEOUT);
        assert_eq!(fault.to_string(), "timeout: upstream took too long");
        assert!(fault.source().is_some());
    }
}

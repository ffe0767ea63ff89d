//! Foundation layer - message contracts, faults, errors and ordering.
//!
//! This module contains the building blocks every other layer depends on:
//! - Request, command and notification contracts
//! - The fault hierarchy used for exception-handler matching
//! - Error types and the argument guard
//! - Ordering helpers for polymorphic collections

pub mod error;
pub mod fault;
pub mod message;
pub mod ordering;

pub use error::{MediatorError, MediatorResult, guard};
pub use fault::{Fault, FaultKind};
pub use message::{Command, Notification, Request};
pub use ordering::{Comparer, ComparerFn, Fallback, arrange, by_specificity, comparer_fn};

//! Ordering utilities for middleware, processors and exception handlers.
//!
//! Every collection the engine resolves from the registry arrives in
//! registration order. These helpers turn that order into execution order:
//! an explicit [`Comparer`] wins when one is registered for the contract;
//! otherwise a [`Fallback`] policy applies. All sorts are stable, so ties keep
//! their registration order.

use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::fault::FaultKind;

/// Compares two values of a (possibly unsized) contract type.
///
/// Comparers are registered per contract, e.g. as
/// `Arc<dyn Comparer<dyn Middleware<MyRequest>>>`.
pub trait Comparer<T: ?Sized>: Send + Sync {
    /// Returns the relative order of `a` and `b`.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// A [`Comparer`] backed by a closure.
pub struct ComparerFn<F, T: ?Sized> {
    f: F,
    _marker: PhantomData<fn(&T)>,
}

impl<F, T> Comparer<T> for ComparerFn<F, T>
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.f)(a, b)
    }
}

/// Wraps a closure into a [`Comparer`].
pub fn comparer_fn<T, F>(f: F) -> ComparerFn<F, T>
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering + Send + Sync,
{
    ComparerFn {
        f,
        _marker: PhantomData,
    }
}

/// What to do when no comparer is registered for a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Keep registration order.
    RegistrationOrder,
    /// Reverse registration order, so the last registration comes first.
    Reversed,
}

/// Orders `items` with `comparer` when present, otherwise with `fallback`.
pub fn arrange<T: ?Sized>(
    items: &mut [Arc<T>],
    comparer: Option<&dyn Comparer<T>>,
    fallback: Fallback,
) {
    match comparer {
        Some(comparer) => items.sort_by(|a, b| comparer.compare(a, b)),
        None if fallback == Fallback::Reversed => items.reverse(),
        None => {}
    }
}

/// Orders `items` so that every strict sub-kind precedes its ancestors.
///
/// Kinds that are unrelated, or equal, keep their relative input order. The
/// relation is only a partial order, so this is a stable insertion rather
/// than a comparison sort: each item is placed just before the first already
/// placed item whose kind is a strict ancestor of its own.
pub fn by_specificity<T>(items: impl IntoIterator<Item = T>, kind_of: impl Fn(&T) -> FaultKind) -> Vec<T> {
    let mut ordered: Vec<T> = Vec::new();
    for item in items {
        let kind = kind_of(&item);
        let position = ordered
            .iter()
            .position(|placed| kind.is_strict_subkind_of(kind_of(placed)))
            .unwrap_or(ordered.len());
        ordered.insert(position, item);
    }
    ordered
}

impl<F, T: ?Sized> fmt::Debug for ComparerFn<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparerFn").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arcs(values: &[i32]) -> Vec<Arc<i32>> {
        values.iter().copied().map(Arc::new).collect()
    }

    fn values(items: &[Arc<i32>]) -> Vec<i32> {
        items.iter().map(|v| **v).collect()
    }

    #[test]
    fn test_fallback_keeps_registration_order() {
        let mut items = arcs(&[1, 2, 3]);
        arrange(&mut items, None, Fallback::RegistrationOrder);
        assert_eq!(values(&items), vec![1, 2, 3]);
    }

    #[test]
    fn test_fallback_reversed() {
        let mut items = arcs(&[1, 2, 3]);
        arrange(&mut items, None, Fallback::Reversed);
        assert_eq!(values(&items), vec![3, 2, 1]);
    }

    #[test]
    fn test_comparer_is_stable() {
        // Compare by parity only: evens before odds, ties keep input order.
        let by_parity = comparer_fn(|a: &i32, b: &i32| (a % 2).cmp(&(b % 2)));
        let mut items = arcs(&[5, 2, 3, 8, 1, 4]);
        arrange(&mut items, Some(&by_parity), Fallback::Reversed);
        assert_eq!(values(&items), vec![2, 8, 4, 5, 3, 1]);
    }

    #[test]
    fn test_specificity_places_subkinds_first() {
        let input = vec![
            ("root", FaultKind::ROOT),
            ("system", FaultKind::SYSTEM),
            ("timeout", FaultKind::TIMEOUT),
        ];
        let ordered = by_specificity(input, |(_, kind)| *kind);
        let names: Vec<_> = ordered.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["timeout", "system", "root"]);
    }

    #[test]
    fn test_specificity_keeps_unrelated_order() {
        let input = vec![
            ("not_implemented", FaultKind::NOT_IMPLEMENTED),
            ("root", FaultKind::ROOT),
            ("timeout", FaultKind::TIMEOUT),
            ("argument", FaultKind::ARGUMENT),
        ];
        let ordered = by_specificity(input, |(_, kind)| *kind);
        let names: Vec<_> = ordered.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["not_implemented", "timeout", "argument", "root"]);
    }
}

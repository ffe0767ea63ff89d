//! Type-keyed store for dispatch wrappers.
//!
//! Entries are keyed by the wrapper's own `TypeId`, so each key maps to
//! exactly one concrete type. Lookups clone the stored `Arc` and drop the
//! shard guard immediately; guards are never held across an `.await`.

use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

/// Concurrent cache of one value per type.
///
/// Under a race for the same type the factory may run more than once, but
/// only the first installed value is retained and every caller receives it.
#[derive(Default)]
pub struct WrapperCache {
    entries: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl WrapperCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached `W`, installing `factory()` if there is none.
    pub fn get_or_add<W, F>(&self, factory: F) -> Arc<W>
    where
        W: Any + Send + Sync,
        F: FnOnce() -> W,
    {
        let key = TypeId::of::<W>();
        let existing = self.entries.get(&key).map(|entry| Arc::clone(entry.value()));
        let erased = match existing {
            Some(erased) => erased,
            None => {
                let candidate: Arc<dyn Any + Send + Sync> = Arc::new(factory());
                let installed = self.entries.entry(key).or_insert(candidate);
                trace!(wrapper = type_name::<W>(), "Installed wrapper");
                Arc::clone(installed.value())
            }
        };

        erased
            .downcast::<W>()
            .unwrap_or_else(|_| unreachable!("cache entries are keyed by their own type"))
    }

    /// Returns `true` if a `W` is cached.
    pub fn contains<W: Any>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<W>())
    }

    /// Number of cached wrappers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every cached wrapper.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for WrapperCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrapperCache")
            .field("len", &self.entries.len())
            .finish()
    }
}

//! In-memory cache of sensitive-field descriptors, keyed by record type.
//!
//! Descriptors are discovered on first use of a type and kept for the
//! process lifetime. The cache uses `arc-swap` for lock-free reads on the hot
//! path; first writes go through `rcu`, so concurrent discovery of the same
//! type may run more than once but only the first result is ever stored.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use arc_swap::ArcSwap;
use tracing::debug;

use super::{SensitiveField, SensitiveFields};

type Entry = Arc<dyn Any + Send + Sync>;

/// Shared, lock-free cache of per-type sensitive-field lists.
///
/// Cloning is cheap and clones share the same underlying map.
#[derive(Clone)]
pub struct FieldCache {
    inner: Arc<ArcSwap<HashMap<TypeId, Entry>>>,
}

impl FieldCache {
    /// Create a new, empty [`FieldCache`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(HashMap::new())),
        }
    }

    /// Return the number of record types discovered so far.
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// Return `true` if no record type has been discovered yet.
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }

    /// Return `true` if `R` has already been discovered.
    pub fn contains<R: SensitiveFields>(&self) -> bool {
        self.inner.load().contains_key(&TypeId::of::<R>())
    }

    /// Return the sensitive fields of `R`, discovering them on first use.
    ///
    /// This is a lock-free read once `R` is cached.
    pub fn fields<R: SensitiveFields>(&self) -> Arc<Vec<SensitiveField<R>>> {
        if let Some(cached) = self.lookup::<R>() {
            return cached;
        }

        let type_id = TypeId::of::<R>();
        let discovered: Arc<Vec<SensitiveField<R>>> = Arc::new(R::sensitive_fields());
        debug!(
            record = std::any::type_name::<R>(),
            fields = discovered.len(),
            "discovered sensitive fields"
        );

        let entry: Entry = discovered.clone();
        self.inner.rcu(|current| {
            let mut next: HashMap<TypeId, Entry> = (**current).clone();
            next.entry(type_id).or_insert_with(|| entry.clone());
            next
        });

        // Another thread may have won the insert; hand out the stored list.
        self.lookup::<R>().unwrap_or(discovered)
    }

    fn lookup<R: SensitiveFields>(&self) -> Option<Arc<Vec<SensitiveField<R>>>> {
        self.inner
            .load()
            .get(&TypeId::of::<R>())
            .cloned()
            .and_then(|entry| entry.downcast::<Vec<SensitiveField<R>>>().ok())
    }
}

impl Default for FieldCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FieldCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCache").field("types", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::fields::TaggedSlot;

    static DISCOVERIES: AtomicUsize = AtomicUsize::new(0);

    struct Patient {
        ssn: String,
    }

    impl SensitiveFields for Patient {
        fn sensitive_fields() -> Vec<SensitiveField<Self>> {
            DISCOVERIES.fetch_add(1, Ordering::SeqCst);
            vec![SensitiveField::new("ssn", |p: &mut Patient| {
                TaggedSlot::slot(&mut p.ssn)
            })]
        }
    }

    struct Empty;

    impl SensitiveFields for Empty {
        fn sensitive_fields() -> Vec<SensitiveField<Self>> {
            Vec::new()
        }
    }

    #[test]
    fn initially_empty() {
        let cache = FieldCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);
        assert!(!cache.contains::<Empty>());
    }

    #[test]
    fn discovery_is_cached_per_type() {
        let cache = FieldCache::new();
        let first = cache.fields::<Patient>();
        let before = DISCOVERIES.load(Ordering::SeqCst);
        let second = cache.fields::<Patient>();
        assert_eq!(DISCOVERIES.load(Ordering::SeqCst), before);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second[0].name(), "ssn");
        assert!(cache.contains::<Patient>());
    }

    #[test]
    fn distinct_types_get_distinct_entries() {
        let cache = FieldCache::new();
        assert_eq!(cache.fields::<Patient>().len(), 1);
        assert!(cache.fields::<Empty>().is_empty());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clones_share_the_map() {
        let cache = FieldCache::new();
        let clone = cache.clone();
        clone.fields::<Empty>();
        assert!(cache.contains::<Empty>());
    }

    #[test]
    fn concurrent_first_use_stores_one_list() {
        let cache = FieldCache::new();
        let lists: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| cache.fields::<Patient>()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(cache.len(), 1);
        let stored = cache.fields::<Patient>();
        assert!(lists.iter().all(|l| Arc::ptr_eq(l, &stored)));
    }
}

//! Per-injector instance cache
//!
//! Uses DashMap so cached lookups never wait on the injector's activation
//! lock.

use crate::Provider;
use crate::factory::Instance;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// One cached activation
#[derive(Clone)]
pub(crate) struct CacheEntry {
    pub(crate) provider: Provider,
    pub(crate) instance: Instance,
    /// Activation order within the owning injector
    pub(crate) seq: u64,
}

/// Map from provider identity to its activated instance.
pub(crate) struct InstanceCache {
    entries: DashMap<usize, CacheEntry, RandomState>,
    next_seq: AtomicU64,
}

impl InstanceCache {
    /// Create an empty cache.
    ///
    /// Uses 8 shards: injectors hold few instances and child injectors are
    /// created per unit of work, so creation cost matters more than
    /// write concurrency.
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher_and_shard_amount(0, RandomState::new(), 8),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Cached instance for `provider`, if any.
    #[inline]
    pub(crate) fn get(&self, provider: &Provider) -> Option<Instance> {
        self.entries
            .get(&provider.id())
            .map(|entry| Arc::clone(&entry.instance))
    }

    /// Record an activation. A previous entry for the same provider is replaced.
    #[inline]
    pub(crate) fn insert(&self, provider: &Provider, instance: Instance) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(
            provider.id(),
            CacheEntry {
                provider: provider.clone(),
                instance,
                seq,
            },
        );
    }

    /// Whether `provider` has a cached instance.
    #[inline]
    pub(crate) fn contains(&self, provider: &Provider) -> bool {
        self.entries.contains_key(&provider.id())
    }

    /// Number of cached instances.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Remove every entry, newest activation first.
    pub(crate) fn drain(&self) -> Vec<CacheEntry> {
        let keys: Vec<usize> = self.entries.iter().map(|entry| *entry.key()).collect();
        let mut drained: Vec<CacheEntry> = keys
            .into_iter()
            .filter_map(|key| self.entries.remove(&key).map(|(_, entry)| entry))
            .collect();
        drained.sort_by(|a, b| b.seq.cmp(&a.seq));
        drained
    }
}

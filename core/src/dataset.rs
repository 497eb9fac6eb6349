//! Read-only reference table standing in for an external lookup service.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use crate::error::{HarnessError, HarnessResult};

/// Immutable key → name mapping shared by every case of a run.
///
/// The table never changes after construction, so it is shared through an
/// `Arc` without locking. Every lookup, sync or async, bumps a call counter
/// that tests read to compare how many lookups each strategy issues.
#[derive(Debug, Default)]
pub struct ReferenceDataset {
    entries: FxHashMap<u32, Arc<str>>,
    lookups: AtomicU64,
}

impl ReferenceDataset {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<Arc<str>>,
    {
        Self {
            entries: entries.into_iter().map(|(key, name)| (key, name.into())).collect(),
            lookups: AtomicU64::new(0),
        }
    }

    /// The fixed city table the weather workload resolves against.
    pub fn cities() -> Self {
        Self::new([(1, "London"), (2, "Paris")])
    }

    /// Synchronous lookup.
    pub fn resolve(&self, key: u32) -> HarnessResult<Arc<str>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.entries.get(&key).cloned().ok_or(HarnessError::Lookup { key })
    }

    /// Asynchronous lookup. Yields to the scheduler once before answering to
    /// model a dependency with non-zero latency.
    pub async fn lookup(&self, key: u32) -> HarnessResult<Arc<str>> {
        tokio::task::yield_now().await;
        self.resolve(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups issued since construction or the last [`reset_lookup_calls`](Self::reset_lookup_calls).
    pub fn lookup_calls(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    pub fn reset_lookup_calls(&self) {
        self.lookups.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_missing_keys() {
        let dataset = ReferenceDataset::cities();
        assert_eq!(dataset.len(), 2);
        assert_eq!(&*dataset.resolve(1).unwrap(), "London");
        assert_eq!(&*dataset.resolve(2).unwrap(), "Paris");
        assert_eq!(dataset.resolve(7), Err(HarnessError::Lookup { key: 7 }));
        assert_eq!(dataset.lookup_calls(), 3);
    }

    #[tokio::test]
    async fn test_async_lookup_shares_counter() {
        let dataset = ReferenceDataset::cities();
        assert_eq!(&*dataset.lookup(1).await.unwrap(), "London");
        dataset.resolve(2).unwrap();
        assert_eq!(dataset.lookup_calls(), 2);
        dataset.reset_lookup_calls();
        assert_eq!(dataset.lookup_calls(), 0);
    }
}

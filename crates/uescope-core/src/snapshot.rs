//! Time-boxed entity snapshot cache.
//!
//! Bounds the read rate against the live process: a full container decode
//! touches hundreds of foreign addresses, so consumers polling at frame
//! rate share one snapshot per freshness window. The memo is swapped
//! wholesale; readers hold an `Arc` to an immutable snapshot and can
//! never observe a half-updated container.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::entity::EntitySnapshot;
use crate::error::Result;
use crate::memory::layout::timing;

struct CacheEntry {
    snapshot: Arc<EntitySnapshot>,
    taken_at: Instant,
}

pub struct SnapshotCache {
    entry: Mutex<Option<CacheEntry>>,
    window: Duration,
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::with_window(Duration::from_millis(timing::SNAPSHOT_CACHE_WINDOW_MS))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            entry: Mutex::new(None),
            window,
        }
    }

    /// Return the memoized snapshot if it is younger than the freshness
    /// window; otherwise run `refresh` and memoize its result.
    pub fn get_or_refresh<F>(&self, refresh: F) -> Result<Arc<EntitySnapshot>>
    where
        F: FnOnce() -> Result<EntitySnapshot>,
    {
        let mut entry = self
            .entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(cached) = entry.as_ref()
            && cached.taken_at.elapsed() < self.window
        {
            return Ok(Arc::clone(&cached.snapshot));
        }

        let snapshot = Arc::new(refresh()?);
        debug!("Snapshot cache refreshed: {} entities", snapshot.len());
        *entry = Some(CacheEntry {
            snapshot: Arc::clone(&snapshot),
            taken_at: Instant::now(),
        });
        Ok(snapshot)
    }

    /// Drop the memo unconditionally; the next read re-decodes.
    pub fn invalidate(&self) {
        let mut entry = self
            .entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityInfo;

    fn snapshot_with(count: usize) -> EntitySnapshot {
        let entities = (0..count)
            .map(|i| EntityInfo::new(i as i32, 0x2_0000_0000 + i as u64, format!("E{i}")))
            .collect();
        EntitySnapshot::new(entities)
    }

    #[test]
    fn test_fresh_snapshot_is_shared() {
        let cache = SnapshotCache::new();
        let first = cache.get_or_refresh(|| Ok(snapshot_with(2))).unwrap();
        let second = cache.get_or_refresh(|| panic!("must not re-decode")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_expired_window_triggers_refresh() {
        let cache = SnapshotCache::with_window(Duration::from_millis(0));
        let first = cache.get_or_refresh(|| Ok(snapshot_with(1))).unwrap();
        let second = cache.get_or_refresh(|| Ok(snapshot_with(3))).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn test_invalidate_forces_refresh() {
        let cache = SnapshotCache::new();
        let first = cache.get_or_refresh(|| Ok(snapshot_with(1))).unwrap();
        cache.invalidate();
        let second = cache.get_or_refresh(|| Ok(snapshot_with(2))).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_failed_refresh_leaves_cache_empty() {
        let cache = SnapshotCache::with_window(Duration::from_millis(0));
        let result = cache.get_or_refresh(|| {
            Err(crate::error::Error::MemoryReadFailed {
                address: 0x1000,
                message: "target exited".to_string(),
            })
        });
        assert!(result.is_err());

        // A subsequent successful refresh recovers.
        let snapshot = cache.get_or_refresh(|| Ok(snapshot_with(1))).unwrap();
        assert_eq!(snapshot.len(), 1);
    }
}

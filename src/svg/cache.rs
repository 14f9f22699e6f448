//! Size-keyed LRU cache for rendered placeholders

use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::svg::renderer::RenderRequest;

/// Default number of rendered sizes kept in memory
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Point-in-time cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

/// Bounded memoization of rendered SVG keyed by canvas size.
///
/// The lock is released while a missing entry is rendered, so two callers
/// missing the same key may both render it. Rendering is deterministic and
/// the second insert simply overwrites an identical value.
pub struct RenderCache {
    entries: Mutex<LruCache<RenderRequest, Arc<str>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RenderCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached markup for `request`, rendering it on a miss
    pub fn get_or_render<F>(&self, request: RenderRequest, render: F) -> Arc<str>
    where
        F: FnOnce(RenderRequest) -> String,
    {
        if let Some(cached) = self.lock().get(&request).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return cached;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Render cache miss for {}", request);
        let rendered: Arc<str> = Arc::from(render(request));
        self.lock().put(request, Arc::clone(&rendered));
        rendered
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, request: &RenderRequest) -> bool {
        self.lock().contains(request)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: entries.len(),
            capacity: entries.cap().get(),
        }
    }

    // Entries are plain values, so a panic elsewhere cannot leave them torn
    fn lock(&self) -> MutexGuard<'_, LruCache<RenderRequest, Arc<str>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl std::fmt::Debug for RenderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCache").field("stats", &self.stats()).finish()
    }
}

//! Route resolution caching
//!
//! Dispatching scans the routes in declaration order. This module memoizes
//! the outcome per path with an LRU eviction policy. Declaring a route can
//! change which route a path resolves to, so the router clears the cache on
//! every declaration.

use crate::params::Params;
use crate::trace_log;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Outcome of resolving a path: index of the first matching route and its
/// captures, or `None` when no route matched
pub type Resolution = Option<(usize, Params)>;

/// Cache performance statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub invalidations: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Path resolution cache with LRU eviction
#[derive(Debug)]
pub struct RouteCache {
    resolved: LruCache<String, Resolution>,
    stats: CacheStats,
}

impl RouteCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            resolved: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn clear(&mut self) {
        trace_log!("Clearing route cache");
        self.resolved.clear();
        self.stats.invalidations += 1;
    }

    pub fn get(&mut self, path: &str) -> Option<Resolution> {
        if let Some(resolution) = self.resolved.get(path) {
            self.stats.hits += 1;
            trace_log!("Route cache hit for path: '{}'", path);
            Some(resolution.clone())
        } else {
            self.stats.misses += 1;
            trace_log!("Route cache miss for path: '{}'", path);
            None
        }
    }

    pub fn set(&mut self, path: String, resolution: Resolution) {
        trace_log!("Caching resolution for path '{}'", path);
        self.resolved.push(path, resolution);
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

// Tue Feb 03 2026 - Alex

use crate::reflection::key::MemberKey;
use crate::reflection::member::MemberHandle;
use crate::reflection::resolver::{resolve, Resolution};
use ahash::AHashMap;
use once_cell::sync::Lazy;
use log::{debug, trace};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static GLOBAL_CACHE: Lazy<MemberCache> = Lazy::new(MemberCache::new);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Memoizes single-level resolutions. Only `Found` outcomes are stored; ambiguous
/// and missing lookups are recomputed each time.
pub struct MemberCache {
    entries: RwLock<AHashMap<MemberKey, MemberHandle>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemberCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(AHashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn global() -> &'static MemberCache {
        &GLOBAL_CACHE
    }

    pub fn get(&self, key: &MemberKey) -> Option<MemberHandle> {
        self.entries.read().get(key).cloned()
    }

    pub fn lookup(&self, key: &MemberKey) -> Resolution {
        if let Some(member) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!("Cache hit for {}", key);
            return Resolution::Found(member);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let resolution = resolve(key);
        if let Resolution::Found(member) = &resolution {
            debug!("Caching {} -> {}", key, member);
            self.entries.write().insert(key.clone(), member.clone());
        }
        resolution
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for MemberCache {
    fn default() -> Self {
        Self::new()
    }
}

//! TTL-bounded cache of group membership
//!
//! Entries are fetched lazily from a [`GroupLookup`] on first use and are
//! considered valid while younger than the configured TTL. Expiry is checked
//! at read time; there is no background sweeper.
//!
//! # Thread Safety
//!
//! The entry map is guarded by a single mutex which is never held across a
//! call to the lookup. Two threads missing on the same user may both fetch;
//! the last write wins.

use crate::error::{AuthzError, Result};
use crate::lookup::GroupLookup;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// The groups a user belongs to, in canonical (sorted) order
pub type GroupSet = BTreeSet<String>;

/// Cached membership with its fetch time
#[derive(Debug, Clone)]
struct CachedGroups {
    groups: Arc<GroupSet>,
    fetched_at: Instant,
}

impl CachedGroups {
    fn new(groups: Arc<GroupSet>) -> Self {
        Self {
            groups,
            fetched_at: Instant::now(),
        }
    }

    fn is_valid(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Cache of per-user group membership
pub struct GroupCache {
    lookup: Arc<dyn GroupLookup>,
    entries: Mutex<HashMap<String, CachedGroups>>,
    ttl: Duration,
    max_entries: Option<usize>,
    hits: AtomicU64,
    misses: AtomicU64,
    fetch_errors: AtomicU64,
}

impl GroupCache {
    /// Create a cache that keeps results for at most `ttl`.
    ///
    /// A zero TTL disables caching: every call goes to the lookup.
    pub fn new(lookup: impl GroupLookup + 'static, ttl: Duration) -> Self {
        Self::with_lookup(Arc::new(lookup), ttl)
    }

    /// Create a cache over an already shared lookup
    pub fn with_lookup(lookup: Arc<dyn GroupLookup>, ttl: Duration) -> Self {
        Self {
            lookup,
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            fetch_errors: AtomicU64::new(0),
        }
    }

    /// Bound the number of cached users.
    ///
    /// When full, expired entries are purged; if the cache is still full the
    /// fetched result is returned without being stored.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Cache TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the groups `username` belongs to, sorted.
    ///
    /// An unknown user has no groups. Lookup failures other than "not found"
    /// are returned as [`AuthzError::LookupFailure`] and are not cached.
    pub fn groups(&self, username: &str) -> Result<Vec<String>> {
        Ok(self.group_set(username)?.iter().cloned().collect())
    }

    /// Like [`groups`](Self::groups) but returns the shared cached set
    pub fn group_set(&self, username: &str) -> Result<Arc<GroupSet>> {
        if let Some(groups) = self.cached(username) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(username, "group cache hit");
            return Ok(groups);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(username, "group cache miss, fetching groups");

        let groups: GroupSet = match self.lookup.get_groups(username) {
            Ok(groups) => groups.into_iter().collect(),
            Err(e) if e.is_not_found() => {
                debug!(username, "user not found, caching empty membership");
                GroupSet::new()
            }
            Err(e) => {
                self.fetch_errors.fetch_add(1, Ordering::Relaxed);
                warn!(username, error = %e, "group lookup failed");
                return Err(AuthzError::lookup(username, e));
            }
        };

        let groups = Arc::new(groups);
        self.store(username, Arc::clone(&groups));
        Ok(groups)
    }

    /// Look up a valid entry, dropping it if it has expired
    fn cached(&self, username: &str) -> Option<Arc<GroupSet>> {
        let mut entries = self.entries.lock();
        match entries.get(username) {
            Some(entry) if entry.is_valid(self.ttl) => Some(Arc::clone(&entry.groups)),
            Some(_) => {
                entries.remove(username);
                None
            }
            None => None,
        }
    }

    fn store(&self, username: &str, groups: Arc<GroupSet>) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries.lock();
        if let Some(max) = self.max_entries {
            if !entries.contains_key(username) && entries.len() >= max {
                let ttl = self.ttl;
                entries.retain(|_, entry| entry.is_valid(ttl));
                if entries.len() >= max {
                    debug!(username, max, "group cache full, not caching");
                    return;
                }
            }
        }
        entries.insert(username.to_string(), CachedGroups::new(groups));
    }

    /// Remove `username` from the cache
    pub fn evict(&self, username: &str) {
        if self.entries.lock().remove(username).is_some() {
            debug!(username, "evicted cached groups");
        }
    }

    /// Remove every entry from the cache
    pub fn evict_all(&self) {
        let mut entries = self.entries.lock();
        debug!(count = entries.len(), "evicting all cached groups");
        entries.clear();
    }

    /// Number of stored entries, including any not yet noticed as expired
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            ttl: self.ttl,
        }
    }
}

impl std::fmt::Debug for GroupCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupCache")
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .field("entries", &self.len())
            .finish()
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries
    pub entries: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that went to the group service
    pub misses: u64,
    /// Failed fetches
    pub fetch_errors: u64,
    /// Cache TTL
    pub ttl: Duration,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

//! Permission checker
//!
//! Decides whether a user is admitted by an ACL. The rules, for a user `u`
//! and an ACL entry `n`:
//!
//! - If `u` is identical to `n`, access is granted.
//! - If `n` is `everyone`, access is granted.
//! - If `n` is `everyone-local`, access is granted if `u` has no domain.
//! - If `n` is `everyone@<domain>`, access is granted if `u` ends with `@<domain>`.
//! - If `n` is `everyone-local@<domain>`, access is granted if `u` is
//!   `<name>@<domain>` where `<name>` contains no `@`.
//! - Otherwise the group cache is consulted and access is granted if `u` is a
//!   member of any group named in the ACL.

use crate::cache::{CacheStats, GroupCache};
use crate::config::CheckerConfig;
use crate::error::Result;
use crate::lookup::{GroupLookup, RetryingLookup};
use crate::pattern::{self, Verdict};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Checks ACL membership, caching group lookups
#[derive(Debug, Clone)]
pub struct PermChecker {
    cache: Arc<GroupCache>,
}

impl PermChecker {
    /// Create a checker that caches group membership for at most `cache_ttl`
    pub fn new(lookup: impl GroupLookup + 'static, cache_ttl: Duration) -> Self {
        Self::with_cache(Arc::new(GroupCache::new(lookup, cache_ttl)))
    }

    /// Create a checker over an existing, possibly shared, cache
    pub fn with_cache(cache: Arc<GroupCache>) -> Self {
        Self { cache }
    }

    /// Build a checker from configuration
    pub fn from_config(lookup: impl GroupLookup + 'static, config: &CheckerConfig) -> Result<Self> {
        config.validate()?;
        let lookup: Arc<dyn GroupLookup> = if config.retry.is_enabled() {
            Arc::new(RetryingLookup::new(
                lookup,
                config.retry.max_attempts,
                config.retry.backoff(),
            ))
        } else {
            Arc::new(lookup)
        };
        let mut cache = GroupCache::with_lookup(lookup, config.cache_ttl());
        if let Some(max) = config.max_entries {
            cache = cache.with_max_entries(max);
        }
        Ok(Self::with_cache(Arc::new(cache)))
    }

    /// Report whether `acl` admits `username`.
    ///
    /// An unknown user is not an error: unless the ACL admits them by name
    /// or wildcard, the result is `Ok(false)`.
    pub fn allow<S: AsRef<str>>(&self, username: &str, acl: &[S]) -> Result<bool> {
        let verdict = pattern::evaluate(username, acl);
        if verdict.is_decisive() {
            debug!(username, allowed = verdict.allowed(), "trivial ACL decision");
            return Ok(verdict == Verdict::Allow);
        }

        let groups = self.cache.group_set(username)?;
        let allowed = acl.iter().any(|name| groups.contains(name.as_ref()));
        debug!(username, allowed, "ACL decision from group membership");
        Ok(allowed)
    }

    /// Groups `username` belongs to, via the cache
    pub fn groups(&self, username: &str) -> Result<Vec<String>> {
        self.cache.groups(username)
    }

    /// Evict `username` from the group cache
    pub fn evict(&self, username: &str) {
        self.cache.evict(username);
    }

    /// Evict everything from the group cache
    pub fn evict_all(&self) {
        self.cache.evict_all();
    }

    /// The underlying group cache
    pub fn cache(&self) -> &Arc<GroupCache> {
        &self.cache
    }

    /// Group cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

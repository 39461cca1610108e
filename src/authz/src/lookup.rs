//! Group lookup collaborators
//!
//! The [`GroupLookup`] trait is the single seam between the checker and the
//! identity service that knows which groups a user belongs to. Production
//! code plugs in a remote client; tests and the `acl-check` binary use
//! [`StaticGroupLookup`].

use crate::error::{AuthzError, LookupError, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Source of group membership for users
pub trait GroupLookup: Send + Sync {
    /// Return every group `username` belongs to.
    ///
    /// An unknown user must be reported as [`LookupError::NotFound`].
    fn get_groups(&self, username: &str) -> std::result::Result<Vec<String>, LookupError>;
}

impl<T: GroupLookup + ?Sized> GroupLookup for Arc<T> {
    fn get_groups(&self, username: &str) -> std::result::Result<Vec<String>, LookupError> {
        (**self).get_groups(username)
    }
}

impl<T: GroupLookup + ?Sized> GroupLookup for Box<T> {
    fn get_groups(&self, username: &str) -> std::result::Result<Vec<String>, LookupError> {
        (**self).get_groups(username)
    }
}

/// In-memory user directory
#[derive(Debug, Default)]
pub struct StaticGroupLookup {
    users: RwLock<HashMap<String, Vec<String>>>,
}

impl StaticGroupLookup {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a directory from a JSON object mapping usernames to group lists
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let users: HashMap<String, Vec<String>> = serde_json::from_str(&data).map_err(|e| {
            AuthzError::Config(format!("invalid groups file {}: {}", path.display(), e))
        })?;

        let lookup = Self::new();
        for (name, groups) in users {
            lookup.add_user(name, groups);
        }
        Ok(lookup)
    }

    /// Add a user in the given groups.
    ///
    /// If the user already exists the groups are merged into its existing
    /// membership.
    pub fn add_user<I, S>(&self, name: impl Into<String>, groups: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut users = self.users.write();
        let current = users.entry(name.into()).or_default();
        for group in groups {
            let group = group.into();
            if !current.contains(&group) {
                current.push(group);
            }
        }
    }

    /// Remove a single user
    pub fn remove_user(&self, name: &str) {
        self.users.write().remove(name);
    }

    /// Remove all users
    pub fn remove_users(&self) {
        self.users.write().clear();
    }

    /// Number of known users
    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }
}

impl GroupLookup for StaticGroupLookup {
    fn get_groups(&self, username: &str) -> std::result::Result<Vec<String>, LookupError> {
        self.users
            .read()
            .get(username)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(username.to_string()))
    }
}

/// Lookup decorator that retries transient failures.
///
/// Only [`LookupError::Unavailable`] is retried. With `max_attempts == 1`
/// the wrapped lookup is called exactly once, which is the default policy.
pub struct RetryingLookup<L> {
    inner: L,
    max_attempts: u32,
    backoff: Duration,
}

impl<L: GroupLookup> RetryingLookup<L> {
    /// Wrap `inner`, making at most `max_attempts` calls per lookup
    pub fn new(inner: L, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Total number of attempts made per lookup
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl<L: GroupLookup> GroupLookup for RetryingLookup<L> {
    fn get_groups(&self, username: &str) -> std::result::Result<Vec<String>, LookupError> {
        let mut attempt = 1;
        loop {
            match self.inner.get_groups(username) {
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    warn!(
                        username,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "group lookup failed, retrying"
                    );
                    attempt += 1;
                    if !self.backoff.is_zero() {
                        std::thread::sleep(self.backoff);
                    }
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl GroupLookup for Flaky {
        fn get_groups(&self, _username: &str) -> std::result::Result<Vec<String>, LookupError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(LookupError::Unavailable("try again".into()))
            } else {
                Ok(vec!["ops".to_string()])
            }
        }
    }

    #[test]
    fn test_static_lookup_unknown_user() {
        let lookup = StaticGroupLookup::new();
        let err = lookup.get_groups("bob").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_static_lookup_merges_groups() {
        let lookup = StaticGroupLookup::new();
        lookup.add_user("bob", ["beatles"]);
        lookup.add_user("bob", ["beatles", "wings"]);

        assert_eq!(lookup.get_groups("bob").unwrap(), vec!["beatles", "wings"]);
        assert_eq!(lookup.user_count(), 1);
    }

    #[test]
    fn test_static_lookup_remove() {
        let lookup = StaticGroupLookup::new();
        lookup.add_user("bob", ["beatles"]);
        lookup.add_user("alice", ["admins"]);

        lookup.remove_user("bob");
        assert!(lookup.get_groups("bob").is_err());
        assert!(lookup.get_groups("alice").is_ok());

        lookup.remove_users();
        assert_eq!(lookup.user_count(), 0);
    }

    #[test]
    fn test_static_lookup_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("groups.json");
        std::fs::write(&path, r#"{"alice": ["somegroup", "othergroup"], "bob": []}"#).unwrap();

        let lookup = StaticGroupLookup::from_json_file(&path).unwrap();
        assert_eq!(lookup.get_groups("alice").unwrap(), vec!["somegroup", "othergroup"]);
        assert!(lookup.get_groups("bob").unwrap().is_empty());
    }

    #[test]
    fn test_static_lookup_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("groups.json");
        std::fs::write(&path, "[1, 2").unwrap();

        match StaticGroupLookup::from_json_file(&path) {
            Err(AuthzError::Config(msg)) => assert!(msg.contains("invalid groups file")),
            other => panic!("Expected Config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_retry_recovers_from_transient_failure() {
        let lookup = RetryingLookup::new(
            Flaky { failures: 2, calls: AtomicU32::new(0) },
            3,
            Duration::ZERO,
        );
        assert_eq!(lookup.get_groups("bob").unwrap(), vec!["ops"]);
        assert_eq!(lookup.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_retry_gives_up() {
        let lookup = RetryingLookup::new(
            Flaky { failures: 5, calls: AtomicU32::new(0) },
            2,
            Duration::ZERO,
        );
        assert!(lookup.get_groups("bob").unwrap_err().is_transient());
        assert_eq!(lookup.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_retry_does_not_retry_not_found() {
        let lookup = RetryingLookup::new(StaticGroupLookup::new(), 5, Duration::ZERO);
        assert!(lookup.get_groups("nobody").unwrap_err().is_not_found());
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let lookup = RetryingLookup::new(StaticGroupLookup::new(), 0, Duration::ZERO);
        assert_eq!(lookup.max_attempts(), 1);
    }
}

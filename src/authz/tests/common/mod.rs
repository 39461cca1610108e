//! Stub group lookups shared by the integration tests

#![allow(dead_code)]

use aclcheck_authz::{GroupLookup, LookupError, StaticGroupLookup};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fails the test if the group service is ever consulted
pub struct PanickingLookup;

impl GroupLookup for PanickingLookup {
    fn get_groups(&self, username: &str) -> Result<Vec<String>, LookupError> {
        panic!("unexpected group lookup for {:?}", username);
    }
}

/// Always fails with an opaque error
pub struct FailingLookup;

impl GroupLookup for FailingLookup {
    fn get_groups(&self, _username: &str) -> Result<Vec<String>, LookupError> {
        Err(LookupError::Other(anyhow::anyhow!("connection refused")))
    }
}

/// Static directory that counts calls per lookup
#[derive(Default)]
pub struct CountingLookup {
    pub directory: StaticGroupLookup,
    calls: AtomicUsize,
    failing: std::sync::atomic::AtomicBool,
}

impl CountingLookup {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make subsequent lookups fail with a transient error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl GroupLookup for CountingLookup {
    fn get_groups(&self, username: &str) -> Result<Vec<String>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(LookupError::Unavailable("service down".into()));
        }
        self.directory.get_groups(username)
    }
}

pub fn acl(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

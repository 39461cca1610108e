//! # ACL Check
//!
//! Decides whether a user is admitted by an access-control list of user and
//! group names, going to the group service as rarely as possible.
//!
//! ## Components
//!
//! - **Trivial evaluation** ([`pattern`]) of names and `everyone` wildcards
//! - **Group cache** ([`cache`]) with lazy TTL expiry and explicit eviction
//! - **Permission checker** ([`checker`]) combining the two
//! - **Domain stripping** ([`strip`]) for identity services that qualify names
//!
//! ## Example
//!
//! ```rust
//! use aclcheck_authz::{PermChecker, StaticGroupLookup};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let lookup = StaticGroupLookup::new();
//! lookup.add_user("bob", ["beatles"]);
//!
//! let checker = PermChecker::new(lookup, Duration::from_secs(3600));
//!
//! assert!(checker.allow("bob", &["beatles"])?);
//! assert!(checker.allow("joe", &["everyone"])?);
//! assert!(!checker.allow("joe", &["beatles"])?);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod checker;
pub mod config;
pub mod error;
pub mod identity;
pub mod lookup;
pub mod pattern;
pub mod strip;

// Re-export commonly used types
pub use cache::{CacheStats, GroupCache, GroupSet};
pub use checker::PermChecker;
pub use config::{CheckerConfig, RetryConfig};
pub use error::{AuthzError, LookupError, Result};
pub use identity::{
    AclUser, BasicIdentity, CheckedUser, CheckerIdentityClient, DeclaredIdentity, Identity,
    IdentityClient,
};
pub use lookup::{GroupLookup, RetryingLookup, StaticGroupLookup};
pub use pattern::{evaluate, Verdict, Wildcard};
pub use strip::{DomainStrippingUser, DomainSuffix, StripDomain};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

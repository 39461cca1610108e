//! Identity capabilities
//!
//! An identity service hands back a [`DeclaredIdentity`]. Some identities
//! only carry an id; others are [`AclUser`]s that can also report their
//! username and groups and answer ACL queries. The variant is decided once,
//! when the identity is declared, so callers match on it instead of probing
//! for capabilities.

use crate::checker::PermChecker;
use crate::error::{AuthzError, Result};
use std::collections::HashMap;

/// Attribute carrying the declared username
pub const USERNAME_ATTR: &str = "username";

/// A principal established by some authentication mechanism
pub trait Identity: Send + Sync {
    /// Unique identifier of the identity
    fn id(&self) -> &str;

    /// Domain the identity belongs to, empty if none
    fn domain(&self) -> &str {
        ""
    }
}

/// An identity that can be queried for group information
pub trait AclUser: Identity {
    /// The user name of the user
    fn username(&self) -> Result<String>;

    /// All groups the user is a member of.
    ///
    /// Prefer [`allow`](Self::allow) where possible; a user may be in a very
    /// large number of groups.
    fn groups(&self) -> Result<Vec<String>>;

    /// Whether the user may access any of the users or groups in `acl`
    fn allow(&self, acl: &[String]) -> Result<bool>;
}

impl<T: Identity + ?Sized> Identity for Box<T> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn domain(&self) -> &str {
        (**self).domain()
    }
}

impl<T: AclUser + ?Sized> AclUser for Box<T> {
    fn username(&self) -> Result<String> {
        (**self).username()
    }

    fn groups(&self) -> Result<Vec<String>> {
        (**self).groups()
    }

    fn allow(&self, acl: &[String]) -> Result<bool> {
        (**self).allow(acl)
    }
}

/// An identity as declared by an [`IdentityClient`]
pub enum DeclaredIdentity {
    /// Identity without group capabilities
    Basic(Box<dyn Identity>),
    /// Identity that supports ACL queries
    Acl(Box<dyn AclUser>),
}

impl DeclaredIdentity {
    /// Identifier of the underlying identity
    pub fn id(&self) -> &str {
        match self {
            DeclaredIdentity::Basic(identity) => identity.id(),
            DeclaredIdentity::Acl(user) => user.id(),
        }
    }

    /// Domain of the underlying identity
    pub fn domain(&self) -> &str {
        match self {
            DeclaredIdentity::Basic(identity) => identity.domain(),
            DeclaredIdentity::Acl(user) => user.domain(),
        }
    }

    /// The ACL capabilities, if the identity has them
    pub fn as_acl_user(&self) -> Option<&dyn AclUser> {
        match self {
            DeclaredIdentity::Basic(_) => None,
            DeclaredIdentity::Acl(user) => Some(&**user),
        }
    }

    /// Take the ACL capabilities, if the identity has them
    pub fn into_acl_user(self) -> Option<Box<dyn AclUser>> {
        match self {
            DeclaredIdentity::Basic(_) => None,
            DeclaredIdentity::Acl(user) => Some(user),
        }
    }
}

impl std::fmt::Debug for DeclaredIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            DeclaredIdentity::Basic(_) => "Basic",
            DeclaredIdentity::Acl(_) => "Acl",
        };
        f.debug_struct("DeclaredIdentity")
            .field("kind", &kind)
            .field("id", &self.id())
            .finish()
    }
}

/// Turns declared attributes into identities
pub trait IdentityClient: Send + Sync {
    /// Build the identity described by `attrs`
    fn declared_identity(&self, attrs: &HashMap<String, String>) -> Result<DeclaredIdentity>;
}

/// Plain identity carrying only an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicIdentity {
    id: String,
    domain: String,
}

impl BasicIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: String::new(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }
}

impl Identity for BasicIdentity {
    fn id(&self) -> &str {
        &self.id
    }

    fn domain(&self) -> &str {
        &self.domain
    }
}

/// A user whose ACL queries are answered by a [`PermChecker`]
#[derive(Debug, Clone)]
pub struct CheckedUser {
    username: String,
    checker: PermChecker,
}

impl CheckedUser {
    pub fn new(username: impl Into<String>, checker: PermChecker) -> Self {
        Self {
            username: username.into(),
            checker,
        }
    }
}

impl Identity for CheckedUser {
    fn id(&self) -> &str {
        &self.username
    }
}

impl AclUser for CheckedUser {
    fn username(&self) -> Result<String> {
        Ok(self.username.clone())
    }

    fn groups(&self) -> Result<Vec<String>> {
        self.checker.groups(&self.username)
    }

    fn allow(&self, acl: &[String]) -> Result<bool> {
        self.checker.allow(&self.username, acl)
    }
}

/// Identity client declaring [`CheckedUser`]s from a `username` attribute
#[derive(Debug, Clone)]
pub struct CheckerIdentityClient {
    checker: PermChecker,
}

impl CheckerIdentityClient {
    pub fn new(checker: PermChecker) -> Self {
        Self { checker }
    }

    pub fn checker(&self) -> &PermChecker {
        &self.checker
    }
}

impl IdentityClient for CheckerIdentityClient {
    fn declared_identity(&self, attrs: &HashMap<String, String>) -> Result<DeclaredIdentity> {
        let username = attrs
            .get(USERNAME_ATTR)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AuthzError::Identity("no username declared".into()))?;
        Ok(DeclaredIdentity::Acl(Box::new(CheckedUser::new(
            username.clone(),
            self.checker.clone(),
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::StaticGroupLookup;
    use std::time::Duration;

    fn client() -> CheckerIdentityClient {
        let lookup = StaticGroupLookup::new();
        lookup.add_user("bob", ["beatles", "wings"]);
        CheckerIdentityClient::new(PermChecker::new(lookup, Duration::from_secs(3600)))
    }

    fn attrs(username: &str) -> HashMap<String, String> {
        HashMap::from([(USERNAME_ATTR.to_string(), username.to_string())])
    }

    #[test]
    fn test_declared_user_is_acl_capable() {
        let identity = client().declared_identity(&attrs("bob")).unwrap();
        assert_eq!(identity.id(), "bob");

        let user = identity.as_acl_user().expect("ACL user");
        assert_eq!(user.username().unwrap(), "bob");
        assert_eq!(user.groups().unwrap(), vec!["beatles", "wings"]);
        assert!(user.allow(&["wings".to_string()]).unwrap());
        assert!(!user.allow(&["stones".to_string()]).unwrap());
    }

    #[test]
    fn test_missing_username() {
        let result = client().declared_identity(&HashMap::new());
        assert!(matches!(result, Err(AuthzError::Identity(_))));
    }

    #[test]
    fn test_basic_identity_has_no_acl_capabilities() {
        let identity = DeclaredIdentity::Basic(Box::new(
            BasicIdentity::new("agent").with_domain("admin"),
        ));
        assert_eq!(identity.id(), "agent");
        assert_eq!(identity.domain(), "admin");
        assert!(identity.as_acl_user().is_none());
        assert!(identity.into_acl_user().is_none());
    }
}

//! Domain stripping
//!
//! When an identity service starts qualifying names with a domain (for
//! example `bob` becomes `bob@usso`), existing consumers still expect bare
//! names. [`StripDomain`] wraps an [`IdentityClient`] so that user and group
//! names come back without the domain, while ACL queries have the domain
//! added to unqualified names.

use crate::error::Result;
use crate::identity::{AclUser, DeclaredIdentity, Identity, IdentityClient};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::debug;

/// A `@<domain>` suffix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainSuffix(String);

impl DomainSuffix {
    /// Suffix for `domain`, given without the leading `@`
    pub fn new(domain: &str) -> Self {
        Self(format!("@{}", domain))
    }

    /// The domain without the leading `@`
    pub fn domain(&self) -> &str {
        &self.0[1..]
    }

    /// The suffix including the leading `@`
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `name` without a trailing suffix, if it has one
    pub fn strip<'a>(&self, name: &'a str) -> &'a str {
        name.strip_suffix(self.0.as_str()).unwrap_or(name)
    }

    /// `name` with the suffix added, unless it already names a domain
    pub fn qualify<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if name.contains('@') {
            Cow::Borrowed(name)
        } else {
            Cow::Owned(format!("{}{}", name, self.0))
        }
    }
}

/// Identity client that strips a domain from the users it declares.
///
/// Users that are [`AclUser`]s are wrapped in a [`DomainStrippingUser`];
/// other identities pass through unchanged.
pub struct StripDomain<C> {
    client: C,
    suffix: DomainSuffix,
}

impl<C: IdentityClient> StripDomain<C> {
    /// Wrap `client`, stripping `@<domain>` from names
    pub fn new(client: C, domain: &str) -> Self {
        Self {
            client,
            suffix: DomainSuffix::new(domain),
        }
    }

    /// The stripped domain
    pub fn domain(&self) -> &str {
        self.suffix.domain()
    }

    /// The wrapped client
    pub fn inner(&self) -> &C {
        &self.client
    }
}

impl<C: IdentityClient> IdentityClient for StripDomain<C> {
    fn declared_identity(&self, attrs: &HashMap<String, String>) -> Result<DeclaredIdentity> {
        match self.client.declared_identity(attrs)? {
            DeclaredIdentity::Acl(user) => Ok(DeclaredIdentity::Acl(Box::new(
                DomainStrippingUser::new(user, self.suffix.clone()),
            ))),
            identity => Ok(identity),
        }
    }
}

/// [`AclUser`] decorator that hides a domain suffix
#[derive(Debug, Clone)]
pub struct DomainStrippingUser<U> {
    user: U,
    suffix: DomainSuffix,
}

impl<U: AclUser> DomainStrippingUser<U> {
    pub fn new(user: U, suffix: DomainSuffix) -> Self {
        Self { user, suffix }
    }

    /// The wrapped user
    pub fn inner(&self) -> &U {
        &self.user
    }
}

impl<U: AclUser> Identity for DomainStrippingUser<U> {
    fn id(&self) -> &str {
        self.user.id()
    }

    fn domain(&self) -> &str {
        self.user.domain()
    }
}

impl<U: AclUser> AclUser for DomainStrippingUser<U> {
    fn username(&self) -> Result<String> {
        let name = self.user.username()?;
        Ok(self.suffix.strip(&name).to_string())
    }

    fn groups(&self) -> Result<Vec<String>> {
        let groups = self.user.groups()?;
        Ok(groups
            .iter()
            .map(|group| self.suffix.strip(group).to_string())
            .collect())
    }

    fn allow(&self, acl: &[String]) -> Result<bool> {
        let qualified: Vec<String> = acl
            .iter()
            .map(|name| self.suffix.qualify(name).into_owned())
            .collect();
        if self.user.allow(&qualified)? {
            return Ok(true);
        }
        // The identity service may not be adding the domain yet.
        debug!(domain = self.suffix.domain(), "denied with domain added, retrying bare ACL");
        self.user.allow(acl)
    }
}

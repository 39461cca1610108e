//! Trivial ACL evaluation
//!
//! Decides as much as possible about an ACL from the names alone, so that the
//! group service is only consulted when an entry could name a group the user
//! belongs to.
//!
//! Recognized wildcard entries:
//! - `everyone` - any user
//! - `everyone-local` - any user without a domain (no `@` in the name)
//! - `everyone@<domain>` - any user whose name ends with `@<domain>`
//! - `everyone-local@<domain>` - `<name>@<domain>` where `<name>` has no `@`
//!
//! The keyword must end at a domain boundary or the end of the string, so
//! `everyonex` and `everyone-localx` are ordinary names.

/// ACL entry prefix that introduces a wildcard
pub const EVERYONE: &str = "everyone";

const LOCAL: &str = "-local";

/// Outcome of a trivial ACL evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Access is granted without a group lookup
    Allow,
    /// Access is denied without a group lookup
    Deny,
    /// A group lookup is needed to decide
    Undecided,
}

impl Verdict {
    /// Whether the verdict can be trusted without a group lookup
    pub fn is_decisive(self) -> bool {
        !matches!(self, Verdict::Undecided)
    }

    /// Whether access is granted; `Undecided` counts as not granted
    pub fn allowed(self) -> bool {
        matches!(self, Verdict::Allow)
    }

    /// The `(allowed, is_decisive)` pair form of the verdict
    pub fn as_pair(self) -> (bool, bool) {
        (self.allowed(), self.is_decisive())
    }
}

/// A parsed `everyone[-local][@domain]` ACL entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wildcard<'a> {
    local: bool,
    /// Either empty or `@<domain>`
    suffix: &'a str,
}

impl<'a> Wildcard<'a> {
    /// Parse an ACL entry, returning `None` if it is not a wildcard
    pub fn parse(name: &'a str) -> Option<Self> {
        let rest = name.strip_prefix(EVERYONE)?;
        let (local, rest) = match rest.strip_prefix(LOCAL) {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        if !rest.is_empty() && !rest.starts_with('@') {
            return None;
        }
        Some(Self { local, suffix: rest })
    }

    /// Whether only users without extra domain segments are admitted
    pub fn is_local(&self) -> bool {
        self.local
    }

    /// The required domain, without the leading `@`
    pub fn domain(&self) -> Option<&'a str> {
        self.suffix.strip_prefix('@')
    }

    /// Whether this wildcard admits `username`
    pub fn admits(&self, username: &str) -> bool {
        let prefix = if self.suffix.is_empty() {
            username
        } else {
            match username.strip_suffix(self.suffix) {
                Some(prefix) => prefix,
                None => return false,
            }
        };
        !(self.local && prefix.contains('@'))
    }
}

/// Evaluate `acl` for `username` without consulting the group service.
///
/// Returns [`Verdict::Allow`] if the username itself or a wildcard admitting
/// it appears in the ACL. Returns [`Verdict::Deny`] for an empty ACL, or when
/// every entry is a wildcard and none admits the user. Otherwise some entry
/// may be a group and the result is [`Verdict::Undecided`].
pub fn evaluate<S: AsRef<str>>(username: &str, acl: &[S]) -> Verdict {
    if acl.is_empty() {
        return Verdict::Deny;
    }
    let mut all_wildcards = true;
    for name in acl {
        let name = name.as_ref();
        if name == username {
            return Verdict::Allow;
        }
        match Wildcard::parse(name) {
            Some(wildcard) if wildcard.admits(username) => return Verdict::Allow,
            Some(_) => {}
            None => all_wildcards = false,
        }
    }
    if all_wildcards {
        Verdict::Deny
    } else {
        Verdict::Undecided
    }
}

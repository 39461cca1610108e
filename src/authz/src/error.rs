//! Error types for the ACL checker

use thiserror::Error;

/// Errors reported by a [`GroupLookup`](crate::lookup::GroupLookup) collaborator
#[derive(Debug, Error)]
pub enum LookupError {
    /// The user is unknown to the identity service
    #[error("user {0:?} not found")]
    NotFound(String),

    /// Transient failure (network, overloaded service); may be retried
    #[error("group service unavailable: {0}")]
    Unavailable(String),

    /// Any other failure (authorization, malformed response, ...)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LookupError {
    /// Whether the failure is worth another attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, LookupError::Unavailable(_))
    }

    /// Whether the service reported the user as unknown
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound(_))
    }
}

/// ACL checker errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// The group lookup failed for a reason other than "user not found"
    #[error("cannot fetch groups for {username:?}: {source}")]
    LookupFailure {
        username: String,
        #[source]
        source: LookupError,
    },

    /// An identity could not provide the requested information
    #[error("identity error: {0}")]
    Identity(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthzError {
    pub(crate) fn lookup(username: &str, source: LookupError) -> Self {
        AuthzError::LookupFailure {
            username: username.to_string(),
            source,
        }
    }
}

/// Result type for ACL checker operations
pub type Result<T> = std::result::Result<T, AuthzError>;

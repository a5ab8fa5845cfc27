//! Error types for the authorization flow
//!
//! Every failure in the builder, callback or gate paths maps onto one of these
//! variants. None of them is fatal to a page render: the gate turns them into
//! a retryable locked state.

use std::fmt;

/// Authorization flow errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing or malformed client configuration (`auth_url`, `client_id`, ...)
    Configuration(String),

    /// The user left before the redirect to the provider happened
    NavigationAbort,

    /// The identity provider rejected the request
    Provider {
        error: String,
        description: Option<String>,
    },

    /// Callback parameters missing or unreadable
    InvalidCallback(String),

    /// No pending authorization matches the returned `state`
    StateMismatch,

    /// Verifier storage could not be read or written
    Storage(String),

    /// Token endpoint refused the code or answered with garbage
    TokenExchange(String),

    /// Transport-level failure talking to the provider
    Network(String),
}

impl AuthError {
    /// Whether the gate should show an inline error for this failure
    ///
    /// A navigation abort is a user decision, not an error.
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, AuthError::NavigationAbort)
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            AuthError::NavigationAbort => write!(f, "Navigation aborted before redirect"),
            AuthError::Provider {
                error,
                description: Some(description),
            } => write!(f, "OAuth provider error: {error} ({description})"),
            AuthError::Provider {
                error,
                description: None,
            } => write!(f, "OAuth provider error: {error}"),
            AuthError::InvalidCallback(msg) => write!(f, "Invalid OAuth callback: {msg}"),
            AuthError::StateMismatch => {
                write!(f, "OAuth state mismatch: no pending authorization for state")
            }
            AuthError::Storage(msg) => write!(f, "Verifier storage error: {msg}"),
            AuthError::TokenExchange(msg) => write!(f, "Token exchange failed: {msg}"),
            AuthError::Network(msg) => write!(f, "Network error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

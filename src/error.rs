//! Error types for authorization resolution.

use thiserror::Error;

/// Result type alias using [`AuthError`].
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while resolving or reading credentials.
///
/// "No authentication" is not an error: it is reported as
/// [`Authorization::None`](crate::Authorization::None).
#[derive(Debug, Error)]
pub enum AuthError {
    /// The session factory could not build a signing session
    /// (unknown profile, no discoverable credentials, network failure).
    #[error("session construction failed: {0}")]
    SessionConstruction(String),

    /// The credential source could not produce current credentials.
    ///
    /// This surfaces when a [`RefreshableCredentials`](crate::RefreshableCredentials)
    /// accessor is read, which may be long after `resolve` returned.
    #[error("credential refresh failed: {0}")]
    CredentialRefresh(String),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AuthError {
    /// Returns true if this error came from the session factory.
    pub fn is_session_construction(&self) -> bool {
        matches!(self, Self::SessionConstruction(_))
    }

    /// Returns true if this error came from a credential source read.
    pub fn is_credential_refresh(&self) -> bool {
        matches!(self, Self::CredentialRefresh(_))
    }
}

//! Domain service for admin authentication and sessions.
//!
//! Handles login (session issuance), bearer-token validation, logout
//! (revocation) and admin identity creation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::db::AdminIdentity;

/// Errors specific to authentication operations.
///
/// The `Display` text of the first two variants is what clients see, so it
/// must not reveal which check failed.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password; indistinguishable on purpose.
    #[error("Invalid credentials")]
    AuthenticationFailed,

    /// Missing, unknown, revoked or expired bearer token.
    #[error("Invalid or expired session")]
    SessionInvalid,

    #[error("Admin user already exists: {0}")]
    DuplicateIdentity(String),

    /// Persistence unreachable or misbehaving. Not a security decision.
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Infrastructure(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(dup) = err.downcast_ref::<crate::db::DuplicateUsername>() {
            return Self::DuplicateIdentity(dup.0.clone());
        }
        Self::Infrastructure(format!("{err:#}"))
    }
}

/// Result of a successful login. `token` is the only thing a client needs
/// for subsequent requests.
#[derive(Clone, Serialize)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub username: String,
}

impl std::fmt::Debug for IssuedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedSession")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("username", &self.username)
            .finish()
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a new session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AuthenticationFailed`] for an unknown username and
    /// for a wrong password alike.
    async fn login(&self, username: &str, password: &str) -> Result<IssuedSession, AuthError>;

    /// Resolves a bearer token to its owning identity. Read-only.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionInvalid`] if the token is absent, unknown,
    /// or expired.
    async fn validate(&self, token: Option<&str>) -> Result<AdminIdentity, AuthError>;

    /// Deletes the session for `token`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionInvalid`] if no such session exists; nothing
    /// else happens in that case, so retrying is safe.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;

    /// Hashes `password` and stores a new identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::DuplicateIdentity`] if the username is taken.
    async fn create_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminIdentity, AuthError>;

    /// Removes sessions that have already expired; returns how many.
    async fn prune_expired_sessions(&self) -> Result<u64, AuthError>;
}

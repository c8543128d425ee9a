//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{TryRngCore, rngs::OsRng};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::SecurityConfig;
use crate::db::{AdminIdentity, Store};
use crate::services::auth_service::{AuthError, AuthService, IssuedSession};
use crate::services::password;

/// Source of "now"; swapped out in tests to move past session expiry.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Password checked when the username is unknown, so both failure paths do
/// the same Argon2 work.
const DUMMY_PASSWORD: &str = "siteadmin-unknown-user-placeholder";

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
    clock: Clock,
    dummy_hash: OnceCell<String>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, security: SecurityConfig) -> Self {
        Self {
            store,
            security,
            clock: Arc::new(Utc::now),
            dummy_hash: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Computes the hash used for unknown-username logins ahead of the first
    /// such request.
    pub async fn warm_up(&self) -> Result<(), AuthError> {
        self.dummy_hash().await.map(|_| ())
    }

    async fn dummy_hash(&self) -> Result<&String, AuthError> {
        Ok(self
            .dummy_hash
            .get_or_try_init(|| password::hash_password_blocking(DUMMY_PASSWORD, &self.security))
            .await?)
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    async fn burn_dummy_verification(&self, password: &str) -> Result<(), AuthError> {
        let dummy_hash = self.dummy_hash().await?;
        password::verify_password_blocking(password, dummy_hash).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let Some((identity, password_hash)) = self.store.find_admin_credentials(username).await?
        else {
            self.burn_dummy_verification(password).await?;
            debug!(username, "Login rejected: unknown username");
            metrics::counter!("auth_logins_total", "outcome" => "failure").increment(1);
            return Err(AuthError::AuthenticationFailed);
        };

        if !password::verify_password_blocking(password, &password_hash).await? {
            debug!(username, "Login rejected: password mismatch");
            metrics::counter!("auth_logins_total", "outcome" => "failure").increment(1);
            return Err(AuthError::AuthenticationFailed);
        }

        let token = generate_session_token()?;
        let now = self.now();
        let expires_at = now + self.security.session_lifetime();

        let session = self
            .store
            .create_session_for_login(&token, identity.id, expires_at, now)
            .await?;

        metrics::counter!("auth_logins_total", "outcome" => "success").increment(1);
        info!(username = %identity.username, expires_at = %session.expires_at, "Admin logged in");

        Ok(IssuedSession {
            token: session.token,
            expires_at: session.expires_at,
            username: identity.username,
        })
    }

    async fn validate(&self, token: Option<&str>) -> Result<AdminIdentity, AuthError> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Err(AuthError::SessionInvalid);
        };

        let Some((session, owner)) = self.store.find_session_with_owner(token).await? else {
            return Err(AuthError::SessionInvalid);
        };

        if session.is_expired_at(self.now()) {
            debug!(user_id = session.user_id, "Rejected expired session");
            return Err(AuthError::SessionInvalid);
        }

        owner.ok_or(AuthError::SessionInvalid)
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        if token.is_empty() || !self.store.delete_session(token).await? {
            return Err(AuthError::SessionInvalid);
        }

        info!("Session revoked");
        Ok(())
    }

    async fn create_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminIdentity, AuthError> {
        let password_hash = password::hash_password_blocking(password, &self.security).await?;
        let identity = self.store.create_admin(username, &password_hash).await?;

        info!(username = %identity.username, "Admin user created");
        Ok(identity)
    }

    async fn prune_expired_sessions(&self) -> Result<u64, AuthError> {
        let removed = self.store.prune_expired_sessions(self.now()).await?;
        if removed > 0 {
            info!(removed, "Pruned expired sessions");
        } else {
            debug!("No expired sessions to prune");
        }
        Ok(removed)
    }
}

/// Generate a session token: 32 bytes from the OS CSPRNG as 64 hex chars.
pub fn generate_session_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; 32];
    OsRng.try_fill_bytes(&mut bytes).map_err(|e| {
        warn!("OS random source failed: {e}");
        AuthError::Infrastructure(format!("Random source unavailable: {e}"))
    })?;

    Ok(bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_session_tokens_are_long_and_unique() {
        let tokens: HashSet<String> = (0..64)
            .map(|_| generate_session_token().unwrap())
            .collect();

        assert_eq!(tokens.len(), 64);
        for token in &tokens {
            assert_eq!(token.len(), 64);
            assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_anyhow_duplicate_maps_to_duplicate_identity() {
        let err: anyhow::Error = crate::db::DuplicateUsername("admin".to_string()).into();
        assert!(matches!(
            AuthError::from(err),
            AuthError::DuplicateIdentity(name) if name == "admin"
        ));

        let err = anyhow::anyhow!("pool timed out");
        assert!(matches!(AuthError::from(err), AuthError::Infrastructure(_)));
    }

    #[tokio::test]
    async fn test_warm_up_prepares_dummy_hash_once() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let security = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..SecurityConfig::default()
        };
        let auth = SeaOrmAuthService::new(store, security);
        assert!(auth.dummy_hash.get().is_none());

        auth.warm_up().await.unwrap();
        let prepared = auth.dummy_hash.get().cloned().unwrap();
        assert!(prepared.starts_with("$argon2id$"));

        // An unknown-username login reuses the prepared hash
        assert!(matches!(
            auth.login("nosuchuser", "x").await,
            Err(AuthError::AuthenticationFailed)
        ));
        assert_eq!(auth.dummy_hash.get(), Some(&prepared));
    }

    #[test]
    fn test_auth_failures_share_one_message() {
        assert_eq!(AuthError::AuthenticationFailed.to_string(), "Invalid credentials");
        assert_eq!(
            AuthError::SessionInvalid.to_string(),
            "Invalid or expired session"
        );
    }
}

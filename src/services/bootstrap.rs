//! First-start admin provisioning.

use tracing::{debug, info, warn};

use crate::config::BootstrapConfig;
use crate::services::{AuthError, AuthService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Created,
    AlreadyPresent,
    /// No identity exists and no password was configured.
    Skipped,
}

/// Create the default admin when the store holds no identity at all.
///
/// Never touches an existing identity: re-running against a populated store
/// leaves every stored hash as it was.
pub async fn ensure_bootstrap_admin(
    auth: &dyn AuthService,
    store: &crate::db::Store,
    config: &BootstrapConfig,
) -> Result<BootstrapOutcome, AuthError> {
    let existing = store.count_admins().await?;
    if existing > 0 {
        debug!(existing, "Admin users present, skipping bootstrap");
        return Ok(BootstrapOutcome::AlreadyPresent);
    }

    let Some(password) = config.password.as_deref().filter(|p| !p.is_empty()) else {
        warn!(
            "No admin users exist and no bootstrap password is configured; \
             set SITEADMIN_BOOTSTRAP_PASSWORD or run `siteadmin admin create`"
        );
        return Ok(BootstrapOutcome::Skipped);
    };

    match auth.create_admin(&config.username, password).await {
        Ok(identity) => {
            info!(username = %identity.username, "Bootstrap admin created");
            Ok(BootstrapOutcome::Created)
        }
        // Another process bootstrapped between our lookup and insert
        Err(AuthError::DuplicateIdentity(_)) => Ok(BootstrapOutcome::AlreadyPresent),
        Err(e) => Err(e),
    }
}

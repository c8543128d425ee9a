//! Admin identity command handlers

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthError, AuthService, SeaOrmAuthService};

pub async fn cmd_admin_create(
    config: &Config,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    if username.trim().is_empty() {
        anyhow::bail!("Username cannot be empty");
    }
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let store = Store::from_config(&config.general).await?;
    let auth = SeaOrmAuthService::new(store.clone(), config.security.clone());

    let result = auth.create_admin(username, password).await;
    store.close().await?;

    match result {
        Ok(identity) => {
            println!("✓ Created admin user '{}' (id {})", identity.username, identity.id);
            Ok(())
        }
        Err(AuthError::DuplicateIdentity(name)) => {
            anyhow::bail!("Admin user '{name}' already exists")
        }
        Err(e) => Err(e.into()),
    }
}

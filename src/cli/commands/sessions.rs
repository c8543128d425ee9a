//! Session maintenance command handlers

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, SeaOrmAuthService};

pub async fn cmd_sessions_prune(config: &Config) -> anyhow::Result<()> {
    let store = Store::from_config(&config.general).await?;
    let auth = SeaOrmAuthService::new(store.clone(), config.security.clone());

    let removed = auth.prune_expired_sessions().await?;
    store.close().await?;

    println!("Removed {removed} expired session(s)");
    Ok(())
}

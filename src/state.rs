use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, SeaOrmAuthService, ensure_bootstrap_admin};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    /// Opens the store, applies migrations and provisions the bootstrap
    /// admin if needed.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::from_config(&config.general).await?;
        Self::with_store(config, store).await
    }

    pub async fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let auth = SeaOrmAuthService::new(store.clone(), config.security.clone());
        auth.warm_up()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to prepare auth service: {e}"))?;

        let auth_service = Arc::new(auth) as Arc<dyn AuthService>;
        Self::with_auth_service(config, store, auth_service).await
    }

    pub async fn with_auth_service(
        config: Config,
        store: Store,
        auth_service: Arc<dyn AuthService>,
    ) -> anyhow::Result<Self> {
        ensure_bootstrap_admin(auth_service.as_ref(), &store, &config.bootstrap)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bootstrap admin user: {e}"))?;

        Ok(Self {
            config: Arc::new(config),
            store,
            auth_service,
        })
    }
}

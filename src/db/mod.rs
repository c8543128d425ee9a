use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::document::Document;
pub use repositories::session::Session;
pub use repositories::user::{AdminIdentity, DuplicateUsername};

/// Lifetime given to the lone `:memory:` connection. Replacing it would
/// swap in a fresh, unmigrated database.
const MEMORY_CONNECTION_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn connect_options(
    db_url: &str,
    max_connections: u32,
    min_connections: u32,
    timeout: Duration,
) -> ConnectOptions {
    let mut opt = ConnectOptions::new(db_url.to_string());
    opt.connect_timeout(timeout)
        .acquire_timeout(timeout)
        .sqlx_logging(false);

    // Every connection to `:memory:` is its own database, so the pool holds
    // exactly one and keeps it past sqlx's idle and lifetime defaults.
    if db_url.contains(":memory:") {
        opt.max_connections(1)
            .min_connections(1)
            .idle_timeout(MEMORY_CONNECTION_LIFETIME)
            .max_lifetime(MEMORY_CONNECTION_LIFETIME);
    } else {
        opt.max_connections(max_connections)
            .min_connections(min_connections.min(max_connections))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600));
    }

    opt
}

/// Handle to the shared database. Cloning shares the underlying pool.
///
/// Opened once at process start and passed explicitly to everything that
/// needs persistence; [`Store::close`] drains the pool on shutdown.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1, Duration::from_secs(10)).await
    }

    pub async fn from_config(config: &crate::config::GeneralConfig) -> Result<Self> {
        Self::with_pool_options(
            &config.database_url,
            config.max_db_connections,
            config.min_db_connections,
            Duration::from_secs(config.db_timeout_seconds),
        )
        .await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
        timeout: Duration,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file: {path_str}"))?;
            }
        }

        let opt = connect_options(db_url, max_connections, min_connections, timeout);
        let conn = Database::connect(opt)
            .await
            .context("Failed to connect to database")?;

        migrator::Migrator::up(&conn, None)
            .await
            .context("Failed to apply database migrations")?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            if in_memory { 1 } else { min_connections },
            if in_memory { 1 } else { max_connections }
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .context("Failed to close database pool")
    }

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn document_repo(&self) -> repositories::document::DocumentRepository {
        repositories::document::DocumentRepository::new(self.conn.clone())
    }

    // ========== Credential Store ==========

    pub async fn find_admin_by_username(&self, username: &str) -> Result<Option<AdminIdentity>> {
        self.user_repo().find_by_username(username).await
    }

    pub async fn find_admin_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(AdminIdentity, String)>> {
        self.user_repo().find_credentials(username).await
    }

    pub async fn create_admin(&self, username: &str, password_hash: &str) -> Result<AdminIdentity> {
        self.user_repo().create(username, password_hash).await
    }

    pub async fn count_admins(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    // ========== Session Store ==========

    pub async fn create_session_for_login(
        &self,
        token: &str,
        user_id: i32,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Session> {
        self.session_repo()
            .create_for_login(token, user_id, expires_at, now)
            .await
    }

    pub async fn find_session_with_owner(
        &self,
        token: &str,
    ) -> Result<Option<(Session, Option<AdminIdentity>)>> {
        self.session_repo().find_with_owner(token).await
    }

    pub async fn delete_session(&self, token: &str) -> Result<bool> {
        self.session_repo().delete(token).await
    }

    pub async fn prune_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        self.session_repo().prune_expired(now).await
    }

    // ========== Documents ==========

    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        self.document_repo().list().await
    }

    pub async fn get_document(&self, id: i32) -> Result<Option<Document>> {
        self.document_repo().get(id).await
    }

    pub async fn create_document(
        &self,
        title: &str,
        body: &str,
        created_by: i32,
    ) -> Result<Document> {
        self.document_repo().create(title, body, created_by).await
    }

    pub async fn delete_document(&self, id: i32) -> Result<bool> {
        self.document_repo().delete(id).await
    }
}

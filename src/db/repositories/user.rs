use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set, SqlErr, sea_query::Expr,
};
use thiserror::Error;

use crate::entities::admin_users;

/// Admin identity returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub id: i32,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<admin_users::Model> for AdminIdentity {
    fn from(model: admin_users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            created_at: model.created_at,
            last_login: model.last_login,
        }
    }
}

/// Raised by [`UserRepository::create`] when the username is taken.
#[derive(Debug, Error)]
#[error("Admin user already exists: {0}")]
pub struct DuplicateUsername(pub String);

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Exact, case-sensitive lookup
    pub async fn find_by_username(&self, username: &str) -> Result<Option<AdminIdentity>> {
        let user = admin_users::Entity::find()
            .filter(admin_users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query admin user by username")?;

        Ok(user.map(AdminIdentity::from))
    }

    /// Get user by username with password hash (for credential checks)
    pub async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<(AdminIdentity, String)>> {
        let user = admin_users::Entity::find()
            .filter(admin_users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query admin user credentials")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (AdminIdentity::from(u), password_hash)
        }))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<AdminIdentity>> {
        let user = admin_users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query admin user by ID")?;

        Ok(user.map(AdminIdentity::from))
    }

    pub async fn count(&self) -> Result<u64> {
        admin_users::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count admin users")
    }

    /// Insert a new identity. `password_hash` must already be hashed.
    ///
    /// Fails with [`DuplicateUsername`] (inside the `anyhow::Error`) when the
    /// username exists, including when a concurrent insert wins the race.
    pub async fn create(&self, username: &str, password_hash: &str) -> Result<AdminIdentity> {
        if self.find_by_username(username).await?.is_some() {
            return Err(DuplicateUsername(username.to_string()).into());
        }

        let active = admin_users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(Utc::now()),
            last_login: Set(None),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(AdminIdentity::from(model)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(DuplicateUsername(username.to_string()).into())
            }
            Err(e) => Err(anyhow::Error::new(e).context("Failed to insert admin user")),
        }
    }

    pub async fn touch_last_login(&self, id: i32, at: DateTime<Utc>) -> Result<()> {
        touch_last_login_on(&self.conn, id, at).await
    }
}

/// `last_login` update usable inside a transaction.
pub(crate) async fn touch_last_login_on<C>(db: &C, id: i32, at: DateTime<Utc>) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = admin_users::Entity::update_many()
        .col_expr(admin_users::Column::LastLogin, Expr::value(at))
        .filter(admin_users::Column::Id.eq(id))
        .exec(db)
        .await
        .context("Failed to update last login")?;

    if result.rows_affected == 0 {
        anyhow::bail!("Admin user not found: {id}");
    }

    Ok(())
}

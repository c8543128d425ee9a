use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use std::fmt;

use super::user::{AdminIdentity, touch_last_login_on};
use crate::entities::{admin_users, sessions};

/// A persisted login session. `token` is the bearer credential itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Expired from the instant `now` reaches `expires_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// Tokens stay out of logs
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl From<sessions::Model> for Session {
    fn from(model: sessions::Model) -> Self {
        Self {
            token: model.id,
            user_id: model.user_id,
            expires_at: model.expires_at,
            created_at: model.created_at,
        }
    }
}

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Persist a session for `user_id` and stamp the user's `last_login`.
    ///
    /// Both writes share one transaction: if either fails, neither is
    /// visible.
    pub async fn create_for_login(
        &self,
        token: &str,
        user_id: i32,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Session> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin login transaction")?;

        let model = sessions::ActiveModel {
            id: Set(token.to_string()),
            user_id: Set(user_id),
            expires_at: Set(expires_at),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .context("Failed to insert session")?;

        touch_last_login_on(&txn, user_id, now).await?;

        txn.commit()
            .await
            .context("Failed to commit login transaction")?;

        Ok(Session::from(model))
    }

    pub async fn find(&self, token: &str) -> Result<Option<Session>> {
        let session = sessions::Entity::find_by_id(token.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query session")?;

        Ok(session.map(Session::from))
    }

    /// Session row joined with its owner. Expiry is not checked here.
    pub async fn find_with_owner(
        &self,
        token: &str,
    ) -> Result<Option<(Session, Option<AdminIdentity>)>> {
        let row = sessions::Entity::find_by_id(token.to_string())
            .find_also_related(admin_users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query session owner")?;

        Ok(row.map(|(session, owner)| (Session::from(session), owner.map(AdminIdentity::from))))
    }

    /// Returns `false` if no session had this token.
    pub async fn delete(&self, token: &str) -> Result<bool> {
        let Some(session) = sessions::Entity::find_by_id(token.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query session for deletion")?
        else {
            return Ok(false);
        };

        let result = session
            .delete(&self.conn)
            .await
            .context("Failed to delete session")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_for_user(&self, user_id: i32) -> Result<u64> {
        sessions::Entity::find()
            .filter(sessions::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count sessions")
    }

    /// Delete every session whose expiry is at or before `now`.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lte(now))
            .exec(&self.conn)
            .await
            .context("Failed to prune expired sessions")?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use chrono::Duration;

    async fn store_with_user() -> (Store, AdminIdentity) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let user = store
            .user_repo()
            .create("admin", "$argon2id$fake")
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn test_create_for_login_stamps_last_login() {
        let (store, user) = store_with_user().await;
        let repo = store.session_repo();
        let now = Utc::now();

        let session = repo
            .create_for_login("tok-1", user.id, now + Duration::hours(1), now)
            .await
            .unwrap();
        assert_eq!(session.user_id, user.id);

        let (found, owner) = repo.find_with_owner("tok-1").await.unwrap().unwrap();
        assert_eq!(found.token, "tok-1");
        assert_eq!(owner.unwrap().username, "admin");

        let reloaded = store.user_repo().find_by_id(user.id).await.unwrap().unwrap();
        assert!(reloaded.last_login.is_some());
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_last_login_untouched() {
        let (store, user) = store_with_user().await;
        let repo = store.session_repo();
        let now = Utc::now();

        repo.create_for_login("dup", user.id, now + Duration::hours(1), now)
            .await
            .unwrap();
        let stamped = store
            .user_repo()
            .find_by_id(user.id)
            .await
            .unwrap()
            .unwrap()
            .last_login;

        // Same primary key: the insert fails and the transaction rolls back
        let later = now + Duration::minutes(5);
        assert!(
            repo.create_for_login("dup", user.id, later + Duration::hours(1), later)
                .await
                .is_err()
        );

        let after = store
            .user_repo()
            .find_by_id(user.id)
            .await
            .unwrap()
            .unwrap()
            .last_login;
        assert_eq!(stamped, after);
    }

    #[tokio::test]
    async fn test_missing_owner_rolls_back_session_insert() {
        let (store, user) = store_with_user().await;
        let repo = store.session_repo();
        let now = Utc::now();

        let result = repo
            .create_for_login("orphan", user.id + 42, now + Duration::hours(1), now)
            .await;
        assert!(result.is_err());
        assert!(repo.find("orphan").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_missing_tokens() {
        let (store, user) = store_with_user().await;
        let repo = store.session_repo();
        let now = Utc::now();

        repo.create_for_login("tok", user.id, now + Duration::hours(1), now)
            .await
            .unwrap();

        assert!(repo.delete("tok").await.unwrap());
        assert!(!repo.delete("tok").await.unwrap());
        assert!(repo.find("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prune_expired_keeps_live_sessions() {
        let (store, user) = store_with_user().await;
        let repo = store.session_repo();
        let now = Utc::now();

        repo.create_for_login("old", user.id, now - Duration::hours(1), now - Duration::hours(25))
            .await
            .unwrap();
        repo.create_for_login("live", user.id, now + Duration::hours(1), now)
            .await
            .unwrap();
        assert_eq!(repo.count_for_user(user.id).await.unwrap(), 2);

        assert_eq!(repo.prune_expired(now).await.unwrap(), 1);
        assert!(repo.find("old").await.unwrap().is_none());
        assert!(repo.find("live").await.unwrap().is_some());
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let session = Session {
            token: "t".to_string(),
            user_id: 1,
            expires_at: now,
            created_at: now - Duration::hours(24),
        };

        assert!(!session.is_expired_at(now - Duration::seconds(1)));
        assert!(session.is_expired_at(now));
        assert!(session.is_expired_at(now + Duration::seconds(1)));
        assert!(!format!("{session:?}").contains("\"t\""));
    }
}

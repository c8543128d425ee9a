use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

use crate::entities::documents;

pub use crate::entities::documents::Model as Document;

pub struct DocumentRepository {
    conn: DatabaseConnection,
}

impl DocumentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<Document>> {
        documents::Entity::find()
            .order_by_desc(documents::Column::CreatedAt)
            .order_by_desc(documents::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list documents")
    }

    pub async fn get(&self, id: i32) -> Result<Option<Document>> {
        documents::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query document")
    }

    pub async fn create(&self, title: &str, body: &str, created_by: i32) -> Result<Document> {
        let now = Utc::now();

        documents::ActiveModel {
            title: Set(title.to_string()),
            body: Set(body.to_string()),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert document")
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = documents::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete document")?;

        Ok(result.rows_affected > 0)
    }
}

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use super::{DocPath, Document, DocumentStore, StoreError};

/// Postgres-backed document store. One row per path in `documents`.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        let body: Option<Value> = sqlx::query_scalar("SELECT body FROM documents WHERE path = $1")
            .bind(path.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(body)
    }

    async fn set(&self, path: &DocPath, body: Value) -> Result<(), StoreError> {
        // Upsert on the primary key: a repeated write never creates a second row.
        sqlx::query(
            r#"
            INSERT INTO documents (path, parent, key, body, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (path)
            DO UPDATE SET body = EXCLUDED.body, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(path.to_string())
        .bind(path.parent_string())
        .bind(path.key())
        .bind(&body)
        .execute(&self.pool)
        .await?;

        debug!("Document written at {path}");
        Ok(())
    }

    async fn list(&self, path: &DocPath) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<(String, Value)> =
            sqlx::query_as("SELECT key, body FROM documents WHERE parent = $1 ORDER BY key")
                .bind(path.to_string())
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(key, body)| Document { key, body })
            .collect())
    }
}

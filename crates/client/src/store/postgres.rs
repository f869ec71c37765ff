//! `PostgreSQL` document store.
//!
//! # Tables
//!
//! - `documents` - one row per document: `(collection, id)` primary key and
//!   a JSONB `data` object
//!
//! # Migrations
//!
//! Migrations are stored in `crates/client/migrations/` and run via:
//! ```bash
//! census migrate
//! ```
//!
//! Queries are built at runtime (`sqlx::query`) rather than with the
//! compile-time macros, so the crate builds without a live database.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;

use super::{Direction, Document, DocumentStore, Fields, StoreError};

/// Database clock formatted like every other server timestamp.
const SERVER_NOW: &str = r#"SELECT to_char(clock_timestamp() AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS.US"Z"')"#;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// [`DocumentStore`] backed by a JSONB table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending migrations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Migration` if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn server_now(&self) -> Result<String, StoreError> {
        Ok(sqlx::query_scalar::<_, String>(SERVER_NOW)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn resolve(&self, fields: Fields) -> Result<Map<String, Value>, StoreError> {
        let needs_clock = fields
            .iter()
            .any(|(_, value)| matches!(value, super::FieldValue::ServerTimestamp));
        let now = if needs_clock {
            self.server_now().await?
        } else {
            String::new()
        };
        Ok(fields.resolve(&now))
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let data = self.resolve(fields).await?;

        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(Json(Value::Object(data)))
            .execute(&self.pool)
            .await?;

        Ok(id)
    }

    async fn set_merge(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let data = self.resolve(fields).await?;

        sqlx::query(
            r"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = documents.data || EXCLUDED.data, updated_at = now()
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(data)))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let data = self.resolve(fields).await?;

        let result = sqlx::query(
            r"
            UPDATE documents
            SET data = data || $3, updated_at = now()
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(data)))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            });
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, (String, Json<Value>)>(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(into_document).transpose()
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_ordered(
        &self,
        collection: &str,
        field: &str,
        direction: Direction,
    ) -> Result<Vec<Document>, StoreError> {
        // Byte-order collation so timestamps and ids sort like the memory store.
        let query = match direction {
            Direction::Ascending => {
                r#"
                SELECT id, data FROM documents
                WHERE collection = $1 AND data ->> $2 IS NOT NULL
                ORDER BY (data ->> $2) COLLATE "C" ASC, id COLLATE "C" ASC
                "#
            }
            Direction::Descending => {
                r#"
                SELECT id, data FROM documents
                WHERE collection = $1 AND data ->> $2 IS NOT NULL
                ORDER BY (data ->> $2) COLLATE "C" DESC, id COLLATE "C" DESC
                "#
            }
        };

        let rows = sqlx::query_as::<_, (String, Json<Value>)>(query)
            .bind(collection)
            .bind(field)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(into_document).collect()
    }
}

fn into_document((id, Json(data)): (String, Json<Value>)) -> Result<Document, StoreError> {
    match data {
        Value::Object(data) => Ok(Document { id, data }),
        other => Err(StoreError::DataCorruption(format!(
            "document {id} is not a JSON object: {other}"
        ))),
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::domain::{
    repository::{StorageError, TodoRepository, STORAGE_KEY},
    todo::Todo,
};

/// Stores the collection as one JSON document in a key-value table.
#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
    key: String,
}

impl SqliteTodoRepository {
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<std::time::Duration>)
            .max_lifetime(None::<std::time::Duration>)
            .connect(database_url)
            .await?;
        Ok(Self { pool: Arc::new(pool), key: STORAGE_KEY.to_string() })
    }

    /// Uses `key` instead of the default storage key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> Result<(), StorageError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn load(&self) -> Result<Vec<Todo>, StorageError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM storage WHERE key = ?1")
            .bind(&self.key)
            .fetch_optional(&*self.pool)
            .await?;
        match value {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, todos: &[Todo]) -> Result<(), StorageError> {
        let json = serde_json::to_string(todos)?;
        sqlx::query(
            "INSERT INTO storage (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(&self.key)
        .bind(json)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }
}

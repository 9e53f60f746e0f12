use async_trait::async_trait;
use super::todo::Todo;

/// Key under which the whole collection is stored.
pub const STORAGE_KEY: &str = "pleaseDoTodosAdvanced";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage database failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored collection is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable home of the task collection.
///
/// `save` always overwrites the whole collection; there is no incremental
/// persistence. An absent collection loads as empty.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> Result<(), StorageError>;
    async fn load(&self) -> Result<Vec<Todo>, StorageError>;
    async fn save(&self, todos: &[Todo]) -> Result<(), StorageError>;
}

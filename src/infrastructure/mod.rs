pub mod json_file_repo;
pub mod memory_repo;
pub mod sqlite_repo;

use async_trait::async_trait;

use crate::domain::repository::{StorageError, TodoRepository};
use crate::domain::todo::Todo;
use json_file_repo::JsonFileTodoRepository;
use sqlite_repo::SqliteTodoRepository;

/// The repository chosen at startup from configuration.
#[derive(Clone)]
pub enum AnyTodoRepository {
    Sqlite(SqliteTodoRepository),
    JsonFile(JsonFileTodoRepository),
}

#[async_trait]
impl TodoRepository for AnyTodoRepository {
    async fn init(&self) -> Result<(), StorageError> {
        match self { Self::Sqlite(r) => r.init().await, Self::JsonFile(r) => r.init().await }
    }

    async fn load(&self) -> Result<Vec<Todo>, StorageError> {
        match self { Self::Sqlite(r) => r.load().await, Self::JsonFile(r) => r.load().await }
    }

    async fn save(&self, todos: &[Todo]) -> Result<(), StorageError> {
        match self { Self::Sqlite(r) => r.save(todos).await, Self::JsonFile(r) => r.save(todos).await }
    }
}

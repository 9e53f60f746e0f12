use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::{
    repository::{StorageError, TodoRepository},
    todo::Todo,
};

/// Keeps the collection in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileTodoRepository {
    path: PathBuf,
}

impl JsonFileTodoRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }
}

#[async_trait]
impl TodoRepository for JsonFileTodoRepository {
    async fn init(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() { tokio::fs::create_dir_all(parent).await?; }
        }
        Ok(())
    }

    async fn load(&self) -> Result<Vec<Todo>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a sibling temp file and renames it over the target, so a
    /// crash mid-write leaves the previous collection intact.
    async fn save(&self, todos: &[Todo]) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(todos)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

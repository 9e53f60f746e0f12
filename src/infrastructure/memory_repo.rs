use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::repository::{StorageError, TodoRepository};
use crate::domain::todo::Todo;

/// Repository kept entirely in memory, with switchable failures for
/// exercising the store's fallback paths.
#[derive(Clone, Default)]
pub struct InMemoryTodoRepository {
    items: Arc<Mutex<Option<Vec<Todo>>>>,
    fail_load: Arc<AtomicBool>,
    fail_save: Arc<AtomicBool>,
    saves: Arc<Mutex<usize>>,
}

impl InMemoryTodoRepository {
    pub fn with_todos(todos: Vec<Todo>) -> Self {
        let repo = Self::default();
        *repo.lock_items() = Some(todos);
        repo
    }

    pub fn fail_loads(&self, fail: bool) { self.fail_load.store(fail, Ordering::SeqCst); }

    pub fn fail_saves(&self, fail: bool) { self.fail_save.store(fail, Ordering::SeqCst); }

    /// What a fresh load would return, or `None` if nothing was ever saved.
    pub fn stored(&self) -> Option<Vec<Todo>> { self.lock_items().clone() }

    pub fn save_count(&self) -> usize { *self.saves.lock().unwrap_or_else(|e| e.into_inner()) }

    fn lock_items(&self) -> std::sync::MutexGuard<'_, Option<Vec<Todo>>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn init(&self) -> Result<(), StorageError> { Ok(()) }

    async fn load(&self) -> Result<Vec<Todo>, StorageError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("load disabled".into()));
        }
        Ok(self.lock_items().clone().unwrap_or_default())
    }

    async fn save(&self, todos: &[Todo]) -> Result<(), StorageError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("quota exceeded".into()));
        }
        *self.lock_items() = Some(todos.to_vec());
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}

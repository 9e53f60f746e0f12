use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, Utc};
use tokio::sync::{watch, Mutex};

use crate::domain::analytics::{self, AnalyticsReport, TimeWindow};
use crate::domain::mutations;
use crate::domain::repository::TodoRepository;
use crate::domain::todo::{EditTodo, NewTodo, SubtaskId, Todo, TodoId};
use crate::domain::view::{self, Progress, TodoFilter};

/// Operations the presentation layers drive.
///
/// Mutations never fail: ignored requests (blank text, unknown ids) return
/// `None` or `false` and leave the collection as it was.
#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn list(&self) -> Vec<Todo>;
    async fn get(&self, id: TodoId) -> Option<Todo>;
    async fn visible(&self, filter: &TodoFilter) -> Vec<Todo>;
    async fn progress(&self) -> Progress;
    async fn add(&self, input: NewTodo) -> Option<Todo>;
    async fn toggle(&self, id: TodoId) -> Option<Todo>;
    async fn edit(&self, id: TodoId, input: EditTodo) -> Option<Todo>;
    async fn remove(&self, id: TodoId) -> bool;
    async fn add_subtask(&self, id: TodoId, text: String) -> Option<Todo>;
    async fn toggle_subtask(&self, id: TodoId, subtask_id: SubtaskId) -> Option<Todo>;
    async fn remove_subtask(&self, id: TodoId, subtask_id: SubtaskId) -> Option<Todo>;
    async fn analytics(&self, window: TimeWindow) -> AnalyticsReport;
    fn subscribe(&self) -> watch::Receiver<Vec<Todo>>;
}

/// The single owner of the task collection.
///
/// Holds the in-memory snapshot, writes the whole collection back to the
/// repository after every change and publishes each new snapshot to
/// subscribers. A failed save is logged and the in-memory state stays
/// authoritative for the rest of the session.
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: Arc<R>,
    todos: Arc<Mutex<Vec<Todo>>>,
    changes: Arc<watch::Sender<Vec<Todo>>>,
}

impl<R: TodoRepository> Clone for TodoServiceImpl<R> {
    fn clone(&self) -> Self {
        Self { repo: self.repo.clone(), todos: self.todos.clone(), changes: self.changes.clone() }
    }
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    /// Loads the stored collection, starting empty if it cannot be read.
    pub async fn open(repo: R) -> Self {
        let todos = match repo.load().await {
            Ok(todos) => {
                tracing::info!(count = todos.len(), "loaded todos");
                todos
            }
            Err(error) => {
                tracing::warn!(%error, "could not load todos, starting with an empty list");
                Vec::new()
            }
        };
        let (changes, _) = watch::channel(todos.clone());
        Self { repo: Arc::new(repo), todos: Arc::new(Mutex::new(todos)), changes: Arc::new(changes) }
    }

    /// Applies `op` to the snapshot. Returns whether anything changed and the resulting snapshot.
    async fn commit<F>(&self, op: &'static str, f: F) -> (bool, Vec<Todo>)
    where
        F: FnOnce(&[Todo]) -> Vec<Todo> + Send,
    {
        let mut todos = self.todos.lock().await;
        let next = f(&todos);
        if next == *todos {
            tracing::debug!(op, "mutation ignored");
            return (false, next);
        }
        *todos = next.clone();
        if let Err(error) = self.repo.save(&next).await {
            tracing::error!(op, %error, "failed to save todos, changes kept in memory only");
        }
        tracing::debug!(op, count = next.len(), "todos updated");
        self.changes.send_replace(next.clone());
        (true, next)
    }
}

fn find(todos: &[Todo], id: TodoId) -> Option<Todo> {
    todos.iter().find(|t| t.id == id).cloned()
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn list(&self) -> Vec<Todo> { self.todos.lock().await.clone() }

    async fn get(&self, id: TodoId) -> Option<Todo> { find(&self.todos.lock().await, id) }

    async fn visible(&self, filter: &TodoFilter) -> Vec<Todo> { view::visible_todos(&self.todos.lock().await, filter) }

    async fn progress(&self) -> Progress { view::progress(&self.todos.lock().await) }

    async fn add(&self, input: NewTodo) -> Option<Todo> {
        let now = Utc::now();
        let (changed, todos) = self.commit("add", |todos| mutations::add(todos, input, now)).await;
        if changed { todos.into_iter().next() } else { None }
    }

    async fn toggle(&self, id: TodoId) -> Option<Todo> {
        let now = Utc::now();
        let (_, todos) = self.commit("toggle", |todos| mutations::toggle(todos, id, now)).await;
        find(&todos, id)
    }

    async fn edit(&self, id: TodoId, input: EditTodo) -> Option<Todo> {
        if input.text.trim().is_empty() { return None; }
        let (_, todos) = self.commit("edit", |todos| mutations::edit(todos, id, input)).await;
        find(&todos, id)
    }

    async fn remove(&self, id: TodoId) -> bool {
        self.commit("remove", |todos| mutations::remove(todos, id)).await.0
    }

    async fn add_subtask(&self, id: TodoId, text: String) -> Option<Todo> {
        if text.trim().is_empty() { return None; }
        let (_, todos) = self.commit("add_subtask", |todos| mutations::add_subtask(todos, id, &text)).await;
        find(&todos, id)
    }

    async fn toggle_subtask(&self, id: TodoId, subtask_id: SubtaskId) -> Option<Todo> {
        let (_, todos) = self.commit("toggle_subtask", |todos| mutations::toggle_subtask(todos, id, subtask_id)).await;
        find(&todos, id).filter(|t| t.subtasks.iter().any(|s| s.id == subtask_id))
    }

    async fn remove_subtask(&self, id: TodoId, subtask_id: SubtaskId) -> Option<Todo> {
        let (changed, todos) = self.commit("remove_subtask", |todos| mutations::remove_subtask(todos, id, subtask_id)).await;
        if changed { find(&todos, id) } else { None }
    }

    async fn analytics(&self, window: TimeWindow) -> AnalyticsReport {
        analytics::report(&self.todos.lock().await, window, &Local::now())
    }

    fn subscribe(&self) -> watch::Receiver<Vec<Todo>> { self.changes.subscribe() }
}

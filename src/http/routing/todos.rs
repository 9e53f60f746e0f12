use axum::{extract::{Path, Query, State}, routing::{delete, post, put}, Json, Router};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::{
    application::todo_service::TodoService,
    domain::{
        todo::{EditTodo, NewTodo, SubtaskId, Todo, TodoId},
        view::{parse_categories, StatusFilter, TodoFilter},
    },
    http::types::ApiError,
};

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/todos", post(create_todo::<S>).get(list_todos::<S>))
        .route("/todos/:id", put(edit_todo::<S>).delete(delete_todo::<S>).get(get_todo::<S>))
        .route("/todos/:id/toggle", post(toggle_todo::<S>))
        .route("/todos/:id/subtasks", post(add_subtask::<S>))
        .route("/todos/:id/subtasks/:subtask_id", delete(remove_subtask::<S>))
        .route("/todos/:id/subtasks/:subtask_id/toggle", post(toggle_subtask::<S>))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub categories: Option<String>,
}

impl ListQuery {
    pub fn to_filter(&self) -> Result<TodoFilter, ApiError> {
        let mut filter = TodoFilter::default();
        if let Some(status) = &self.status { filter.status = status.parse::<StatusFilter>()?; }
        if let Some(categories) = &self.categories { filter.categories = parse_categories(categories)?; }
        Ok(filter)
    }
}

#[derive(Deserialize)]
struct SubtaskBody { text: String }

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>, Query(query): Query<ListQuery>) -> Result<Json<serde_json::Value>, ApiError> {
    let filter = query.to_filter()?;
    let items = state.service.visible(&filter).await;
    let progress = state.service.progress().await;
    Ok(Json(serde_json::json!({ "items": items, "progress": progress })))
}

async fn create_todo<S: TodoService>(State(state): State<AppState<S>>, Json(payload): Json<NewTodo>) -> Result<Json<Todo>, ApiError> {
    require_text(&payload.text)?;
    state.service.add(payload).await.map(Json).ok_or_else(|| ApiError::bad_request("text must not be blank"))
}

async fn get_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    state.service.get(id).await.map(Json).ok_or_else(not_found)
}

async fn edit_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>, Json(payload): Json<EditTodo>) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    require_text(&payload.text)?;
    state.service.edit(id, payload).await.map(Json).ok_or_else(not_found)
}

async fn toggle_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    state.service.toggle(id).await.map(Json).ok_or_else(not_found)
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if state.service.remove(id).await { Ok(StatusCode::NO_CONTENT) } else { Err(not_found()) }
}

async fn add_subtask<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>, Json(payload): Json<SubtaskBody>) -> Result<Json<Todo>, ApiError> {
    let id = parse_id(&id)?;
    require_text(&payload.text)?;
    state.service.add_subtask(id, payload.text).await.map(Json).ok_or_else(not_found)
}

async fn toggle_subtask<S: TodoService>(State(state): State<AppState<S>>, Path((id, subtask_id)): Path<(String, String)>) -> Result<Json<Todo>, ApiError> {
    let (id, subtask_id) = (parse_id(&id)?, parse_subtask_id(&subtask_id)?);
    state.service.toggle_subtask(id, subtask_id).await.map(Json).ok_or_else(not_found)
}

async fn remove_subtask<S: TodoService>(State(state): State<AppState<S>>, Path((id, subtask_id)): Path<(String, String)>) -> Result<Json<Todo>, ApiError> {
    let (id, subtask_id) = (parse_id(&id)?, parse_subtask_id(&subtask_id)?);
    state.service.remove_subtask(id, subtask_id).await.map(Json).ok_or_else(not_found)
}

fn require_text(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() { Err(ApiError::bad_request("text must not be blank")) } else { Ok(()) }
}

fn parse_id(s: &str) -> Result<TodoId, ApiError> { uuid::Uuid::parse_str(s).map(TodoId).map_err(|_| ApiError::bad_request("invalid id")) }

fn parse_subtask_id(s: &str) -> Result<SubtaskId, ApiError> { uuid::Uuid::parse_str(s).map(SubtaskId).map_err(|_| ApiError::bad_request("invalid subtask id")) }

fn not_found() -> ApiError { ApiError::not_found("Not found") }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::todo::Category;

    #[test]
    fn query_defaults_to_everything() {
        assert_eq!(ListQuery::default().to_filter().unwrap(), TodoFilter::default());
    }

    #[test]
    fn query_narrows_filter() {
        let query = ListQuery { status: Some("completed".into()), categories: Some("study,fitness".into()) };
        let filter = query.to_filter().unwrap();
        assert_eq!(filter.status, StatusFilter::Completed);
        assert_eq!(filter.categories, [Category::Study, Category::Fitness].into_iter().collect());
    }

    #[test]
    fn bad_query_is_rejected() {
        let err = ListQuery { status: Some("someday".into()), categories: None }.to_filter().unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}

use axum::{extract::{Query, State}, routing::get, Json, Router};
use serde::Deserialize;

use crate::{
    application::todo_service::TodoService,
    domain::analytics::{AnalyticsReport, TimeWindow},
    http::{routing::todos::AppState, types::ApiError},
};

pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/analytics", get(analytics_report::<S>))
        .with_state(state)
}

#[derive(Deserialize)]
struct WindowQuery { window: Option<String> }

async fn analytics_report<S: TodoService>(State(state): State<AppState<S>>, Query(query): Query<WindowQuery>) -> Result<Json<AnalyticsReport>, ApiError> {
    let window = match query.window.as_deref() {
        Some(raw) => raw.parse::<TimeWindow>()?,
        None => TimeWindow::default(),
    };
    Ok(Json(state.service.analytics(window).await))
}

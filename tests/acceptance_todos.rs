use please_do::{application::todo_service::TodoServiceImpl, http::routing, http::routing::{analytics, todos}, infrastructure::sqlite_repo::SqliteTodoRepository};
use please_do::domain::repository::TodoRepository;
use axum::body::to_bytes;
use axum::Router;
use serde_json::{json, Value};

async fn app() -> Router {
    // use in-memory sqlite for tests
    let repo = SqliteTodoRepository::connect("sqlite::memory:").await.unwrap();
    repo.init().await.unwrap();
    let service = TodoServiceImpl::open(repo).await;
    let state = todos::AppState { service };
    routing::app(todos::router(state.clone()).merge(analytics::router(state)))
}

#[tokio::test]
async fn acceptance_buy_milk_lifecycle() {
    let app = app().await;

    // create
    let res = request(&app, "POST", "/todos", Some(json!({ "text": "Buy milk", "priority": "low", "category": "personal" }))).await;
    assert_eq!(res.status(), 200);
    let body = body_json(res).await;
    assert_eq!(body["completed"], false);
    let id = body["id"].as_str().unwrap().to_string();

    // toggle
    let res = request(&app, "POST", &format!("/todos/{}/toggle", id), None).await;
    assert_eq!(res.status(), 200);
    let body = body_json(res).await;
    assert_eq!(body["completed"], true);
    let completed_at = body["completedAt"].clone();
    assert!(completed_at.is_i64());

    // edit
    let res = request(&app, "PUT", &format!("/todos/{}", id), Some(json!({ "text": "Buy oat milk" }))).await;
    assert_eq!(res.status(), 200);
    let body = body_json(res).await;
    assert_eq!(body["text"], "Buy oat milk");
    assert_eq!(body["completed"], true);
    assert_eq!(body["completedAt"], completed_at);

    // analytics
    let res = request(&app, "GET", "/analytics?window=all", None).await;
    assert_eq!(res.status(), 200);
    let body = body_json(res).await;
    assert_eq!(body["completionRate"], 100.0);
    assert_eq!(body["streak"], 1);
    assert_eq!(body["categories"], json!([{ "category": "personal", "completed": 1 }]));

    // delete
    let res = request(&app, "DELETE", &format!("/todos/{}", id), None).await;
    assert_eq!(res.status(), 204);

    // get 404
    let res = request(&app, "GET", &format!("/todos/{}", id), None).await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn acceptance_list_filters_and_orders() {
    let app = app().await;
    for (text, category) in [("Gym", "fitness"), ("Essay", "study"), ("Standup", "work")] {
        let res = request(&app, "POST", "/todos", Some(json!({ "text": text, "priority": "medium", "category": category }))).await;
        assert_eq!(res.status(), 200);
    }
    let res = request(&app, "POST", "/todos", Some(json!({ "text": "Deadline", "priority": "high", "category": "work", "dueDate": 4_102_444_800_000i64 }))).await;
    let deadline = body_json(res).await;

    let res = request(&app, "GET", "/todos", None).await;
    assert_eq!(res.status(), 200);
    let body = body_json(res).await;
    let texts: Vec<&str> = body["items"].as_array().unwrap().iter().map(|t| t["text"].as_str().unwrap()).collect();
    assert_eq!(texts, vec!["Deadline", "Standup", "Essay", "Gym"]);
    assert_eq!(body["progress"]["total"], 4);

    let res = request(&app, "POST", &format!("/todos/{}/toggle", deadline["id"].as_str().unwrap()), None).await;
    assert_eq!(res.status(), 200);

    let res = request(&app, "GET", "/todos?status=pending&categories=work,study", None).await;
    let body = body_json(res).await;
    let texts: Vec<&str> = body["items"].as_array().unwrap().iter().map(|t| t["text"].as_str().unwrap()).collect();
    assert_eq!(texts, vec!["Standup", "Essay"]);
    assert_eq!(body["progress"]["completed"], 1);
}

#[tokio::test]
async fn acceptance_subtasks() {
    let app = app().await;
    let res = request(&app, "POST", "/todos", Some(json!({ "text": "Trip", "priority": "low", "category": "other" }))).await;
    let id = body_json(res).await["id"].as_str().unwrap().to_string();

    let res = request(&app, "POST", &format!("/todos/{}/subtasks", id), Some(json!({ "text": "Passport" }))).await;
    assert_eq!(res.status(), 200);
    let body = body_json(res).await;
    let subtask_id = body["subtasks"][0]["id"].as_str().unwrap().to_string();

    let res = request(&app, "POST", &format!("/todos/{}/subtasks/{}/toggle", id, subtask_id), None).await;
    assert_eq!(body_json(res).await["subtasks"][0]["completed"], true);

    let res = request(&app, "DELETE", &format!("/todos/{}/subtasks/{}", id, subtask_id), None).await;
    assert_eq!(res.status(), 200);
    assert_eq!(body_json(res).await["subtasks"], json!([]));

    let res = request(&app, "DELETE", &format!("/todos/{}/subtasks/{}", id, subtask_id), None).await;
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn acceptance_rejects_bad_input() {
    let app = app().await;

    let res = request(&app, "POST", "/todos", Some(json!({ "text": "   ", "priority": "low", "category": "work" }))).await;
    assert_eq!(res.status(), 400);

    let res = request(&app, "GET", "/todos", None).await;
    assert_eq!(body_json(res).await["items"], json!([]));

    let res = request(&app, "POST", "/todos/not-a-uuid/toggle", None).await;
    assert_eq!(res.status(), 400);

    let res = request(&app, "POST", "/todos/7f1c0e4e-0a4e-4b8e-9d4e-2d6f3a9b1c11/toggle", None).await;
    assert_eq!(res.status(), 404);

    let res = request(&app, "GET", "/todos?status=someday", None).await;
    assert_eq!(res.status(), 400);

    let res = request(&app, "GET", "/analytics?window=year", None).await;
    assert_eq!(res.status(), 400);

    let res = request(&app, "GET", "/analytics", None).await;
    let body = body_json(res).await;
    assert_eq!(body["window"], "7days");
    assert_eq!(body["completionRate"], 0.0);
    assert_eq!(body["series"]["days"].as_array().unwrap().len(), 7);
}

async fn body_json(res: hyper::Response<axum::body::Body>) -> Value {
    serde_json::from_slice(&to_bytes(res.into_body(), 1024 * 1024).await.unwrap()).unwrap()
}

async fn request(app: &Router, method: &str, path: &str, body: Option<Value>) -> hyper::Response<axum::body::Body> {
    use axum::body::Body;
    use http::{Request, Method};
    use tower::ServiceExt;

    let req = Request::builder().method(Method::from_bytes(method.as_bytes()).unwrap()).uri(path);
    let req = match body {
        Some(json) => req.header("content-type", "application/json").body(Body::from(json.to_string())).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
}

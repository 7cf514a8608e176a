use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Default)]
pub struct Store {
    next_id: i64,
    tasks: BTreeMap<i64, Task>,
}

pub type Db = Arc<RwLock<Store>>;

/// JSON error body in the `{"message": ...}` or `{"error": ...}` shape the
/// client understands.
pub struct ApiError {
    status: StatusCode,
    body: serde_json::Value,
}

impl ApiError {
    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: json!({ "message": "Task not found" }),
        }
    }

    fn bad_request(error: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: json!({ "error": error }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", patch(update_task).delete(delete_task))
        .route("/tasks/{id}/complete", put(complete_task))
        .with_state(db)
}

/// Same routes, with every response held back by `latency`.
pub fn app_with_latency(latency: Duration) -> Router {
    app().layer(middleware::from_fn_with_state(latency, delay))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn delay(State(latency): State<Duration>, request: Request, next: Next) -> Response {
    tokio::time::sleep(latency).await;
    next.run(request).await
}

async fn list_tasks(State(db): State<Db>) -> Json<Vec<Task>> {
    let store = db.read().await;
    Json(store.tasks.values().cloned().collect())
}

async fn create_task(
    State(db): State<Db>,
    Json(input): Json<CreateTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }

    let mut store = db.write().await;
    store.next_id += 1;
    let task = Task {
        id: store.next_id,
        title: title.to_string(),
        description: input.description.trim().to_string(),
        completed: false,
    };
    store.tasks.insert(task.id, task.clone());
    tracing::info!(id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn complete_task(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    let mut store = db.write().await;
    let task = store.tasks.get_mut(&id).ok_or_else(ApiError::not_found)?;
    task.completed = true;
    Ok(Json(task.clone()))
}

async fn update_task(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<Task>, ApiError> {
    if input.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::bad_request("Title is required"));
    }

    let mut store = db.write().await;
    let task = store.tasks.get_mut(&id).ok_or_else(ApiError::not_found)?;
    if let Some(title) = input.title {
        task.title = title.trim().to_string();
    }
    if let Some(description) = input.description {
        task.description = description;
    }
    if let Some(completed) = input.completed {
        task.completed = completed;
    }
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut store = db.write().await;
    store
        .tasks
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(ApiError::not_found)
}

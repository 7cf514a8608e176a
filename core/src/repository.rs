//! Domain operations over the remote `tasks` resource.
//!
//! The repository performs no validation and no retries; it only maps each
//! operation to an HTTP call and the response to a domain type.

use async_trait::async_trait;
use serde_json::Value;

use crate::client::HttpClient;
use crate::error::HttpError;
use crate::transport::{Transport, UreqTransport};
use crate::types::{CreateTaskRequest, Task, TaskId, UpdateTaskRequest};

const TASKS_PATH: &str = "/tasks";

/// Source of truth for tasks.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn get_tasks(&self) -> Result<Vec<Task>, HttpError>;

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, HttpError>;

    /// Marks the task completed server-side. A missing id surfaces as 404.
    ///
    /// `None` means the server acknowledged without echoing the task.
    async fn complete_task(&self, id: TaskId) -> Result<Option<Task>, HttpError>;

    async fn update_task(&self, id: TaskId, updates: &UpdateTaskRequest)
        -> Result<Task, HttpError>;

    async fn delete_task(&self, id: TaskId) -> Result<(), HttpError>;
}

/// `TaskRepository` backed by the REST API.
pub struct HttpTaskRepository<T = UreqTransport> {
    client: HttpClient<T>,
}

impl<T: Transport> HttpTaskRepository<T> {
    pub fn new(client: HttpClient<T>) -> Self {
        Self { client }
    }

    /// The underlying client, e.g. to set or clear the bearer token.
    pub fn client(&self) -> &HttpClient<T> {
        &self.client
    }
}

fn task_path(id: TaskId) -> String {
    format!("{TASKS_PATH}/{id}")
}

#[async_trait]
impl<T: Transport> TaskRepository for HttpTaskRepository<T> {
    async fn get_tasks(&self) -> Result<Vec<Task>, HttpError> {
        self.client.get(TASKS_PATH).await
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, HttpError> {
        self.client.post(TASKS_PATH, request).await
    }

    async fn complete_task(&self, id: TaskId) -> Result<Option<Task>, HttpError> {
        let body: Value = self
            .client
            .put::<(), _>(&format!("{}/complete", task_path(id)), None)
            .await?;
        if body.is_null() || body.as_object().is_some_and(|o| o.is_empty()) {
            return Ok(None);
        }
        serde_json::from_value(body)
            .map(Some)
            .map_err(|e| HttpError::network(format!("failed to decode task: {e}")))
    }

    async fn update_task(
        &self,
        id: TaskId,
        updates: &UpdateTaskRequest,
    ) -> Result<Task, HttpError> {
        self.client.patch(&task_path(id), updates).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), HttpError> {
        self.client.delete::<Value>(&task_path(id)).await?;
        Ok(())
    }
}

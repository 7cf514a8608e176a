//! Domain DTOs for the task API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates.

use serde::{Deserialize, Serialize};

/// Server-assigned task identifier.
pub type TaskId = i64;

/// A single task returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

/// Request payload for creating a new task. The server assigns `id` and
/// starts every task as not completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl CreateTaskRequest {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    /// Copy with surrounding whitespace removed from both fields, the form in
    /// which a request is submitted.
    pub fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }
}

/// Request payload for a partial update. Only the fields present in the JSON
/// are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_tolerates_missing_optional_fields() {
        let task: Task = serde_json::from_str(r#"{"id":7,"title":"Bare"}"#).unwrap();
        assert_eq!(task.id, 7);
        assert_eq!(task.description, "");
        assert!(!task.completed);
    }

    #[test]
    fn update_request_omits_absent_fields() {
        let update = UpdateTaskRequest {
            completed: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"completed": true}));
    }

    #[test]
    fn trimmed_strips_both_fields() {
        let req = CreateTaskRequest::new("  Buy milk ", "\t2% please\n");
        let trimmed = req.trimmed();
        assert_eq!(trimmed.title, "Buy milk");
        assert_eq!(trimmed.description, "2% please");
    }
}

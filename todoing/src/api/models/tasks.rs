//! API request/response models for tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::tasks::TaskDBResponse;

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    /// Exactly the wire strings.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "TODO" => Some(TaskStatus::Todo),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "DONE" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// Lenient form used by import: common aliases are accepted and anything
    /// unknown falls back to TODO.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "IN_PROGRESS" | "INPROGRESS" | "DOING" => TaskStatus::InProgress,
            "DONE" | "COMPLETED" | "FINISHED" => TaskStatus::Done,
            _ => TaskStatus::Todo,
        }
    }
}

/// Urgency of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }

    /// Exactly the wire strings.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LOW" => Some(TaskPriority::Low),
            "MEDIUM" => Some(TaskPriority::Medium),
            "HIGH" => Some(TaskPriority::High),
            _ => None,
        }
    }

    /// Lenient form used by import; unknown values fall back to MEDIUM.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "LOW" => TaskPriority::Low,
            "HIGH" | "URGENT" => TaskPriority::High,
            _ => TaskPriority::Medium,
        }
    }
}

/// Comment embedded in a task.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskComment {
    pub id: Uuid,
    pub text: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    pub created_by: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<DateTime<Utc>>,
    pub comments: Vec<TaskComment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TaskDBResponse> for TaskResponse {
    fn from(db: TaskDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            status: db.status,
            priority: db.priority,
            assignee: db.assignee,
            created_by: db.created_by,
            deadline: db.deadline,
            scheduled_date: db.scheduled_date,
            comments: db.comments,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Create payload. Date fields arrive as strings so the handler can reject
/// them with the exact RFC3339 error messages.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskCreateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<String>,
    pub deadline: Option<String>,
    pub scheduled_date: Option<String>,
}

/// Partial update; absent fields leave the task untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<String>,
    pub deadline: Option<String>,
    pub scheduled_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct AddCommentRequest {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct AssignTaskRequest {
    pub assignee: Option<String>,
}

/// Backup payload accepted by import. Everything is optional and parsed
/// leniently; items that cannot be salvaged fail individually.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ImportTasksRequest {
    pub tasks: Vec<ImportTaskItem>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportTaskItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub deadline: Option<String>,
    pub scheduled_date: Option<String>,
    pub comments: Option<Vec<ImportCommentItem>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ImportCommentItem {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TasksListResponse {
    pub tasks: Vec<TaskResponse>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskEnvelope {
    pub task: TaskResponse,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportTasksResponse {
    pub message: String,
    pub imported: usize,
    pub errors: Vec<ImportTaskError>,
}

/// Per-item import failure; `index` is the position in the submitted array.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportTaskError {
    pub index: usize,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_strings_round_trip() {
        for (status, wire) in [
            (TaskStatus::Todo, "\"TODO\""),
            (TaskStatus::InProgress, "\"IN_PROGRESS\""),
            (TaskStatus::Done, "\"DONE\""),
        ] {
            assert_eq!(serde_json::to_string(&status).unwrap(), wire);
            assert_eq!(serde_json::from_str::<TaskStatus>(wire).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected_strictly() {
        assert!(serde_json::from_str::<TaskStatus>("\"PENDING\"").is_err());
        assert_eq!(TaskStatus::parse("PENDING"), None);
    }

    #[test]
    fn lenient_parsing_for_import() {
        assert_eq!(TaskStatus::parse_lenient("in-progress"), TaskStatus::InProgress);
        assert_eq!(TaskStatus::parse_lenient("Completed"), TaskStatus::Done);
        assert_eq!(TaskStatus::parse_lenient("whatever"), TaskStatus::Todo);

        assert_eq!(TaskPriority::parse_lenient("urgent"), TaskPriority::High);
        assert_eq!(TaskPriority::parse_lenient("???"), TaskPriority::Medium);
    }

    #[test]
    fn task_response_uses_camel_case_and_omits_absent_fields() {
        let task = TaskResponse {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            assignee: None,
            created_by: Uuid::new_v4(),
            deadline: None,
            scheduled_date: None,
            comments: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&task).unwrap();
        assert!(value.get("createdBy").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("description").is_none());
        assert!(value.get("deadline").is_none());
    }
}

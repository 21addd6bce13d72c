//! Database models for tasks.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::api::models::tasks::{TaskComment, TaskPriority, TaskStatus};

#[derive(Debug, Clone)]
pub struct TaskCreateDBRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee: Option<String>,
    pub created_by: Uuid,
    pub deadline: Option<DateTime<Utc>>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub comments: Vec<TaskComment>,
}

/// Partial update; `None` fields are left untouched. The assignee is special
/// because the column is nullable: `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<Option<String>>,
    pub deadline: Option<DateTime<Utc>>,
    pub scheduled_date: Option<DateTime<Utc>>,
}

impl TaskUpdateDBRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.deadline.is_none()
            && self.scheduled_date.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct TaskDBResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee: Option<String>,
    pub created_by: Uuid,
    pub deadline: Option<DateTime<Utc>>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub comments: Vec<TaskComment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//! Database repository for tasks.
//!
//! Every query is scoped to the owning user, so a task belonging to someone
//! else behaves exactly like a task that does not exist.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    api::models::tasks::{TaskComment, TaskPriority, TaskStatus},
    db::{
        errors::{DbError, Result},
        models::tasks::{TaskCreateDBRequest, TaskDBResponse, TaskUpdateDBRequest},
    },
};

const TASK_COLUMNS: &str = "id, title, description, status, priority, assignee, created_by, deadline, scheduled_date, comments, created_at, updated_at";

// Database entity model; status and priority come back as the raw column text.
#[derive(Debug, Clone, FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    assignee: Option<String>,
    created_by: Uuid,
    deadline: Option<DateTime<Utc>>,
    scheduled_date: Option<DateTime<Utc>>,
    comments: sqlx::types::Json<Vec<TaskComment>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for TaskDBResponse {
    type Error = DbError;

    fn try_from(row: TaskRow) -> Result<Self> {
        let status = TaskStatus::parse(&row.status)
            .ok_or_else(|| DbError::Other(anyhow!("unknown task status in database: {}", row.status)))?;
        let priority = TaskPriority::parse(&row.priority)
            .ok_or_else(|| DbError::Other(anyhow!("unknown task priority in database: {}", row.priority)))?;

        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            status,
            priority,
            assignee: row.assignee,
            created_by: row.created_by,
            deadline: row.deadline,
            scheduled_date: row.scheduled_date,
            comments: row.comments.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, request: &TaskCreateDBRequest, now: DateTime<Utc>) -> Result<TaskDBResponse>;
    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<TaskDBResponse>>;
    /// All tasks of one user, newest first.
    async fn list(&self, owner: Uuid) -> Result<Vec<TaskDBResponse>>;
    /// Tasks created inside the inclusive window, oldest first.
    async fn list_created_between(
        &self,
        owner: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TaskDBResponse>>;
    /// Returns `None` when the task does not exist for this owner.
    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        request: &TaskUpdateDBRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<TaskDBResponse>>;
    async fn add_comment(
        &self,
        owner: Uuid,
        id: Uuid,
        comment: &TaskComment,
        now: DateTime<Utc>,
    ) -> Result<Option<TaskDBResponse>>;
    /// Returns whether a row was deleted.
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool>;
}

pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    #[instrument(skip(self, request), fields(created_by = %request.created_by), err)]
    async fn create(&self, request: &TaskCreateDBRequest, now: DateTime<Utc>) -> Result<TaskDBResponse> {
        let task_id = Uuid::new_v4();

        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (id, title, description, status, priority, assignee, created_by, deadline, scheduled_date, comments, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.status.as_str())
        .bind(request.priority.as_str())
        .bind(&request.assignee)
        .bind(request.created_by)
        .bind(request.deadline)
        .bind(request.scheduled_date)
        .bind(sqlx::types::Json(&request.comments))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    #[instrument(skip(self), fields(task_id = %id), err)]
    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<TaskDBResponse>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND created_by = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TaskDBResponse::try_from).transpose()
    }

    #[instrument(skip(self), fields(owner = %owner), err)]
    async fn list(&self, owner: Uuid) -> Result<Vec<TaskDBResponse>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE created_by = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaskDBResponse::try_from).collect()
    }

    #[instrument(skip(self), fields(owner = %owner), err)]
    async fn list_created_between(
        &self,
        owner: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TaskDBResponse>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE created_by = $1 AND created_at >= $2 AND created_at <= $3
            ORDER BY created_at ASC
            "#
        ))
        .bind(owner)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaskDBResponse::try_from).collect()
    }

    #[instrument(skip(self, request), fields(task_id = %id), err)]
    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        request: &TaskUpdateDBRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<TaskDBResponse>> {
        if request.is_empty() {
            return self.get(owner, id).await;
        }

        // COALESCE keeps absent fields; the assignee needs the flag because
        // the column is nullable and `Some(None)` must clear it.
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                status = COALESCE($5, status),
                priority = COALESCE($6, priority),
                assignee = CASE WHEN $7 THEN $8 ELSE assignee END,
                deadline = COALESCE($9, deadline),
                scheduled_date = COALESCE($10, scheduled_date),
                updated_at = $11
            WHERE id = $1 AND created_by = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.status.map(TaskStatus::as_str))
        .bind(request.priority.map(TaskPriority::as_str))
        .bind(request.assignee.is_some())
        .bind(request.assignee.clone().flatten())
        .bind(request.deadline)
        .bind(request.scheduled_date)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TaskDBResponse::try_from).transpose()
    }

    #[instrument(skip(self, comment), fields(task_id = %id), err)]
    async fn add_comment(
        &self,
        owner: Uuid,
        id: Uuid,
        comment: &TaskComment,
        now: DateTime<Utc>,
    ) -> Result<Option<TaskDBResponse>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks
            SET comments = comments || $3::jsonb,
                updated_at = $4
            WHERE id = $1 AND created_by = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(sqlx::types::Json(std::slice::from_ref(comment)))
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TaskDBResponse::try_from).transpose()
    }

    #[instrument(skip(self), fields(task_id = %id), err)]
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::{
        models::{
            common::MessageResponse,
            tasks::{
                AddCommentRequest, AssignTaskRequest, ImportTaskError, ImportTasksRequest, ImportTasksResponse,
                TaskComment, TaskCreateRequest, TaskEnvelope, TaskPriority, TaskResponse, TaskStatus,
                TasksListResponse, TaskUpdateRequest,
            },
            users::CurrentUser,
        },
        TASKS_DEADLINE, TRANSFER_DEADLINE,
    },
    db::models::tasks::{TaskCreateDBRequest, TaskUpdateDBRequest},
    errors::{bounded, Error},
    AppState,
};

const INVALID_DEADLINE: &str = "Invalid deadline format, must be RFC3339";
const INVALID_SCHEDULED_DATE: &str = "Invalid scheduled date format, must be RFC3339";

fn parse_rfc3339(value: &str, message: &'static str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| Error::BadRequest {
            message: message.to_string(),
        })
}

/// Empty strings count as absent so clients can send `""` for "no date".
fn parse_optional_date(value: Option<&str>, message: &'static str) -> Result<Option<DateTime<Utc>>, Error> {
    match value {
        Some(raw) if !raw.is_empty() => parse_rfc3339(raw, message).map(Some),
        _ => Ok(None),
    }
}

/// List the caller's tasks
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "tasks",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Tasks, newest first", body = TasksListResponse),
        (status = 401, description = "Missing or invalid token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_tasks(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<TasksListResponse>, Error> {
    bounded("list tasks", TASKS_DEADLINE, async move {
        let tasks = state.tasks.list(current_user.id).await?;
        Ok(Json(TasksListResponse {
            tasks: tasks.into_iter().map(TaskResponse::from).collect(),
            message: "Tasks retrieved successfully".to_string(),
        }))
    })
    .await
}

/// Create a task
#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = TaskCreateRequest,
    tag = "tasks",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Task created", body = TaskEnvelope),
        (status = 400, description = "Missing title or malformed dates"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<TaskCreateRequest>,
) -> Result<(StatusCode, Json<TaskEnvelope>), Error> {
    bounded("create task", TASKS_DEADLINE, async move {
        let title = request.title.unwrap_or_default();
        if title.is_empty() {
            return Err(Error::BadRequest {
                message: "Title is required".to_string(),
            });
        }
        let deadline = parse_optional_date(request.deadline.as_deref(), INVALID_DEADLINE)?;
        let scheduled_date = parse_optional_date(request.scheduled_date.as_deref(), INVALID_SCHEDULED_DATE)?;

        let task = state
            .tasks
            .create(
                &TaskCreateDBRequest {
                    title,
                    description: request.description.filter(|d| !d.is_empty()),
                    status: request.status.unwrap_or(TaskStatus::Todo),
                    priority: request.priority.unwrap_or(TaskPriority::Medium),
                    assignee: request.assignee.filter(|a| !a.is_empty()),
                    created_by: current_user.id,
                    deadline,
                    scheduled_date,
                    comments: Vec::new(),
                },
                state.clock.now(),
            )
            .await?;

        Ok((
            StatusCode::CREATED,
            Json(TaskEnvelope {
                task: task.into(),
                message: "Task created successfully".to_string(),
            }),
        ))
    })
    .await
}

/// Fetch one task
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task", body = TaskEnvelope),
        (status = 404, description = "No such task for this user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskEnvelope>, Error> {
    bounded("fetch task", TASKS_DEADLINE, async move {
        let task = state
            .tasks
            .get(current_user.id, id)
            .await?
            .ok_or(Error::NotFound { resource: "Task" })?;
        Ok(Json(TaskEnvelope {
            task: task.into(),
            message: "Task retrieved successfully".to_string(),
        }))
    })
    .await
}

/// Update a task
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    request_body = TaskUpdateRequest,
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "The updated task", body = TaskEnvelope),
        (status = 400, description = "Malformed dates"),
        (status = 404, description = "No such task for this user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<TaskUpdateRequest>,
) -> Result<Json<TaskEnvelope>, Error> {
    bounded("update task", TASKS_DEADLINE, async move {
        let update = TaskUpdateDBRequest {
            title: request.title.filter(|t| !t.is_empty()),
            description: request.description,
            status: request.status,
            priority: request.priority,
            // An empty assignee clears the field, absence leaves it alone
            assignee: request.assignee.map(|a| if a.is_empty() { None } else { Some(a) }),
            deadline: parse_optional_date(request.deadline.as_deref(), INVALID_DEADLINE)?,
            scheduled_date: parse_optional_date(request.scheduled_date.as_deref(), INVALID_SCHEDULED_DATE)?,
        };

        let task = state
            .tasks
            .update(current_user.id, id, &update, state.clock.now())
            .await?
            .ok_or(Error::NotFound { resource: "Task" })?;
        Ok(Json(TaskEnvelope {
            task: task.into(),
            message: "Task updated successfully".to_string(),
        }))
    })
    .await
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 404, description = "No such task for this user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, Error> {
    bounded("delete task", TASKS_DEADLINE, async move {
        if !state.tasks.delete(current_user.id, id).await? {
            return Err(Error::NotFound { resource: "Task" });
        }
        Ok(Json(MessageResponse::new("Task deleted successfully")))
    })
    .await
}

/// Comment on a task
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/comments",
    request_body = AddCommentRequest,
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task with the new comment", body = TaskEnvelope),
        (status = 400, description = "Missing comment text"),
        (status = 404, description = "No such task for this user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_comment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AddCommentRequest>,
) -> Result<Json<TaskEnvelope>, Error> {
    bounded("add comment", TASKS_DEADLINE, async move {
        let text = request.text.unwrap_or_default();
        if text.is_empty() {
            return Err(Error::BadRequest {
                message: "Comment text is required".to_string(),
            });
        }

        let comment = TaskComment {
            id: Uuid::new_v4(),
            text,
            created_by: current_user.id,
            created_at: state.clock.now(),
        };
        let task = state
            .tasks
            .add_comment(current_user.id, id, &comment, state.clock.now())
            .await?
            .ok_or(Error::NotFound { resource: "Task" })?;
        Ok(Json(TaskEnvelope {
            task: task.into(),
            message: "Comment added successfully".to_string(),
        }))
    })
    .await
}

/// Assign a task
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/assign",
    request_body = AssignTaskRequest,
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "The reassigned task", body = TaskEnvelope),
        (status = 404, description = "No such task for this user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn assign_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignTaskRequest>,
) -> Result<Json<TaskEnvelope>, Error> {
    bounded("assign task", TASKS_DEADLINE, async move {
        let assignee = request.assignee.filter(|a| !a.is_empty());
        let update = TaskUpdateDBRequest {
            assignee: Some(assignee),
            ..Default::default()
        };

        let task = state
            .tasks
            .update(current_user.id, id, &update, state.clock.now())
            .await?
            .ok_or(Error::NotFound { resource: "Task" })?;
        Ok(Json(TaskEnvelope {
            task: task.into(),
            message: "Task assigned successfully".to_string(),
        }))
    })
    .await
}

/// Export all tasks as a backup file
#[utoipa::path(
    get,
    path = "/api/tasks/export/all",
    tag = "tasks",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All of the caller's tasks as a JSON attachment", body = Vec<TaskResponse>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn export_tasks(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<([(header::HeaderName, String); 2], Json<Vec<TaskResponse>>), Error> {
    bounded("export tasks", TRANSFER_DEADLINE, async move {
        let tasks = state.tasks.list(current_user.id).await?;
        let filename = format!("todoing-backup-{}.json", state.clock.now().format("%Y-%m-%d"));

        Ok((
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
            ],
            Json(tasks.into_iter().map(TaskResponse::from).collect()),
        ))
    })
    .await
}

/// Import tasks from a backup file
#[utoipa::path(
    post,
    path = "/api/tasks/import",
    request_body = ImportTasksRequest,
    tag = "tasks",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Import summary with per-item errors", body = ImportTasksResponse),
        (status = 400, description = "Body is not a task backup or is empty"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn import_tasks(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ImportTasksResponse>, Error> {
    bounded("import tasks", TRANSFER_DEADLINE, async move {
        let request: ImportTasksRequest = serde_json::from_value(body).map_err(|_| Error::BadRequest {
            message: "Invalid request format".to_string(),
        })?;
        if request.tasks.is_empty() {
            return Err(Error::BadRequest {
                message: "No tasks to import".to_string(),
            });
        }

        let mut imported = 0;
        let mut errors = Vec::new();
        for (index, item) in request.tasks.into_iter().enumerate() {
            let title = item.title.unwrap_or_default();
            if title.trim().is_empty() {
                errors.push(ImportTaskError {
                    index,
                    error: "Title is required".to_string(),
                });
                continue;
            }

            let now = state.clock.now();
            let comments = item
                .comments
                .unwrap_or_default()
                .into_iter()
                .filter_map(|comment| comment.text.filter(|text| !text.is_empty()))
                .map(|text| TaskComment {
                    id: Uuid::new_v4(),
                    text,
                    created_by: current_user.id,
                    created_at: now,
                })
                .collect();

            let create = TaskCreateDBRequest {
                title,
                description: item.description.filter(|d| !d.is_empty()),
                status: item.status.as_deref().map(TaskStatus::parse_lenient).unwrap_or(TaskStatus::Todo),
                priority: item
                    .priority
                    .as_deref()
                    .map(TaskPriority::parse_lenient)
                    .unwrap_or(TaskPriority::Medium),
                assignee: item.assignee.filter(|a| !a.is_empty()),
                created_by: current_user.id,
                // Unparseable backup dates are dropped rather than failing the item
                deadline: item.deadline.as_deref().and_then(|d| DateTime::parse_from_rfc3339(d).ok()).map(|d| d.with_timezone(&Utc)),
                scheduled_date: item
                    .scheduled_date
                    .as_deref()
                    .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                    .map(|d| d.with_timezone(&Utc)),
                comments,
            };

            match state.tasks.create(&create, now).await {
                Ok(_) => imported += 1,
                Err(error) => errors.push(ImportTaskError {
                    index,
                    error: error.to_string(),
                }),
            }
        }

        Ok(Json(ImportTasksResponse {
            message: format!("Imported {imported} tasks successfully"),
            imported,
            errors,
        }))
    })
    .await
}

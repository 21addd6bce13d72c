//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! The API is divided into three functional areas:
//!
//! - **Authentication** (`/api/auth/*`): Registration, login, captcha and
//!   email verification codes, current-user lookup
//! - **Tasks** (`/api/tasks/*`): Task CRUD, comments, assignment, and
//!   batch import/export
//! - **Reports** (`/api/reports/*`): Report generation, AI polish, and
//!   file export
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! API documentation is available at `/docs` when the server is running.

use std::time::Duration;

pub mod handlers;
pub mod models;

/// Ceiling for authentication work, including the argon2 hash.
pub const AUTH_DEADLINE: Duration = Duration::from_secs(5);

/// Ceiling for single-task reads and writes.
pub const TASKS_DEADLINE: Duration = Duration::from_secs(10);

/// Ceiling for batch import/export.
pub const TRANSFER_DEADLINE: Duration = Duration::from_secs(30);

/// Ceiling for report generation and export.
pub const REPORTS_DEADLINE: Duration = Duration::from_secs(60);

//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication checks via the [`crate::api::models::users::CurrentUser`] extractor
//! - Business logic execution via the store traits in [`crate::db::handlers`]
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`auth`]: Registration, login, captcha, email verification codes
//! - [`tasks`]: Task CRUD, comments, assignment, import/export
//! - [`reports`]: Report generation, polish, and export
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which automatically converts to
//! appropriate HTTP status codes and `{"message": ...}` JSON bodies.

pub mod auth;
pub mod reports;
pub mod tasks;

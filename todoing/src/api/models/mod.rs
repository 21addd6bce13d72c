//! API request/response models.

pub mod auth;
pub mod common;
pub mod reports;
pub mod tasks;
pub mod users;

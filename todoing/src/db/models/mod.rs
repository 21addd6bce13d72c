//! Database record structures matching table schemas.

pub mod reports;
pub mod tasks;
pub mod users;

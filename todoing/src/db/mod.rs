//! Database layer for data persistence and access.
//!
//! Persistence sits behind per-entity store traits so handlers never touch
//! SQL directly and tests can swap in the in-memory implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Stores    │  (db::handlers - traits + Postgres implementations)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Store traits and their Postgres implementations
//! - [`models`]: Database record structures matching table schemas
//! - [`errors`]: Database-specific error types
//! - [`memory`]: In-memory store implementations for tests (feature-gated)
//!
//! Every task and report query is scoped to the owning user; a row that
//! belongs to someone else behaves exactly like a missing row.
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/`
//! directory. The [`crate::migrator`] function provides access to the migrator:
//!
//! ```ignore
//! todoing::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod models;

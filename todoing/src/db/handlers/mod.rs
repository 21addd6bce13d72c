//! Database repositories, one store per entity.

pub mod reports;
pub mod tasks;
pub mod users;

pub use reports::{PgReportStore, ReportStore};
pub use tasks::{PgTaskStore, TaskStore};
pub use users::{PgUserStore, UserStore};

//! Database models for reports.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::api::models::reports::{ReportStatistics, ReportType};

#[derive(Debug, Clone)]
pub struct ReportCreateDBRequest {
    pub user_id: Uuid,
    pub report_type: ReportType,
    pub period: String,
    pub title: String,
    pub content: String,
    pub task_ids: Vec<Uuid>,
    pub statistics: ReportStatistics,
}

#[derive(Debug, Clone)]
pub struct ReportDBResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub report_type: ReportType,
    pub period: String,
    pub title: String,
    pub content: String,
    pub polished_content: Option<String>,
    pub task_ids: Vec<Uuid>,
    pub statistics: ReportStatistics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//! API request/response models for reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::reports::ReportDBResponse;

/// Granularity of a generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Daily,
    Weekly,
    Monthly,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::Daily => "daily",
            ReportType::Weekly => "weekly",
            ReportType::Monthly => "monthly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(ReportType::Daily),
            "weekly" => Some(ReportType::Weekly),
            "monthly" => Some(ReportType::Monthly),
            _ => None,
        }
    }
}

/// Task counts captured at generation time. Stored alongside the report so the
/// numbers stay stable even as the underlying tasks keep changing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct ReportStatistics {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub overdue: i64,
    /// Integer percentage, floored.
    pub completion_rate: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub period: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polished_content: Option<String>,
    pub tasks: Vec<Uuid>,
    pub statistics: ReportStatistics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ReportDBResponse> for ReportResponse {
    fn from(db: ReportDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            report_type: db.report_type,
            period: db.period,
            title: db.title,
            content: db.content,
            polished_content: db.polished_content,
            tasks: db.task_ids,
            statistics: db.statistics,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Generate payload. The type and dates arrive as strings so the handler can
/// reject each with its own error message.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateReportRequest {
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Polish payload. The AI connection settings are accepted in either naming
/// convention and currently unused beyond logging.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct PolishReportRequest {
    pub content: Option<String>,
    #[serde(alias = "apiKey")]
    pub api_key: Option<String>,
    #[serde(alias = "apiUrl")]
    pub api_url: Option<String>,
    pub model: Option<String>,
}

//! Database repository for reports.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    api::models::reports::{ReportStatistics, ReportType},
    db::{
        errors::{DbError, Result},
        models::reports::{ReportCreateDBRequest, ReportDBResponse},
    },
};

const REPORT_COLUMNS: &str = "id, user_id, report_type, period, title, content, polished_content, task_ids, statistics, created_at, updated_at";

// Database entity model.
#[derive(Debug, Clone, FromRow)]
struct ReportRow {
    id: Uuid,
    user_id: Uuid,
    report_type: String,
    period: String,
    title: String,
    content: String,
    polished_content: Option<String>,
    task_ids: sqlx::types::Json<Vec<Uuid>>,
    statistics: sqlx::types::Json<ReportStatistics>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ReportRow> for ReportDBResponse {
    type Error = DbError;

    fn try_from(row: ReportRow) -> Result<Self> {
        let report_type = ReportType::parse(&row.report_type)
            .ok_or_else(|| DbError::Other(anyhow!("unknown report type in database: {}", row.report_type)))?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            report_type,
            period: row.period,
            title: row.title,
            content: row.content,
            polished_content: row.polished_content,
            task_ids: row.task_ids.0,
            statistics: row.statistics.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn create(&self, request: &ReportCreateDBRequest, now: DateTime<Utc>) -> Result<ReportDBResponse>;
    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<ReportDBResponse>>;
    /// All reports of one user, newest first.
    async fn list(&self, owner: Uuid) -> Result<Vec<ReportDBResponse>>;
    /// Returns `None` when the report does not exist for this owner.
    async fn set_polished(
        &self,
        owner: Uuid,
        id: Uuid,
        polished: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ReportDBResponse>>;
    /// Returns whether a row was deleted.
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool>;
}

pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    #[instrument(skip(self, request), fields(user_id = %request.user_id, report_type = %request.report_type.as_str()), err)]
    async fn create(&self, request: &ReportCreateDBRequest, now: DateTime<Utc>) -> Result<ReportDBResponse> {
        let report_id = Uuid::new_v4();

        let row = sqlx::query_as::<_, ReportRow>(&format!(
            r#"
            INSERT INTO reports (id, user_id, report_type, period, title, content, task_ids, statistics, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(report_id)
        .bind(request.user_id)
        .bind(request.report_type.as_str())
        .bind(&request.period)
        .bind(&request.title)
        .bind(&request.content)
        .bind(sqlx::types::Json(&request.task_ids))
        .bind(sqlx::types::Json(&request.statistics))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    #[instrument(skip(self), fields(report_id = %id), err)]
    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<ReportDBResponse>> {
        let row = sqlx::query_as::<_, ReportRow>(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ReportDBResponse::try_from).transpose()
    }

    #[instrument(skip(self), fields(owner = %owner), err)]
    async fn list(&self, owner: Uuid) -> Result<Vec<ReportDBResponse>> {
        let rows = sqlx::query_as::<_, ReportRow>(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ReportDBResponse::try_from).collect()
    }

    #[instrument(skip(self, polished), fields(report_id = %id), err)]
    async fn set_polished(
        &self,
        owner: Uuid,
        id: Uuid,
        polished: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ReportDBResponse>> {
        let row = sqlx::query_as::<_, ReportRow>(&format!(
            r#"
            UPDATE reports
            SET polished_content = $3,
                updated_at = $4
            WHERE id = $1 AND user_id = $2
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner)
        .bind(polished)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ReportDBResponse::try_from).transpose()
    }

    #[instrument(skip(self), fields(report_id = %id), err)]
    async fn delete(&self, owner: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reports WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

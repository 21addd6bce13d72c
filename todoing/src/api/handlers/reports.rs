use axum::{
    extract::{Path, State},
    http::header,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::{
    api::{
        models::{
            common::MessageResponse,
            reports::{GenerateReportRequest, PolishReportRequest, ReportResponse, ReportType},
            users::CurrentUser,
        },
        REPORTS_DEADLINE,
    },
    db::models::reports::ReportCreateDBRequest,
    errors::{bounded, Error},
    reporting::{self, ExportFormat},
    AppState,
};

/// Report windows are given as bare dates; the start lands on midnight UTC.
fn parse_day(value: &str, message: &'static str) -> Result<DateTime<Utc>, Error> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| Error::BadRequest {
            message: message.to_string(),
        })
}

/// Generate a report over a date window
#[utoipa::path(
    post,
    path = "/api/reports/generate",
    request_body = GenerateReportRequest,
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The generated report", body = ReportResponse),
        (status = 400, description = "Unknown type or malformed dates"),
        (status = 401, description = "Missing or invalid token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn generate_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<GenerateReportRequest>,
) -> Result<Json<ReportResponse>, Error> {
    bounded("generate report", REPORTS_DEADLINE, async move {
        let report_type = request
            .report_type
            .as_deref()
            .and_then(ReportType::parse)
            .ok_or_else(|| Error::BadRequest {
                message: "Invalid report type".to_string(),
            })?;
        let raw_start = request.start_date.unwrap_or_default();
        let start = parse_day(&raw_start, "Invalid start date format")?;
        let raw_end = request.end_date.unwrap_or_default();
        let end = reporting::end_of_day(parse_day(&raw_end, "Invalid end date format")?);

        let tasks = state.tasks.list_created_between(current_user.id, start, end).await?;
        let now = state.clock.now();
        let statistics = reporting::compute_statistics(&tasks, now);

        let report = state
            .reports
            .create(
                &ReportCreateDBRequest {
                    user_id: current_user.id,
                    report_type,
                    period: request
                        .period
                        .filter(|p| !p.is_empty())
                        .unwrap_or_else(|| format!("{raw_start} - {raw_end}")),
                    title: reporting::render_title(report_type, start, end),
                    content: reporting::render_content(report_type, start, end, &tasks, &statistics),
                    task_ids: tasks.iter().map(|task| task.id).collect(),
                    statistics,
                },
                now,
            )
            .await?;

        Ok(Json(ReportResponse::from(report)))
    })
    .await
}

/// List the caller's reports
#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "reports",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Reports, newest first", body = Vec<ReportResponse>),
        (status = 401, description = "Missing or invalid token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_reports(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<ReportResponse>>, Error> {
    bounded("list reports", REPORTS_DEADLINE, async move {
        let reports = state.reports.list(current_user.id).await?;
        Ok(Json(reports.into_iter().map(ReportResponse::from).collect()))
    })
    .await
}

/// Fetch one report
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "The report", body = ReportResponse),
        (status = 404, description = "No such report for this user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportResponse>, Error> {
    bounded("fetch report", REPORTS_DEADLINE, async move {
        let report = state
            .reports
            .get(current_user.id, id)
            .await?
            .ok_or(Error::NotFound { resource: "Report" })?;
        Ok(Json(ReportResponse::from(report)))
    })
    .await
}

/// Delete a report
#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report deleted", body = MessageResponse),
        (status = 404, description = "No such report for this user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, Error> {
    bounded("delete report", REPORTS_DEADLINE, async move {
        if !state.reports.delete(current_user.id, id).await? {
            return Err(Error::NotFound { resource: "Report" });
        }
        Ok(Json(MessageResponse::new("Report deleted successfully")))
    })
    .await
}

/// Polish a report's content
#[utoipa::path(
    post,
    path = "/api/reports/{id}/polish",
    request_body = PolishReportRequest,
    tag = "reports",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "The report with polished content", body = ReportResponse),
        (status = 404, description = "No such report for this user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn polish_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<PolishReportRequest>,
) -> Result<Json<ReportResponse>, Error> {
    bounded("polish report", REPORTS_DEADLINE, async move {
        if let Some(model) = request.model.as_deref() {
            tracing::debug!(%model, "Polish requested with an explicit model");
        }

        let report = state
            .reports
            .get(current_user.id, id)
            .await?
            .ok_or(Error::NotFound { resource: "Report" })?;

        let polished = reporting::polish_content(&report.content);
        let report = state
            .reports
            .set_polished(current_user.id, id, &polished, state.clock.now())
            .await?
            .ok_or(Error::NotFound { resource: "Report" })?;

        Ok(Json(ReportResponse::from(report)))
    })
    .await
}

/// Download a report as Markdown or plain text
#[utoipa::path(
    get,
    path = "/api/reports/{id}/export/{format}",
    tag = "reports",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Report id"),
        ("format" = String, Path, description = "md or txt"),
    ),
    responses(
        (status = 200, description = "The rendered report as an attachment", body = String),
        (status = 400, description = "Unsupported format"),
        (status = 404, description = "No such report for this user"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn export_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((id, format)): Path<(Uuid, String)>,
) -> Result<([(header::HeaderName, String); 2], String), Error> {
    bounded("export report", REPORTS_DEADLINE, async move {
        let format = ExportFormat::parse(&format).ok_or_else(|| Error::BadRequest {
            message: "Unsupported format".to_string(),
        })?;
        let report = state
            .reports
            .get(current_user.id, id)
            .await?
            .ok_or(Error::NotFound { resource: "Report" })?;

        let body = report
            .polished_content
            .as_deref()
            .filter(|polished| !polished.is_empty())
            .unwrap_or(&report.content);
        let now = state.clock.now();
        let rendered = match format {
            ExportFormat::Markdown => reporting::export_markdown(&report, body, now),
            ExportFormat::Text => reporting::export_text(&report, body, now),
        };

        Ok((
            [
                (header::CONTENT_TYPE, format.content_type().to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", reporting::export_filename(&report, format)),
                ),
            ],
            rendered,
        ))
    })
    .await
}

//! OpenAPI documentation configuration.
//!
//! Defines the spec behind the Scalar reference at `/docs`, covering the
//! authentication, task, and report surfaces.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;

/// Bearer JWT scheme shared by every protected route.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "bearer_auth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token issued by register and login. Pass it in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```\n\n\
                            Tokens expire after one hour.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::get_captcha,
        api::handlers::auth::verify_captcha,
        api::handlers::auth::send_email_code,
        api::handlers::auth::send_login_email_code,
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::me,
        api::handlers::tasks::list_tasks,
        api::handlers::tasks::create_task,
        api::handlers::tasks::get_task,
        api::handlers::tasks::update_task,
        api::handlers::tasks::delete_task,
        api::handlers::tasks::add_comment,
        api::handlers::tasks::assign_task,
        api::handlers::tasks::export_tasks,
        api::handlers::tasks::import_tasks,
        api::handlers::reports::generate_report,
        api::handlers::reports::list_reports,
        api::handlers::reports::get_report,
        api::handlers::reports::delete_report,
        api::handlers::reports::polish_report,
        api::handlers::reports::export_report,
    ),
    components(
        schemas(
            api::models::common::MessageResponse,
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::VerifyCaptchaRequest,
            api::models::auth::SendEmailCodeRequest,
            api::models::auth::TokenResponse,
            api::models::auth::CaptchaResponse,
            api::models::auth::EmailCodeResponse,
            api::models::users::UserResponse,
            api::models::tasks::TaskStatus,
            api::models::tasks::TaskPriority,
            api::models::tasks::TaskComment,
            api::models::tasks::TaskResponse,
            api::models::tasks::TaskCreateRequest,
            api::models::tasks::TaskUpdateRequest,
            api::models::tasks::AddCommentRequest,
            api::models::tasks::AssignTaskRequest,
            api::models::tasks::ImportTasksRequest,
            api::models::tasks::ImportTaskItem,
            api::models::tasks::ImportCommentItem,
            api::models::tasks::TasksListResponse,
            api::models::tasks::TaskEnvelope,
            api::models::tasks::ImportTasksResponse,
            api::models::tasks::ImportTaskError,
            api::models::reports::ReportType,
            api::models::reports::ReportStatistics,
            api::models::reports::ReportResponse,
            api::models::reports::GenerateReportRequest,
            api::models::reports::PolishReportRequest,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login, and the captcha and email verification challenges that guard them.

Register and login both return a bearer token; pass it in the `Authorization` header for everything else."),
        (name = "tasks", description = "Personal task management.

Tasks belong to the user who created them; another user's task ids behave as if they do not exist. Includes batch export/import for backups."),
        (name = "reports", description = "Daily, weekly, and monthly Markdown reports derived from your tasks.

Reports snapshot their statistics at generation time and can be polished and downloaded as `.md` or `.txt`."),
    ),
    info(
        title = "TodoIng API",
        version = "1.0.0",
        description = "Backend for the TodoIng task and report application.

## Authentication

Register or log in to obtain a session token, then pass it as a bearer token:

```
Authorization: Bearer YOUR_TOKEN
```

## Errors

Every error body carries a single human-readable field:

```json
{
  \"message\": \"Task not found\"
}
```"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_builds_and_covers_all_surfaces() {
        let spec = ApiDoc::openapi();

        let paths: Vec<&String> = spec.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/api/auth/login"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/tasks/{id}/assign"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/reports/{id}/export/{format}"));

        let components = spec.components.expect("components should be present");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("TaskResponse"));
    }
}

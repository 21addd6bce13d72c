//! # todoing: Task and Report Backend
//!
//! `todoing` is the backend for TodoIng, a personal task tracker that turns the
//! week's work into shareable reports. It exposes a JSON API for account
//! management, task CRUD with comments and assignment, batch import/export of
//! task backups, and daily/weekly/monthly Markdown reports derived from the
//! task history.
//!
//! ## Overview
//!
//! Every resource in the system belongs to exactly one user. Clients register
//! (optionally gated by an image captcha and email verification codes), obtain
//! a bearer token, and from then on only ever see their own tasks and reports;
//! someone else's ids behave as if they do not exist. Reports are generated on
//! demand from the tasks created inside a date window, snapshot their
//! statistics at generation time, and can be polished and downloaded as
//! Markdown or plain text.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL for persistence.
//!
//! The **API layer** ([`api`]) contains the route handlers and the wire
//! models. Handlers validate input, run business logic through the store
//! traits, and serialize responses; errors funnel through
//! [`errors::Error`] into `{"message": ...}` bodies.
//!
//! The **authentication layer** ([`auth`]) mints and verifies the JWT session
//! tokens and resolves `Authorization: Bearer` headers to user records via an
//! extractor. The one-time challenges that guard registration and login live
//! in [`verification`], backed by an in-process store with a background
//! sweeper.
//!
//! The **database layer** ([`db`]) puts each entity behind a store trait with
//! a Postgres implementation, so handlers never touch SQL and tests can swap
//! in the in-memory stores.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use todoing::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let _args = todoing::config::Args::parse();
//!     let config = Config::load()?;
//!
//!     // Initialize telemetry (structured logging)
//!     todoing::telemetry::init_telemetry()?;
//!
//!     // Create and start the application
//!     let app = Application::new(config).await?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The application requires a PostgreSQL database and automatically runs
//! migrations on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! // Run migrations
//! todoing::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod email;
pub mod errors;
mod openapi;
pub mod reporting;
pub mod telemetry;
pub mod verification;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::sync::Arc;

use axum::{routing::get, routing::post, Json, Router};
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    auth::password,
    clock::Clock,
    db::handlers::{PgReportStore, PgTaskStore, PgUserStore, ReportStore, TaskStore, UserStore},
    db::models::users::UserCreateDBRequest,
    email::EmailService,
    openapi::ApiDoc,
    verification::VerificationStore,
};

/// Application state shared across all request handlers.
///
/// Everything in here is cheap to clone: the stores and services are behind
/// [`Arc`]s and the clock is a handle.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub reports: Arc<dyn ReportStore>,
    pub verification: Arc<VerificationStore>,
    pub email: Arc<EmailService>,
    pub clock: Clock,
    pub config: Config,
}

/// Get the todoing database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the configured default user if no account matches it yet.
///
/// Runs at startup and is idempotent: when `DEFAULT_USERNAME`,
/// `DEFAULT_PASSWORD` and `DEFAULT_EMAIL` are all set and neither the
/// username nor the email is taken, the account is created with a hashed
/// password; otherwise nothing happens.
#[instrument(skip_all)]
pub async fn seed_default_user(config: &Config, users: &dyn UserStore, clock: &Clock) -> anyhow::Result<()> {
    let Some((username, password, email)) = config.default_user() else {
        return Ok(());
    };

    let email = email.trim().to_lowercase();
    if users.get_by_username(username).await?.is_some() || users.get_by_email(&email).await?.is_some() {
        debug!("Default user already present, skipping seeding");
        return Ok(());
    }

    let password_hash = password::hash_password(password)?;
    users
        .create(
            &UserCreateDBRequest {
                username: username.to_string(),
                email,
                password_hash,
            },
            clock.now(),
        )
        .await?;

    info!("Default user created successfully");
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Build the application router with all endpoints and middleware.
///
/// This constructs the complete Axum router with:
/// - Authentication routes (captcha, email codes, register, login, me)
/// - Task routes (CRUD, comments, assignment, import/export)
/// - Report routes (generation, polish, export)
/// - Scalar API reference at `/docs`
/// - Permissive CORS and tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/captcha", get(api::handlers::auth::get_captcha))
        .route("/api/auth/verify-captcha", post(api::handlers::auth::verify_captcha))
        .route("/api/auth/send-email-code", post(api::handlers::auth::send_email_code))
        .route("/api/auth/send-login-email-code", post(api::handlers::auth::send_login_email_code))
        .route("/api/auth/register", post(api::handlers::auth::register))
        .route("/api/auth/login", post(api::handlers::auth::login))
        .route("/api/auth/me", get(api::handlers::auth::me));

    let task_routes = Router::new()
        .route(
            "/api/tasks",
            get(api::handlers::tasks::list_tasks).post(api::handlers::tasks::create_task),
        )
        // Static segments before the id routes so "export" never parses as an id
        .route("/api/tasks/export/all", get(api::handlers::tasks::export_tasks))
        .route("/api/tasks/import", post(api::handlers::tasks::import_tasks))
        .route(
            "/api/tasks/{id}",
            get(api::handlers::tasks::get_task)
                .put(api::handlers::tasks::update_task)
                .delete(api::handlers::tasks::delete_task),
        )
        .route("/api/tasks/{id}/comments", post(api::handlers::tasks::add_comment))
        .route("/api/tasks/{id}/assign", post(api::handlers::tasks::assign_task));

    let report_routes = Router::new()
        .route("/api/reports", get(api::handlers::reports::list_reports))
        .route("/api/reports/generate", post(api::handlers::reports::generate_report))
        .route(
            "/api/reports/{id}",
            get(api::handlers::reports::get_report).delete(api::handlers::reports::delete_report),
        )
        .route("/api/reports/{id}/polish", post(api::handlers::reports::polish_report))
        .route("/api/reports/{id}/export/{format}", get(api::handlers::reports::export_report));

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes)
        .merge(task_routes)
        .merge(report_routes)
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Container for background tasks and their lifecycle management.
///
/// Currently this owns the verification sweeper. The `drop_guard` cancels the
/// shutdown token if the container is dropped without an explicit
/// [`shutdown`](BackgroundServices::shutdown), so tests never leak tickers.
pub struct BackgroundServices {
    background_tasks: Vec<tokio::task::JoinHandle<()>>,
    shutdown_token: CancellationToken,
    // Pub so that we can disarm it if we want to
    pub drop_guard: Option<tokio_util::sync::DropGuard>,
}

impl BackgroundServices {
    /// Gracefully shutdown all background tasks
    pub async fn shutdown(self) {
        // Signal all background tasks to shutdown
        self.shutdown_token.cancel();

        // Wait for all background tasks to complete
        for handle in self.background_tasks {
            let _ = handle.await;
        }
    }
}

/// Spawn the background services (verification sweeper).
pub fn setup_background_services(verification: Arc<VerificationStore>, shutdown_token: CancellationToken) -> BackgroundServices {
    let drop_guard = shutdown_token.clone().drop_guard();
    let mut background_tasks = Vec::new();

    let handle = tokio::spawn(verification.run_sweeper(shutdown_token.clone()));
    background_tasks.push(handle);

    BackgroundServices {
        background_tasks,
        shutdown_token,
        drop_guard: Some(drop_guard),
    }
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects the pool, runs migrations,
///    seeds the default user, and starts background services
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts
///    handling requests
/// 3. **Shutdown**: when the shutdown signal resolves, gracefully stops the
///    background tasks and closes the pool
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
    bg_services: BackgroundServices,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting TodoIng backend with configuration: {:#?}", config);

        let pool = PgPool::connect(&config.database_url).await?;
        migrator().run(&pool).await?;

        let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
        let tasks: Arc<dyn TaskStore> = Arc::new(PgTaskStore::new(pool.clone()));
        let reports: Arc<dyn ReportStore> = Arc::new(PgReportStore::new(pool.clone()));
        let clock = Clock::System;

        seed_default_user(&config, users.as_ref(), &clock).await?;

        let verification = Arc::new(VerificationStore::new(clock.clone()));
        let email = Arc::new(EmailService::new(&config)?);

        let shutdown_token = CancellationToken::new();
        let bg_services = setup_background_services(verification.clone(), shutdown_token);

        let state = AppState {
            users,
            tasks,
            reports,
            verification,
            email,
            clock,
            config: config.clone(),
        };
        let router = build_router(state);

        Ok(Self {
            router,
            config,
            pool,
            bg_services,
        })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "TodoIng backend listening on http://{}, docs at http://localhost:{}/docs",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Shutdown background services and wait for tasks to complete
        self.bg_services.shutdown().await;

        // Close database connections
        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

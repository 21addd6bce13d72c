//! Test utilities for integration testing (available with `test-utils` feature).

use std::sync::Arc;

use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use crate::{
    AppState, build_router,
    clock::Clock,
    config::Config,
    db::memory::{MemoryReportStore, MemoryTaskStore, MemoryUserStore},
    email::EmailService,
    verification::VerificationStore,
};

/// Pinned "now" used by the test servers.
///
/// Sits in the future because the JWT library checks token expiry against the
/// wall clock; a pinned instant in the past would make every minted token
/// arrive dead.
pub fn test_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap()
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "postgresql://localhost/unused-in-tests".to_string(),
        jwt_secret: "test-secret-key-for-testing-only".to_string(),
        ..Config::default()
    }
}

/// Application state over the in-memory stores.
pub fn create_test_state(config: Config, clock: Clock) -> AppState {
    let email = EmailService::new(&config).expect("Failed to create email service");

    AppState {
        users: Arc::new(MemoryUserStore::new()),
        tasks: Arc::new(MemoryTaskStore::new()),
        reports: Arc::new(MemoryReportStore::new()),
        verification: Arc::new(VerificationStore::new(clock.clone())),
        email: Arc::new(email),
        clock,
        config,
    }
}

/// Test server with default configuration and time pinned at [`test_epoch`].
///
/// The returned state shares the server's stores and clock, so tests can
/// advance time or inspect pending verification challenges directly.
pub fn create_test_app() -> (TestServer, AppState) {
    create_test_app_with(create_test_config())
}

pub fn create_test_app_with(config: Config) -> (TestServer, AppState) {
    let state = create_test_state(config, Clock::fixed(test_epoch()));
    let server = TestServer::new(build_router(state.clone())).expect("Failed to create test server");
    (server, state)
}

/// Register an account and return its session token.
pub async fn register_user(server: &TestServer, username: &str, email: &str, password: &str) -> String {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "email": email,
            "password": password,
        }))
        .await;
    response.assert_status_ok();

    response.json::<serde_json::Value>()["token"]
        .as_str()
        .expect("register response should contain a token")
        .to_string()
}

/// `Authorization` header value for a session token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

//! API request/response models for authentication.
//!
//! Field presence is validated in the handlers rather than by serde so that
//! clients get the exact message they match on ("Name is required" and
//! friends) instead of a deserializer rejection.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Required when email verification is enabled
    pub email_code: Option<String>,
    pub email_code_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub email: Option<String>,
    /// Password login; ignored when an email code is supplied
    pub password: Option<String>,
    /// Required when the captcha feature is enabled
    pub captcha_id: Option<String>,
    pub captcha: Option<String>,
    /// Email-code login; takes precedence over the password
    pub email_code: Option<String>,
    pub email_code_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyCaptchaRequest {
    pub captcha_id: Option<String>,
    pub captcha: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SendEmailCodeRequest {
    pub email: Option<String>,
}

/// Session token issued on register and login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Captcha challenge. When the feature is off, `id` is `"disabled"` and the
/// image is a 1x1 placeholder.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaptchaResponse {
    pub image: String,
    pub id: String,
    pub message: String,
}

/// Acknowledgement carrying the challenge id to echo back with the code.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmailCodeResponse {
    pub message: String,
    pub id: String,
}

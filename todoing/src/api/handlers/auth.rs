use axum::{extract::State, Json};

use crate::{
    api::{
        models::{
            auth::{
                CaptchaResponse, EmailCodeResponse, LoginRequest, RegisterRequest, SendEmailCodeRequest, TokenResponse,
                VerifyCaptchaRequest,
            },
            common::MessageResponse,
            users::{CurrentUser, UserResponse},
        },
        AUTH_DEADLINE,
    },
    auth::{password, session},
    db::models::users::UserCreateDBRequest,
    errors::{bounded, Error},
    verification::{captcha, generate_email_code, ChallengeKind, VerifyOutcome},
    AppState,
};

const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimal shape check. Real deliverability is proven by the email code
/// flow, not by parsing.
fn valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// Emails are compared and stored in trimmed, lowercased form.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_email_code(outcome: VerifyOutcome) -> Result<(), Error> {
    let message = match outcome {
        VerifyOutcome::Ok => return Ok(()),
        VerifyOutcome::InvalidOrExpired => "Invalid or expired email verification code",
        VerifyOutcome::SubjectMismatch => "Email does not match the verification code",
        VerifyOutcome::TooManyAttempts => "Too many attempts. Please request a new verification code.",
        VerifyOutcome::Mismatch => "Invalid email verification code",
    };
    Err(Error::BadRequest {
        message: message.to_string(),
    })
}

fn check_captcha(outcome: VerifyOutcome) -> Result<(), Error> {
    let message = match outcome {
        VerifyOutcome::Ok => return Ok(()),
        // Captcha challenges carry an empty subject, so a subject mismatch
        // can only mean a forged or stale id.
        VerifyOutcome::InvalidOrExpired | VerifyOutcome::SubjectMismatch => "Invalid or expired captcha",
        VerifyOutcome::TooManyAttempts => "Too many attempts. Please request a new verification code.",
        VerifyOutcome::Mismatch => "Invalid captcha",
    };
    Err(Error::BadRequest {
        message: message.to_string(),
    })
}

/// Issue a captcha challenge
#[utoipa::path(
    get,
    path = "/api/auth/captcha",
    tag = "auth",
    responses(
        (status = 200, description = "Captcha challenge, or a placeholder when the feature is off", body = CaptchaResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_captcha(State(state): State<AppState>) -> Result<Json<CaptchaResponse>, Error> {
    if !state.config.enable_captcha {
        return Ok(Json(CaptchaResponse {
            image: captcha::disabled_image(),
            id: "disabled".to_string(),
            message: "Captcha is not enabled".to_string(),
        }));
    }

    let challenge = captcha::generate();
    let id = state.verification.generate(ChallengeKind::Captcha, "", &challenge.answer);
    Ok(Json(CaptchaResponse {
        image: challenge.image,
        id,
        message: "Captcha generated successfully".to_string(),
    }))
}

/// Verify a captcha answer
#[utoipa::path(
    post,
    path = "/api/auth/verify-captcha",
    request_body = VerifyCaptchaRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Captcha verified or bypassed", body = MessageResponse),
        (status = 400, description = "Missing, wrong, or expired answer"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn verify_captcha(
    State(state): State<AppState>,
    Json(request): Json<VerifyCaptchaRequest>,
) -> Result<Json<MessageResponse>, Error> {
    if !state.config.enable_captcha {
        return Ok(Json(MessageResponse::new("Captcha verification bypassed")));
    }

    let answer = request.captcha.unwrap_or_default();
    if answer.is_empty() {
        return Err(Error::BadRequest {
            message: "Captcha is required".to_string(),
        });
    }
    let id = request.captcha_id.unwrap_or_default();
    if id.is_empty() {
        return Err(Error::BadRequest {
            message: "Captcha ID is required".to_string(),
        });
    }

    check_captcha(state.verification.verify(ChallengeKind::Captcha, &id, "", &answer))?;
    Ok(Json(MessageResponse::new("Captcha verified successfully")))
}

/// Send a registration email verification code
#[utoipa::path(
    post,
    path = "/api/auth/send-email-code",
    request_body = SendEmailCodeRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Code sent", body = EmailCodeResponse),
        (status = 400, description = "Feature disabled, invalid email, or email already registered"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn send_email_code(
    State(state): State<AppState>,
    Json(request): Json<SendEmailCodeRequest>,
) -> Result<Json<EmailCodeResponse>, Error> {
    bounded("send email code", AUTH_DEADLINE, async move {
        if !state.config.enable_email_verification {
            return Err(Error::BadRequest {
                message: "Email verification is not enabled".to_string(),
            });
        }

        let email = normalize_email(&request.email.unwrap_or_default());
        if !valid_email(&email) {
            return Err(Error::BadRequest {
                message: "Please include a valid email".to_string(),
            });
        }
        if state.users.get_by_email(&email).await?.is_some() {
            return Err(Error::BadRequest {
                message: "User already exists".to_string(),
            });
        }

        let code = generate_email_code();
        let id = state.verification.generate(ChallengeKind::EmailCode, &email, &code);
        state.email.send_verification_code(&email, &code).await?;

        Ok(Json(EmailCodeResponse {
            message: "Verification code sent successfully".to_string(),
            id,
        }))
    })
    .await
}

/// Send a login email verification code
#[utoipa::path(
    post,
    path = "/api/auth/send-login-email-code",
    request_body = SendEmailCodeRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Code sent", body = EmailCodeResponse),
        (status = 400, description = "Feature disabled, invalid email, or no such account"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn send_login_email_code(
    State(state): State<AppState>,
    Json(request): Json<SendEmailCodeRequest>,
) -> Result<Json<EmailCodeResponse>, Error> {
    bounded("send login email code", AUTH_DEADLINE, async move {
        if !state.config.enable_email_verification {
            return Err(Error::BadRequest {
                message: "Email verification is not enabled".to_string(),
            });
        }

        let email = normalize_email(&request.email.unwrap_or_default());
        if !valid_email(&email) {
            return Err(Error::BadRequest {
                message: "Please include a valid email".to_string(),
            });
        }
        if state.users.get_by_email(&email).await?.is_none() {
            return Err(Error::BadRequest {
                message: "User does not exist".to_string(),
            });
        }

        let code = generate_email_code();
        let id = state.verification.generate(ChallengeKind::EmailCode, &email, &code);
        state.email.send_verification_code(&email, &code).await?;

        Ok(Json(EmailCodeResponse {
            message: "Login verification code sent successfully".to_string(),
            id,
        }))
    })
    .await
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Account created, session token issued", body = TokenResponse),
        (status = 400, description = "Invalid input or failed email code check"),
        (status = 403, description = "Registration is disabled"),
        (status = 409, description = "Username or email already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<Json<TokenResponse>, Error> {
    bounded("register", AUTH_DEADLINE, async move {
        if state.config.disable_registration {
            return Err(Error::Forbidden {
                message: "Registration is disabled".to_string(),
            });
        }

        let username = request.username.unwrap_or_default();
        if username.is_empty() {
            return Err(Error::BadRequest {
                message: "Name is required".to_string(),
            });
        }
        let email = normalize_email(&request.email.unwrap_or_default());
        if !valid_email(&email) {
            return Err(Error::BadRequest {
                message: "Please include a valid email".to_string(),
            });
        }
        let password = request.password.unwrap_or_default();
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(Error::BadRequest {
                message: "Please enter a password with 6 or more characters".to_string(),
            });
        }

        if state.config.enable_email_verification {
            let code = request.email_code.unwrap_or_default();
            if code.is_empty() {
                return Err(Error::BadRequest {
                    message: "Email verification code is required".to_string(),
                });
            }
            let code_id = request.email_code_id.unwrap_or_default();
            if code_id.is_empty() {
                return Err(Error::BadRequest {
                    message: "Email verification code ID is required".to_string(),
                });
            }
            check_email_code(state.verification.verify(ChallengeKind::EmailCode, &code_id, &email, &code))?;
        }

        // Friendly pre-checks; the unique indices are the real guarantee and
        // a racing duplicate insert maps to the same 409s.
        if state.users.get_by_username(&username).await?.is_some() {
            return Err(Error::Conflict {
                message: "Username already exists".to_string(),
            });
        }
        if state.users.get_by_email(&email).await?.is_some() {
            return Err(Error::Conflict {
                message: "Email already exists".to_string(),
            });
        }

        // Hash the password on a blocking thread to avoid stalling the async runtime
        let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn password hashing task: {e}"),
            })??;

        let now = state.clock.now();
        let user = state
            .users
            .create(
                &UserCreateDBRequest {
                    username,
                    email,
                    password_hash,
                },
                now,
            )
            .await?;

        let token = session::create_session_token(user.id, &state.config, now)?;
        Ok(Json(TokenResponse { token }))
    })
    .await
}

/// Log in with a password or an email code
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Session token issued", body = TokenResponse),
        (status = 400, description = "Invalid credentials or failed captcha/email code check"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<TokenResponse>, Error> {
    bounded("login", AUTH_DEADLINE, async move {
        let email = normalize_email(&request.email.unwrap_or_default());
        let user = state.users.get_by_email(&email).await?.ok_or_else(|| Error::BadRequest {
            message: "Invalid Credentials".to_string(),
        })?;

        let email_code = request.email_code.unwrap_or_default();
        let email_code_id = request.email_code_id.unwrap_or_default();
        let email_code_login = state.config.enable_email_verification && !email_code.is_empty() && !email_code_id.is_empty();

        if email_code_login {
            check_email_code(state.verification.verify(ChallengeKind::EmailCode, &email_code_id, &email, &email_code))?;
        } else {
            let provided = request.password.unwrap_or_default();
            if provided.is_empty() {
                return Err(Error::BadRequest {
                    message: "Password is required".to_string(),
                });
            }
            let hash = user.password_hash.clone();
            let matches = tokio::task::spawn_blocking(move || password::verify_password(&provided, &hash))
                .await
                .map_err(|e| Error::Internal {
                    operation: format!("spawn password verification task: {e}"),
                })??;
            if !matches {
                return Err(Error::BadRequest {
                    message: "Invalid Credentials".to_string(),
                });
            }

            // The captcha gates password logins only; an email code is
            // already a second factor.
            if state.config.enable_captcha {
                let answer = request.captcha.unwrap_or_default();
                if answer.is_empty() {
                    return Err(Error::BadRequest {
                        message: "Captcha is required".to_string(),
                    });
                }
                let captcha_id = request.captcha_id.unwrap_or_default();
                if captcha_id.is_empty() {
                    return Err(Error::BadRequest {
                        message: "Captcha ID is required".to_string(),
                    });
                }
                check_captcha(state.verification.verify(ChallengeKind::Captcha, &captcha_id, "", &answer))?;
            }
        }

        let now = state.clock.now();
        if let Err(error) = state.users.record_login(user.id, now).await {
            tracing::warn!(user_id = %user.id, "Failed to record login time: {error}");
        }

        let token = session::create_session_token(user.id, &state.config, now)?;
        Ok(Json(TokenResponse { token }))
    })
    .await
}

/// Get the authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>, Error> {
    bounded("fetch current user", AUTH_DEADLINE, async move {
        let user = state
            .users
            .get_by_id(current_user.id)
            .await?
            .ok_or_else(|| Error::Unauthenticated {
                message: "Token is not valid".to_string(),
            })?;
        Ok(Json(UserResponse::from(user)))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_check() {
        assert!(valid_email("alice@example.com"));
        assert!(valid_email("a.b+c@sub.example.co"));
        assert!(!valid_email("alice"));
        assert!(!valid_email("alice@example"));
        assert!(!valid_email("@example.com"));
        assert!(!valid_email(""));
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn email_code_outcomes_map_to_messages() {
        assert!(check_email_code(VerifyOutcome::Ok).is_ok());
        let err = check_email_code(VerifyOutcome::SubjectMismatch).unwrap_err();
        assert!(err.user_message().contains("does not match"));
        let err = check_email_code(VerifyOutcome::Mismatch).unwrap_err();
        assert_eq!(err.user_message(), "Invalid email verification code");
    }

    #[test]
    fn captcha_outcomes_map_to_messages() {
        assert!(check_captcha(VerifyOutcome::Ok).is_ok());
        let err = check_captcha(VerifyOutcome::InvalidOrExpired).unwrap_err();
        assert_eq!(err.user_message(), "Invalid or expired captcha");
        let err = check_captcha(VerifyOutcome::Mismatch).unwrap_err();
        assert_eq!(err.user_message(), "Invalid captcha");
    }
}

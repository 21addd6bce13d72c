//! Request extractor that authenticates the caller.
//!
//! Every protected route takes a [`CurrentUser`] argument; extraction verifies
//! the `Authorization: Bearer <jwt>` header and loads the user so handlers
//! never see a token for a deleted account.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

use crate::{
    api::models::users::CurrentUser,
    auth::session,
    errors::{Error, Result},
    AppState,
};

/// Pull the bearer token out of the Authorization header.
///
/// A missing header and a header that is not `Bearer <token>` report
/// distinct messages.
fn bearer_token(parts: &Parts) -> Result<&str> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthenticated {
            message: "No token, authorization denied".to_string(),
        })?;

    let header = header.to_str().map_err(|_| Error::Unauthenticated {
        message: "Invalid token format".to_string(),
    })?;

    header.strip_prefix("Bearer ").ok_or_else(|| Error::Unauthenticated {
        message: "Invalid token format".to_string(),
    })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts)?;
        let user_id = session::verify_session_token(token, &state.config)?;

        // A valid token for a user that no longer exists is still rejected.
        let user = state
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| {
                trace!("Token referenced a missing user: {user_id}");
                Error::Unauthenticated {
                    message: "Token is not valid".to_string(),
                }
            })?;

        debug!("Authenticated user: {}", user.id);
        Ok(CurrentUser {
            id: user.id,
            username: user.username,
            email: user.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("http://localhost/test");
        if let Some(value) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, value);
        }
        let request = builder.body(()).unwrap();
        let (parts, _body) = request.into_parts();
        parts
    }

    #[test]
    fn missing_header_has_its_own_message() {
        let parts = parts_with_auth(None);
        let error = bearer_token(&parts).unwrap_err();
        assert!(matches!(
            error,
            Error::Unauthenticated { ref message } if message == "No token, authorization denied"
        ));
    }

    #[test]
    fn non_bearer_header_is_a_format_error() {
        for bad in ["Basic abc123", "Bearer", "token-without-scheme"] {
            let parts = parts_with_auth(Some(bad));
            let error = bearer_token(&parts).unwrap_err();
            assert!(
                matches!(
                    error,
                    Error::Unauthenticated { ref message } if message == "Invalid token format"
                ),
                "unexpected error for header {bad:?}"
            );
        }
    }

    #[test]
    fn bearer_token_is_extracted_verbatim() {
        let parts = parts_with_auth(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");
    }
}

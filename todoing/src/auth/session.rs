//! JWT session token creation and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::Config, errors::Error};

/// How long a minted token stays valid.
pub fn session_ttl() -> Duration {
    Duration::hours(1)
}

/// JWT session claims as minted by this service.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user: SessionSubject,
    pub exp: i64, // Expiration time
    pub iat: i64, // Issued at
}

/// Nested subject object carrying the user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSubject {
    pub id: Uuid,
}

impl SessionClaims {
    pub fn new(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user: SessionSubject { id: user_id },
            exp: (now + session_ttl()).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Claims as accepted: either the nested subject or the flat legacy `id`.
#[derive(Debug, Deserialize)]
struct AcceptedClaims {
    user: Option<SessionSubject>,
    id: Option<Uuid>,
    #[allow(dead_code)]
    exp: i64,
}

/// Create a JWT for a user session.
pub fn create_session_token(user_id: Uuid, config: &Config, now: DateTime<Utc>) -> Result<String, Error> {
    let claims = SessionClaims::new(user_id, now);
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify a JWT and extract the user id it names.
pub fn verify_session_token(token: &str, config: &Config) -> Result<Uuid, Error> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<AcceptedClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // The token is the problem: reject the request
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated {
            message: "Token is not valid".to_string(),
        },

        // Our key or algorithm setup is the problem: surface a server error
        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },

        // ErrorKind is non-exhaustive; treat anything new as a server error
        _ => Error::Internal {
            operation: format!("JWT verification (unknown error): {e}"),
        },
    })?;

    let claims = token_data.claims;
    claims
        .user
        .map(|subject| subject.id)
        .or(claims.id)
        .ok_or_else(|| Error::Unauthenticated {
            message: "Token is not valid".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_config() -> Config {
        Config {
            jwt_secret: "test-secret-key-for-jwt".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_and_verify_session_token() {
        let config = create_test_config();
        let user_id = Uuid::new_v4();

        let token = create_session_token(user_id, &config, Utc::now()).unwrap();
        assert!(!token.is_empty());

        let verified = verify_session_token(&token, &config).unwrap();
        assert_eq!(verified, user_id);
    }

    #[test]
    fn test_verify_token_wrong_secret() {
        let config = create_test_config();
        let token = create_session_token(Uuid::new_v4(), &config, Utc::now()).unwrap();

        let other = Config {
            jwt_secret: "different-secret".to_string(),
            ..Default::default()
        };
        let result = verify_session_token(&token, &other);
        // Should be Unauthenticated (InvalidSignature), not Internal error
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_expired_token() {
        let config = create_test_config();
        // Issued two hours ago, so exp is one hour in the past
        let token = create_session_token(Uuid::new_v4(), &config, Utc::now() - Duration::hours(2)).unwrap();

        let result = verify_session_token(&token, &config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }

    #[test]
    fn test_verify_malformed_token() {
        let config = create_test_config();

        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            let result = verify_session_token(token, &config);
            assert!(
                matches!(result.unwrap_err(), Error::Unauthenticated { .. }),
                "Expected Unauthenticated error for token: {token}"
            );
        }
    }

    #[test]
    fn test_accepts_legacy_flat_claims() {
        let config = create_test_config();
        let user_id = Uuid::new_v4();

        let claims = json!({
            "id": user_id,
            "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        });
        let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();

        let verified = verify_session_token(&token, &config).unwrap();
        assert_eq!(verified, user_id);
    }

    #[test]
    fn test_token_without_any_subject_is_rejected() {
        let config = create_test_config();

        let claims = json!({
            "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        });
        let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();

        let result = verify_session_token(&token, &config);
        assert!(matches!(result.unwrap_err(), Error::Unauthenticated { .. }));
    }
}

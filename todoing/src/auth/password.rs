//! Password hashing with Argon2id.
//!
//! Hashes are PHC strings with the salt and parameters embedded, so
//! verification needs no configuration. The argon2 crate's defaults match
//! the RFC 9106 low-memory profile (19 MiB, t = 2, p = 1). Hashing is
//! CPU-bound; handlers run it on `spawn_blocking`.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::errors::Error;

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal {
            operation: format!("hash password: {e}"),
        })
}

/// Check a password against a stored PHC string.
///
/// A wrong password is `Ok(false)`; an unparseable stored hash is an error,
/// since that means the users table holds something we never wrote.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(stored).map_err(|e| Error::Internal {
        operation: format!("parse stored password hash: {e}"),
    })?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_accepts_the_right_password_only() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("correct horse battery stable", &hash).unwrap());
    }

    #[test]
    fn salts_make_equal_passwords_hash_differently() {
        let first = hash_password("secret123").unwrap();
        let second = hash_password("secret123").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("secret123", &second).unwrap());
    }

    #[test]
    fn corrupt_stored_hash_is_an_error_not_a_mismatch() {
        assert!(verify_password("secret123", "not-a-phc-string").is_err());
    }
}

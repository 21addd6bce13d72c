//! Database error classification.
//!
//! sqlx reports every driver problem through one opaque error type; the
//! store layer narrows that into the few cases handlers actually branch
//! on. Constraint names survive the translation so the API layer can turn
//! `users_username_key` into a which-field-was-taken message.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Error, Debug)]
pub enum DbError {
    /// No row matched the lookup.
    #[error("no matching row")]
    NotFound,

    /// A unique index rejected the write.
    #[error("unique constraint violated ({})", .constraint.as_deref().unwrap_or("unnamed"))]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// A referenced row does not exist.
    #[error("foreign key constraint violated ({})", .constraint.as_deref().unwrap_or("unnamed"))]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// A CHECK constraint rejected the value.
    #[error("check constraint violated ({})", .constraint.as_deref().unwrap_or("unnamed"))]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Anything the caller cannot meaningfully react to.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return DbError::NotFound;
        }

        if let sqlx::Error::Database(ref db_err) = err {
            let constraint = db_err.constraint().map(str::to_string);
            let table = db_err.table().map(str::to_string);
            let message = db_err.message().to_string();

            if db_err.is_unique_violation() {
                return DbError::UniqueViolation { constraint, table, message };
            }
            if db_err.is_foreign_key_violation() {
                return DbError::ForeignKeyViolation { constraint, table, message };
            }
            if db_err.is_check_violation() {
                return DbError::CheckViolation { constraint, table, message };
            }
        }

        DbError::Other(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_is_classified() {
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::NotFound));
    }

    #[test]
    fn unclassified_errors_fall_through_to_other() {
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::Other(_)));
    }

    #[test]
    fn display_names_the_constraint() {
        let err = DbError::UniqueViolation {
            constraint: Some("users_username_key".to_string()),
            table: Some("users".to_string()),
            message: "duplicate key value".to_string(),
        };
        assert_eq!(err.to_string(), "unique constraint violated (users_username_key)");
    }
}

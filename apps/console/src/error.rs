//! # Console Error Type
//!
//! Unified error type for menu actions.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Inventa                                │
//! │                                                                         │
//! │  Menu action (AppResult<()>)                                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Bad input? ───────── ValidationError ──────────┐                       │
//! │         │                                       │                       │
//! │         ▼                                       ▼                       │
//! │  Repository call? ─── DbError / CoreError ──► AppError { code, .. }     │
//! │         │                                       │                       │
//! │         ▼                                       ▼                       │
//! │  Success                              menu loop prints "Error: ..."     │
//! │                                       and shows the options again       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is retried. The user picks the option again.

use std::fmt;

use inventa_core::{CoreError, ValidationError};
use inventa_db::DbError;

use crate::config::ConfigError;

/// Error returned from menu actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Message printed after `Error: `
    pub message: String,

    /// Underlying driver text, printed only when `display.show_error_details` is on.
    pub detail: Option<String>,
}

/// Error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Lookup by id found nothing
    NotFound,

    /// Input rejected before any SQL ran
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// Config file or environment is unusable
    ConfigError,

    /// Terminal read/write failed
    Io,

    /// Standard input reached its end
    InputClosed,

    Internal,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
            detail: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }

    pub fn input_closed() -> Self {
        AppError::new(ErrorCode::InputClosed, "End of input")
    }

    fn database(message: &str, detail: impl Into<String>) -> Self {
        AppError {
            code: ErrorCode::DatabaseError,
            message: message.to_string(),
            detail: Some(detail.into()),
        }
    }

    /// True when stdin is exhausted and menu loops should unwind.
    pub fn is_input_closed(&self) -> bool {
        self.code == ErrorCode::InputClosed
    }

    /// The line shown to the user.
    pub fn display_message(&self, with_detail: bool) -> String {
        match (&self.detail, with_detail) {
            (Some(detail), true) => format!("{} ({})", self.message, detail),
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

/// Converts database errors to console errors.
impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AppError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => AppError::validation(format!(
                "{} '{}' already exists",
                field, value
            )),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                AppError {
                    code: ErrorCode::ValidationError,
                    message: "Invalid reference: the related record does not exist or is still in use"
                        .to_string(),
                    detail: Some(message),
                }
            }
            DbError::Validation(core) => core.into(),
            DbError::ConnectionFailed(e) => AppError::database("Database connection failed", e),
            DbError::MigrationFailed(e) => AppError::database("Database migration failed", e),
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                AppError::database("Database operation failed", e)
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                AppError::database("Database transaction failed", e)
            }
            DbError::PoolExhausted => {
                AppError::database("Database busy", "connection pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                AppError {
                    code: ErrorCode::Internal,
                    message: "Internal error".to_string(),
                    detail: Some(e),
                }
            }
        }
    }
}

/// Converts core errors to console errors.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => AppError::not_found("Product", id),
            CoreError::PersonNotFound(id) => AppError::not_found("Person", id),
            CoreError::Validation(e) => e.into(),
            other @ (CoreError::InsufficientStock { .. } | CoreError::EmptyDocument { .. }) => {
                AppError::validation(other.to_string())
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => AppError::input_closed(),
            _ => AppError::new(ErrorCode::Io, format!("Console I/O failed: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_not_found_maps_to_not_found() {
        let err: AppError = DbError::not_found("Product", "P9").into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Product not found: P9");
    }

    #[test]
    fn test_duplicate_is_validation() {
        let err: AppError = DbError::duplicate("id", "P1").into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("'P1' already exists"));
    }

    #[test]
    fn test_wrapped_core_error_unwraps() {
        let err: AppError = DbError::Validation(CoreError::PersonNotFound("C7".into())).into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Person not found: C7");

        let err: AppError = DbError::from(ValidationError::required("name")).into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "name is required");
    }

    #[test]
    fn test_detail_only_shown_when_enabled() {
        let err: AppError = DbError::QueryFailed("disk I/O error".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(err.display_message(false), "Database operation failed");
        assert_eq!(
            err.display_message(true),
            "Database operation failed (disk I/O error)"
        );
    }

    #[test]
    fn test_eof_is_input_closed() {
        let err: AppError = std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into();
        assert!(err.is_input_closed());

        let err: AppError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert_eq!(err.code, ErrorCode::Io);
    }
}

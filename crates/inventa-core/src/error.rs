//! # Error Types
//!
//! Domain-specific error types for inventa-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  inventa-core errors (this file)                                       │
//! │  ├── CoreError        - Domain rule failures                           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  inventa-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  console app errors                                                    │
//! │  └── AppError         - What the menu prints                           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → AppError → Console      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every validation path in the workspace returns `ValidationResult<T>`.
//! Nothing panics or throws on bad input; menus print the message and
//! return to their option list.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A customer, employee, supplier, user or phone referenced a person
    /// that does not exist.
    #[error("Person not found: {0}")]
    PersonNotFound(String),

    /// Not enough stock to add a sale line.
    ///
    /// ## User Workflow
    /// ```text
    /// Register sale: product P1, quantity 5
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: "P1", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Console shows: "Insufficient stock for P1: available 3, requested 5"
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// A sale or purchase was submitted without lines.
    #[error("{document} has no detail lines")]
    EmptyDocument { document: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any database call is made.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Amount does not fit in the stored cents column.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Date lies in the future where only past dates make sense.
    #[error("{field} cannot be in the future")]
    InFuture { field: String },

    /// Invalid format (e.g., unparsable date or amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Two related fields are in the wrong order.
    #[error("{later} must not be before {earlier}")]
    WrongOrder { earlier: String, later: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

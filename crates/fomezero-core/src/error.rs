//! # Error Types
//!
//! Domain-specific error types for fomezero-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fomezero-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  fomezero-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  fomezero-receivables errors                                           │
//! │  └── ReceivablesError - What callers see, classified 404/400/403/500   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ReceivablesError → caller         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure here is terminal for the operation that raised it. Nothing in
//! the core retries; the caller resubmits a corrected request.

use thiserror::Error;

use crate::access::Capability;
use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Sale cannot be found.
    #[error("sale not found: {0}")]
    SaleNotFound(String),

    /// Customer cannot be found.
    #[error("customer not found: {0}")]
    CustomerNotFound(String),

    /// Payment method id does not exist.
    #[error("payment method not found: {0}")]
    PaymentMethodNotFound(String),

    /// Payment method exists but was deactivated.
    ///
    /// Historical payments keep pointing at it; new payments may not.
    #[error("payment method {0} is inactive")]
    PaymentMethodInactive(String),

    /// Sale was cancelled and no longer accepts payments.
    #[error("sale {0} is cancelled")]
    SaleCancelled(String),

    /// Submitted payments exceed what is still owed on the sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale total R$ 40.00, already paid R$ 15.00
    ///      │
    ///      ▼
    /// Operator submits PIX R$ 30.00
    ///      │
    ///      ▼
    /// 30.00 > 25.00 + 0.01
    ///      │
    ///      ▼
    /// Overpayment { remaining: 25.00, submitted: 30.00 }  (nothing recorded)
    /// ```
    #[error("payment exceeds remaining balance: remaining {remaining}, submitted {submitted}")]
    Overpayment { remaining: Money, submitted: Money },

    /// Store credit use exceeds the customer's balance.
    #[error("insufficient credit balance: available {available}, requested {requested}")]
    InsufficientBalance { available: Money, requested: Money },

    /// Operator lacks the capability the operation requires.
    #[error("operator {operator_id} lacks the {capability} capability")]
    PermissionDenied {
        operator_id: String,
        capability: Capability,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for the "referenced thing does not exist" family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::SaleNotFound(_)
                | CoreError::CustomerNotFound(_)
                | CoreError::PaymentMethodNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any persistence happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// A list that needs at least one entry is empty.
    #[error("{field} must not be empty")]
    Empty { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, malformed amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Amount or sum too large to represent in cents.
    #[error("{field} is out of range")]
    OutOfRange { field: String },

    /// Two amounts that must agree do not.
    #[error("{field} does not add up: expected {expected}, got {actual}")]
    Mismatch {
        field: String,
        expected: Money,
        actual: Money,
    },

    /// Duplicate value (e.g., customer name already taken).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

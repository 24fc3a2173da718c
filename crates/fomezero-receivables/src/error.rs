//! # Receivables Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Receivables Error Categories                         │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Business       │  │   Storage       │  │     Configuration       │ │
//! │  │  (CoreError)    │  │   (DbError)     │  │                         │ │
//! │  │                 │  │                 │  │  InvalidConfig          │ │
//! │  │  SaleNotFound   │  │  NotFound       │  │  ConfigLoadFailed       │ │
//! │  │  Overpayment    │  │  UniqueViolation│  │  ConfigSaveFailed       │ │
//! │  │  Insufficient.. │  │  QueryFailed    │  │                         │ │
//! │  │  PermissionDen..│  │  ...            │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  kind() folds all of them into NotFound / BadRequest / Forbidden /     │
//! │  Internal for whatever transport sits on top.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use fomezero_core::{CoreError, ValidationError};
use fomezero_db::DbError;

/// Result type alias for receivables operations.
pub type ReceivablesResult<T> = Result<T, ReceivablesError>;

/// Error type for every service call.
#[derive(Debug, Error)]
pub enum ReceivablesError {
    /// A business rule rejected the request.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failed.
    #[error(transparent)]
    Db(#[from] DbError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

/// How a caller should surface an error (404 / 400 / 403 / 500).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Forbidden,
    Internal,
}

impl ReceivablesError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReceivablesError::Core(err) if err.is_not_found() => ErrorKind::NotFound,
            ReceivablesError::Core(CoreError::PermissionDenied { .. }) => ErrorKind::Forbidden,
            ReceivablesError::Core(_) => ErrorKind::BadRequest,

            ReceivablesError::Db(DbError::NotFound { .. }) => ErrorKind::NotFound,
            ReceivablesError::Db(
                DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. }
                | DbError::CheckViolation { .. },
            ) => ErrorKind::BadRequest,
            ReceivablesError::Db(_) => ErrorKind::Internal,

            ReceivablesError::InvalidConfig(_)
            | ReceivablesError::ConfigLoadFailed(_)
            | ReceivablesError::ConfigSaveFailed(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ReceivablesError::InvalidConfig(_)
                | ReceivablesError::ConfigLoadFailed(_)
                | ReceivablesError::ConfigSaveFailed(_)
        )
    }

    /// The wrapped business error, if any.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            ReceivablesError::Core(err) => Some(err),
            _ => None,
        }
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for ReceivablesError {
    fn from(err: ValidationError) -> Self {
        ReceivablesError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for ReceivablesError {
    fn from(err: sqlx::Error) -> Self {
        ReceivablesError::Db(DbError::from(err))
    }
}

impl From<std::io::Error> for ReceivablesError {
    fn from(err: std::io::Error) -> Self {
        ReceivablesError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ReceivablesError {
    fn from(err: toml::de::Error) -> Self {
        ReceivablesError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ReceivablesError {
    fn from(err: toml::ser::Error) -> Self {
        ReceivablesError::ConfigSaveFailed(err.to_string())
    }
}

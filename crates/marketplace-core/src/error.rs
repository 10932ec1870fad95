//! The error taxonomy shared by every store and the HTTP layer.

use marketplace_ledger::{LedgerError, TransferError};

/// Errors returned by [`Marketplace`](crate::market::Marketplace)
/// operations.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// The request is malformed (bad amount, bad date, bad limit).
    #[error("{0}")]
    Validation(String),

    /// The record does not exist or the caller may not see it.
    #[error("{0}")]
    NotFound(String),

    /// No valid caller identity.
    #[error("{0}")]
    Unauthenticated(String),

    /// A money rule refused the movement.
    #[error(transparent)]
    Conflict(TransferError),

    /// Store or invariant failure. The message is for logs, not callers.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MarketError {
    /// Shorthand for [`MarketError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for [`MarketError::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Shorthand for [`MarketError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<TransferError> for MarketError {
    fn from(err: TransferError) -> Self {
        if err.is_validation() {
            Self::Validation(err.to_string())
        } else if err.is_conflict() {
            Self::Conflict(err)
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl From<LedgerError> for MarketError {
    fn from(err: LedgerError) -> Self {
        Self::Internal(err.to_string())
    }
}

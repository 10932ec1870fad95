//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] errors, plus the marketplace rule refusals raised inside a
//! transaction so they can travel through the same `?` chain.

use marketplace_core::MarketError;
use marketplace_ledger::{LedgerError, TransferError};

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be mapped back to a domain type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A marketplace rule refused the operation; the transaction was
    /// rolled back.
    #[error(transparent)]
    Rejected(MarketError),
}

impl From<MarketError> for DbError {
    fn from(err: MarketError) -> Self {
        Self::Rejected(err)
    }
}

impl From<TransferError> for DbError {
    fn from(err: TransferError) -> Self {
        Self::Rejected(err.into())
    }
}

impl From<LedgerError> for DbError {
    fn from(err: LedgerError) -> Self {
        Self::Rejected(err.into())
    }
}

impl From<DbError> for MarketError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Rejected(inner) => inner,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Whether a `sqlx` error is a foreign key violation.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_foreign_key_violation(),
        _ => false,
    }
}

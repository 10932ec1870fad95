//! Money rules and the balance ledger for the marketplace.
//!
//! Every balance change in the marketplace goes through the rules in this
//! crate. Stores (in-memory or `PostgreSQL`) read the current state inside
//! their transaction, ask this crate whether the movement is allowed and
//! what the resulting balances are, then write the outcome and the ledger
//! entry. The crate itself performs no I/O and never panics.
//!
//! # Modules
//!
//! - [`policy`] -- amount validation and the deposit cap.
//! - [`settlement`] -- job payment checks and resulting balances.
//! - [`transaction`] -- the [`TransactionBuilder`] for validated entries.
//! - [`ledger`] -- the [`Ledger`] struct: append-only in-memory log.
//! - [`conservation`] -- balance conservation checks.
//!
//! # Conservation Law
//!
//! A job payment moves money between two profiles:
//!
//! ```text
//! client_before + contractor_before == client_after + contractor_after
//! ```
//!
//! Across a whole book, money only enters through deposits:
//!
//! ```text
//! closing_total == opening_total + sum(deposits)
//! ```
//!
//! # Usage
//!
//! ```
//! use marketplace_ledger::policy::{validate_amount, DepositPolicy};
//! use rust_decimal::Decimal;
//!
//! let policy = DepositPolicy::default();
//! let amount = validate_amount(Some(Decimal::new(100, 0))).ok();
//! let unpaid_total = Decimal::new(400, 0);
//!
//! // 100 is exactly 25% of 400.
//! assert!(amount.is_some_and(|a| policy.check(a, unpaid_total).is_ok()));
//! ```

pub mod conservation;
pub mod ledger;
pub mod policy;
pub mod settlement;
pub mod transaction;

// Re-export primary types at crate root.
pub use conservation::ConservationResult;
pub use ledger::Ledger;
pub use policy::DepositPolicy;
pub use settlement::{BalanceSnapshot, JobPaymentParams, JobSettlement};
pub use transaction::TransactionBuilder;

use rust_decimal::Decimal;

use marketplace_types::{JobId, LedgerEntryType};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when building ledger entries.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Amount must be non-zero.
    #[error("ledger entry amount must be non-zero")]
    ZeroAmount,

    /// Amount must not be negative.
    #[error("ledger entry amount must be positive, got {amount}")]
    NegativeAmount {
        /// The invalid amount.
        amount: Decimal,
    },

    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The parties do not match what the entry type requires.
    #[error("invalid parties for {entry_type:?}: {detail}")]
    InvalidParties {
        /// The entry type being validated.
        entry_type: LedgerEntryType,
        /// What was wrong.
        detail: &'static str,
    },

    /// An internal invariant was violated.
    #[error("internal ledger error: {0}")]
    InternalError(&'static str),
}

/// A money movement the rules refuse.
///
/// The display strings are the messages returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// No amount was supplied.
    #[error("Amount not provided")]
    AmountMissing,

    /// The amount is zero or negative.
    #[error("Amount must be positive")]
    NonPositiveAmount {
        /// The rejected amount.
        amount: Decimal,
    },

    /// The amount is larger than any balance can hold.
    #[error("Amount must not exceed {max}", max = policy::MAX_MONEY)]
    AmountTooLarge {
        /// The rejected amount.
        amount: Decimal,
    },

    /// The amount has more decimal places than balances store.
    #[error("Amount must have at most 2 decimal places")]
    ExcessPrecision {
        /// The rejected amount.
        amount: Decimal,
    },

    /// The deposit is larger than the configured share of unpaid jobs.
    #[error("Cannot deposit more than {cap_percent}% of unpaid jobs amount")]
    LimitExceeded {
        /// The rejected amount.
        amount: Decimal,
        /// The largest amount that would have been accepted.
        cap: Decimal,
        /// The cap ratio expressed as a percentage.
        cap_percent: Decimal,
    },

    /// The job has been paid already.
    #[error("Job already paid")]
    AlreadyPaid {
        /// The job.
        job: JobId,
    },

    /// The client balance does not strictly exceed the job price.
    #[error("Insufficient funds")]
    InsufficientFunds {
        /// Price of the job.
        price: Decimal,
        /// Client balance at the time of the check.
        balance: Decimal,
    },

    /// Crediting the amount would push a balance past the money limit.
    #[error("Balance cannot exceed {max}", max = policy::MAX_MONEY)]
    BalanceLimitExceeded {
        /// Balance before the credit.
        balance: Decimal,
        /// The amount being credited.
        amount: Decimal,
    },

    /// Balance arithmetic left the representable range.
    #[error("balance arithmetic overflow")]
    Overflow,

    /// A computed settlement would create or destroy money.
    #[error("conservation violated: {0}")]
    ConservationViolated(String),
}

impl TransferError {
    /// Whether the error is a malformed-input problem rather than a
    /// refusal by the business rules.
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::AmountMissing
                | Self::NonPositiveAmount { .. }
                | Self::AmountTooLarge { .. }
                | Self::ExcessPrecision { .. }
        )
    }

    /// Whether the error is a business-rule refusal (already paid, cap,
    /// insufficient funds, balance limit).
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::LimitExceeded { .. }
                | Self::AlreadyPaid { .. }
                | Self::InsufficientFunds { .. }
                | Self::BalanceLimitExceeded { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A conservation law violation.
///
/// Produced when balances after a movement do not add up to the balances
/// before it (plus deposits, for whole-book checks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// Total before the movement (plus any deposits).
    pub expected_total: Decimal,
    /// Total observed afterwards.
    pub actual_total: Decimal,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}

//! Enumeration types for the marketplace.
//!
//! Each enum mirrors a `PostgreSQL` enum type created by the initial
//! migration. JSON uses the same `snake_case` labels as the database.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Profile kind
// ---------------------------------------------------------------------------

/// Which side of the marketplace a profile is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ProfileKind {
    /// Hires contractors and pays for jobs.
    Client,
    /// Performs jobs and receives payment.
    Contractor,
}

// ---------------------------------------------------------------------------
// Contract status
// ---------------------------------------------------------------------------

/// Lifecycle status of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ContractStatus {
    /// Agreed but no work started yet.
    New,
    /// Work is underway.
    InProgress,
    /// Closed. Terminated contracts are hidden from listings.
    Terminated,
}

impl ContractStatus {
    /// Whether the contract is still open (anything but terminated).
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Terminated)
    }
}

// ---------------------------------------------------------------------------
// Ledger entry type
// ---------------------------------------------------------------------------

/// The kind of money movement recorded in the balance ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum LedgerEntryType {
    /// External money credited to a profile. Has no source profile.
    Deposit,
    /// Client pays contractor for a job. Balance-neutral overall.
    JobPayment,
}

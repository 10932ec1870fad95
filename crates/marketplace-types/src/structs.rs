//! Core entity structs for the marketplace.
//!
//! Covers the three stored entities ([`Profile`], [`Contract`], [`Job`]),
//! their creation payloads, the balance [`LedgerEntry`], and the two
//! report rows produced by the aggregation queries.
//!
//! JSON field names follow the public API: `camelCase` for entity fields,
//! with the foreign keys spelled `ClientId`, `ContractorId`, and `ContractId`.
//! Money is carried as [`Decimal`] and serialized as a JSON number.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ContractStatus, LedgerEntryType, ProfileKind};
use crate::ids::{ContractId, JobId, LedgerEntryId, ProfileId};

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// A client or contractor account with a monetary balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Profile {
    /// Profile identifier.
    pub id: ProfileId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Trade or occupation, used to group contractor earnings.
    pub profession: String,
    /// Current balance. Never negative.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub balance: Decimal,
    /// Client or contractor.
    #[serde(rename = "type")]
    pub kind: ProfileKind,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// First and last name joined by a single space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Payload for creating a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Trade or occupation.
    pub profession: String,
    /// Opening balance.
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// Client or contractor.
    #[serde(rename = "type")]
    pub kind: ProfileKind,
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// An agreement between a client profile and a contractor profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Contract {
    /// Contract identifier.
    pub id: ContractId,
    /// Free-form terms of the agreement.
    pub terms: String,
    /// Lifecycle status.
    pub status: ContractStatus,
    /// The paying side.
    #[serde(rename = "ClientId")]
    pub client_id: ProfileId,
    /// The working side.
    #[serde(rename = "ContractorId")]
    pub contractor_id: ProfileId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    /// Whether the given profile is the client or the contractor.
    pub fn involves(&self, profile: ProfileId) -> bool {
        self.client_id == profile || self.contractor_id == profile
    }
}

/// Payload for creating a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContract {
    /// Free-form terms of the agreement.
    pub terms: String,
    /// Initial status.
    pub status: ContractStatus,
    /// The paying side.
    #[serde(rename = "ClientId")]
    pub client_id: ProfileId,
    /// The working side.
    #[serde(rename = "ContractorId")]
    pub contractor_id: ProfileId,
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A billable unit of work under a contract, paid at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Job {
    /// Job identifier.
    pub id: JobId,
    /// What the work is.
    pub description: String,
    /// Price fixed at creation. Always positive.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub price: Decimal,
    /// Whether the job has been paid. Unset in storage reads as `false`.
    pub paid: bool,
    /// When the job was paid, if it has been.
    pub payment_date: Option<DateTime<Utc>>,
    /// The contract the job belongs to.
    #[serde(rename = "ContractId")]
    pub contract_id: ContractId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a job.
///
/// `paid` and `payment_date` exist so historical (already settled) jobs
/// can be imported or seeded; new work normally starts unpaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    /// What the work is.
    pub description: String,
    /// Price of the job.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Paid flag; `None` means unset.
    #[serde(default)]
    pub paid: Option<bool>,
    /// Payment timestamp for already-paid jobs.
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    /// The contract the job belongs to.
    #[serde(rename = "ContractId")]
    pub contract_id: ContractId,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One money movement recorded by the transfer engine.
///
/// Deposits have no source profile. Job payments carry both parties and
/// the job that was settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct LedgerEntry {
    /// Entry identifier.
    pub id: LedgerEntryId,
    /// Deposit or job payment.
    pub entry_type: LedgerEntryType,
    /// Profile debited, absent for deposits.
    pub from_profile: Option<ProfileId>,
    /// Profile credited.
    pub to_profile: ProfileId,
    /// Amount moved. Always positive.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub amount: Decimal,
    /// The job settled, for job payments.
    pub job_id: Option<JobId>,
    /// The authenticated profile that initiated the movement.
    pub requested_by: ProfileId,
    /// When the movement was committed.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Whether the profile is the source or destination of this entry.
    pub fn touches(&self, profile: ProfileId) -> bool {
        self.to_profile == profile || self.from_profile == Some(profile)
    }
}

// ---------------------------------------------------------------------------
// Report rows
// ---------------------------------------------------------------------------

/// Total earned by one profession over a reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProfessionEarnings {
    /// The contractor profession.
    pub profession: String,
    /// Sum of paid job prices.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub total_earnings: Decimal,
}

/// Total paid by one client over a reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ClientSpending {
    /// The client profile.
    pub id: ProfileId,
    /// First and last name of the client.
    pub full_name: String,
    /// Sum of paid job prices.
    #[serde(with = "rust_decimal::serde::float")]
    #[ts(type = "number")]
    pub paid: Decimal,
}

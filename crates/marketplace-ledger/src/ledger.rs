//! The balance ledger: an append-only log of every balance change.
//!
//! The [`Ledger`] struct is the in-memory representation of the ledger. It
//! holds all [`LedgerEntry`] values and provides methods for recording
//! deposits and job payments and querying a profile's history.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified or deleted.
//! - **One entry per movement**: a deposit or a job payment, never both.
//! - **Precision**: all amounts use [`Decimal`] -- no floating point.

use rust_decimal::Decimal;

use marketplace_types::{LedgerEntry, LedgerEntryType, ProfileId};

use crate::conservation::{verify_book, ConservationResult};
use crate::settlement::JobSettlement;
use crate::{LedgerError, TransactionBuilder};

/// The ledger tracking all balance movements.
#[derive(Debug, Default, Clone)]
pub struct Ledger {
    /// All entries, in insertion order.
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Create a new empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Return the number of entries in the ledger.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the ledger has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a pre-built [`LedgerEntry`] to the ledger.
    ///
    /// For new entries, prefer [`record_deposit`] and
    /// [`record_job_payment`].
    ///
    /// [`record_deposit`]: Ledger::record_deposit
    /// [`record_job_payment`]: Ledger::record_job_payment
    pub fn append(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    /// Record a deposit of `amount` into `target`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record_deposit(
        &mut self,
        target: ProfileId,
        amount: Decimal,
        requested_by: ProfileId,
    ) -> Result<&LedgerEntry, LedgerError> {
        let entry = TransactionBuilder::deposit(target, amount, requested_by).build()?;
        self.push(entry)
    }

    /// Record an accepted job settlement.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record_job_payment(
        &mut self,
        settlement: &JobSettlement,
    ) -> Result<&LedgerEntry, LedgerError> {
        let entry = TransactionBuilder::job_payment(settlement).build()?;
        self.push(entry)
    }

    fn push(&mut self, entry: LedgerEntry) -> Result<&LedgerEntry, LedgerError> {
        self.entries.push(entry);
        self.entries.last().ok_or(LedgerError::InternalError(
            "failed to retrieve entry after append",
        ))
    }

    /// All entries, oldest first.
    pub fn all_entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Entries that credit or debit `profile`, oldest first.
    pub fn entries_for(&self, profile: ProfileId) -> Vec<LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| e.touches(profile))
            .cloned()
            .collect()
    }

    /// Net balance change the ledger records for `profile`.
    ///
    /// Returns `None` on arithmetic overflow.
    pub fn net_change(&self, profile: ProfileId) -> Option<Decimal> {
        self.entries.iter().try_fold(Decimal::ZERO, |acc, e| {
            let credited = e.to_profile == profile;
            let debited = e.from_profile == Some(profile);
            match (credited, debited) {
                (true, false) => acc.checked_add(e.amount),
                (false, true) => acc.checked_sub(e.amount),
                _ => Some(acc),
            }
        })
    }

    /// Sum of all deposits.
    ///
    /// Returns `None` on arithmetic overflow.
    pub fn total_deposits(&self) -> Option<Decimal> {
        self.entries
            .iter()
            .filter(|e| e.entry_type == LedgerEntryType::Deposit)
            .try_fold(Decimal::ZERO, |acc, e| acc.checked_add(e.amount))
    }

    /// Check that the book's closing total matches its opening total plus
    /// every deposit recorded here.
    pub fn verify(&self, opening_total: Decimal, closing_total: Decimal) -> ConservationResult {
        verify_book(opening_total, closing_total, &self.entries)
    }
}

//! Transaction builders and validation for the balance ledger.
//!
//! Provides a [`TransactionBuilder`] that enforces the shape of each entry
//! type: a deposit credits one profile from outside the marketplace, a job
//! payment debits the client and credits the contractor for a named job.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use marketplace_types::{JobId, LedgerEntry, LedgerEntryId, LedgerEntryType, ProfileId};

use crate::settlement::JobSettlement;
use crate::LedgerError;

// ---------------------------------------------------------------------------
// Transaction builder
// ---------------------------------------------------------------------------

/// Builder for constructing validated [`LedgerEntry`] values.
///
/// # Examples
///
/// ```
/// use marketplace_ledger::TransactionBuilder;
/// use marketplace_types::{LedgerEntryType, ProfileId};
/// use rust_decimal::Decimal;
///
/// let entry = TransactionBuilder::new(LedgerEntryType::Deposit)
///     .to(ProfileId(1))
///     .amount(Decimal::new(100, 0))
///     .requested_by(ProfileId(1))
///     .build();
///
/// assert!(entry.is_ok());
/// ```
#[derive(Debug)]
pub struct TransactionBuilder {
    entry_type: LedgerEntryType,
    from_profile: Option<ProfileId>,
    to_profile: Option<ProfileId>,
    amount: Option<Decimal>,
    job_id: Option<JobId>,
    requested_by: Option<ProfileId>,
    created_at: Option<DateTime<Utc>>,
}

impl TransactionBuilder {
    /// Start building a ledger entry of the given type.
    pub const fn new(entry_type: LedgerEntryType) -> Self {
        Self {
            entry_type,
            from_profile: None,
            to_profile: None,
            amount: None,
            job_id: None,
            requested_by: None,
            created_at: None,
        }
    }

    /// Builder pre-filled for a deposit into `target`.
    pub const fn deposit(target: ProfileId, amount: Decimal, requested_by: ProfileId) -> Self {
        Self::new(LedgerEntryType::Deposit)
            .to(target)
            .amount(amount)
            .requested_by(requested_by)
    }

    /// Builder pre-filled from an accepted job settlement.
    ///
    /// The client is both the debited party and the requester.
    pub const fn job_payment(settlement: &JobSettlement) -> Self {
        Self::new(LedgerEntryType::JobPayment)
            .from(settlement.client.profile)
            .to(settlement.contractor.profile)
            .amount(settlement.amount)
            .job(settlement.job)
            .requested_by(settlement.client.profile)
    }

    /// Set the debited profile.
    #[must_use]
    pub const fn from(mut self, profile: ProfileId) -> Self {
        self.from_profile = Some(profile);
        self
    }

    /// Set the credited profile.
    #[must_use]
    pub const fn to(mut self, profile: ProfileId) -> Self {
        self.to_profile = Some(profile);
        self
    }

    /// Set the amount moved.
    #[must_use]
    pub const fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the job being settled.
    #[must_use]
    pub const fn job(mut self, job: JobId) -> Self {
        self.job_id = Some(job);
        self
    }

    /// Set the profile that initiated the movement.
    #[must_use]
    pub const fn requested_by(mut self, profile: ProfileId) -> Self {
        self.requested_by = Some(profile);
        self
    }

    /// Pin the entry timestamp (defaults to now).
    #[must_use]
    pub const fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Validate inputs and produce a [`LedgerEntry`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MissingField`] if the amount, destination, or
    /// requester is not set, [`LedgerError::ZeroAmount`] or
    /// [`LedgerError::NegativeAmount`] for a non-positive amount, and
    /// [`LedgerError::InvalidParties`] if the parties do not fit the entry
    /// type.
    pub fn build(self) -> Result<LedgerEntry, LedgerError> {
        let amount = self.amount.ok_or(LedgerError::MissingField("amount"))?;
        let to_profile = self.to_profile.ok_or(LedgerError::MissingField("to_profile"))?;
        let requested_by = self
            .requested_by
            .ok_or(LedgerError::MissingField("requested_by"))?;

        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        if amount.is_sign_negative() {
            return Err(LedgerError::NegativeAmount { amount });
        }

        validate_parties(self.entry_type, self.from_profile, self.job_id)?;

        Ok(LedgerEntry {
            id: LedgerEntryId::new(),
            entry_type: self.entry_type,
            from_profile: self.from_profile,
            to_profile,
            amount,
            job_id: self.job_id,
            requested_by,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Validate that the optional fields match the contract for the entry type.
const fn validate_parties(
    entry_type: LedgerEntryType,
    from_profile: Option<ProfileId>,
    job_id: Option<JobId>,
) -> Result<(), LedgerError> {
    match entry_type {
        LedgerEntryType::Deposit => {
            if from_profile.is_some() {
                return Err(LedgerError::InvalidParties {
                    entry_type,
                    detail: "a deposit has no source profile",
                });
            }
            if job_id.is_some() {
                return Err(LedgerError::InvalidParties {
                    entry_type,
                    detail: "a deposit does not settle a job",
                });
            }
        }
        LedgerEntryType::JobPayment => {
            if from_profile.is_none() {
                return Err(LedgerError::InvalidParties {
                    entry_type,
                    detail: "a job payment needs the paying client",
                });
            }
            if job_id.is_none() {
                return Err(LedgerError::InvalidParties {
                    entry_type,
                    detail: "a job payment needs the job",
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::settlement::BalanceSnapshot;

    #[test]
    fn deposit_builder_produces_valid_entry() {
        let entry = TransactionBuilder::deposit(ProfileId(2), dec!(100), ProfileId(1)).build();
        let entry = entry.ok();
        assert_eq!(entry.as_ref().map(|e| e.to_profile), Some(ProfileId(2)));
        assert_eq!(entry.as_ref().map(|e| e.requested_by), Some(ProfileId(1)));
        assert_eq!(entry.and_then(|e| e.from_profile), None);
    }

    #[test]
    fn job_payment_builder_uses_settlement_parties() {
        let settlement = JobSettlement {
            job: JobId(7),
            amount: dec!(50),
            client: BalanceSnapshot::new(ProfileId(1), dec!(50)),
            contractor: BalanceSnapshot::new(ProfileId(2), dec!(50)),
        };
        let entry = TransactionBuilder::job_payment(&settlement).build().ok();
        assert_eq!(entry.as_ref().and_then(|e| e.from_profile), Some(ProfileId(1)));
        assert_eq!(entry.as_ref().map(|e| e.to_profile), Some(ProfileId(2)));
        assert_eq!(entry.and_then(|e| e.job_id), Some(JobId(7)));
    }

    #[test]
    fn zero_amount_rejected() {
        let result = TransactionBuilder::deposit(ProfileId(1), Decimal::ZERO, ProfileId(1)).build();
        assert!(matches!(result, Err(LedgerError::ZeroAmount)));
    }

    #[test]
    fn negative_amount_rejected() {
        let result = TransactionBuilder::deposit(ProfileId(1), dec!(-1), ProfileId(1)).build();
        assert!(matches!(result, Err(LedgerError::NegativeAmount { .. })));
    }

    #[test]
    fn missing_destination_rejected() {
        let result = TransactionBuilder::new(LedgerEntryType::Deposit)
            .amount(dec!(1))
            .requested_by(ProfileId(1))
            .build();
        assert!(matches!(result, Err(LedgerError::MissingField("to_profile"))));
    }

    #[test]
    fn deposit_with_source_rejected() {
        let result = TransactionBuilder::deposit(ProfileId(1), dec!(1), ProfileId(1))
            .from(ProfileId(3))
            .build();
        assert!(matches!(result, Err(LedgerError::InvalidParties { .. })));
    }

    #[test]
    fn job_payment_without_job_rejected() {
        let result = TransactionBuilder::new(LedgerEntryType::JobPayment)
            .from(ProfileId(1))
            .to(ProfileId(2))
            .amount(dec!(1))
            .requested_by(ProfileId(1))
            .build();
        assert!(matches!(result, Err(LedgerError::InvalidParties { .. })));
    }
}

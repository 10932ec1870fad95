//! Job payment settlement.
//!
//! Given the locked state of a job and both contract parties, decide whether
//! the client may pay for the job and compute the balances afterwards. The
//! caller writes the resulting balances back inside the same transaction it
//! read them in.

use rust_decimal::Decimal;

use marketplace_types::{JobId, ProfileId};

use crate::conservation::{verify_transfer, ConservationResult};
use crate::policy::credit;
use crate::TransferError;

/// A profile's balance at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    /// The profile.
    pub profile: ProfileId,
    /// Its balance.
    pub balance: Decimal,
}

impl BalanceSnapshot {
    /// Create a snapshot.
    pub const fn new(profile: ProfileId, balance: Decimal) -> Self {
        Self { profile, balance }
    }
}

/// Inputs to a job payment, read under lock by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPaymentParams {
    /// The job being paid.
    pub job: JobId,
    /// Its fixed price.
    pub price: Decimal,
    /// Whether the job is already marked paid.
    pub already_paid: bool,
    /// The paying client and their current balance.
    pub client: BalanceSnapshot,
    /// The contractor and their current balance.
    pub contractor: BalanceSnapshot,
}

/// The outcome of an accepted job payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSettlement {
    /// The job being paid.
    pub job: JobId,
    /// Amount moved from client to contractor.
    pub amount: Decimal,
    /// Client balance after payment.
    pub client: BalanceSnapshot,
    /// Contractor balance after payment.
    pub contractor: BalanceSnapshot,
}

/// Check a job payment and compute the resulting balances.
///
/// Refuses with [`TransferError::AlreadyPaid`] when the job is paid and
/// with [`TransferError::InsufficientFunds`] unless the client balance is
/// strictly greater than the price. A contractor balance that would pass
/// [`MAX_MONEY`](crate::policy::MAX_MONEY) is refused with
/// [`TransferError::BalanceLimitExceeded`]. A contract where client and contractor
/// are the same profile settles with the balance unchanged.
pub fn settle_job(params: JobPaymentParams) -> Result<JobSettlement, TransferError> {
    let JobPaymentParams {
        job,
        price,
        already_paid,
        client,
        contractor,
    } = params;

    if already_paid {
        return Err(TransferError::AlreadyPaid { job });
    }
    if price.is_zero() || price.is_sign_negative() {
        return Err(TransferError::NonPositiveAmount { amount: price });
    }
    if price >= client.balance {
        return Err(TransferError::InsufficientFunds {
            price,
            balance: client.balance,
        });
    }

    let settlement = if client.profile == contractor.profile {
        JobSettlement {
            job,
            amount: price,
            client,
            contractor,
        }
    } else {
        let client_after = client
            .balance
            .checked_sub(price)
            .ok_or(TransferError::Overflow)?;
        let contractor_after = credit(contractor.balance, price)?;
        JobSettlement {
            job,
            amount: price,
            client: BalanceSnapshot::new(client.profile, client_after),
            contractor: BalanceSnapshot::new(contractor.profile, contractor_after),
        }
    };

    let before = distinct_parties(client, contractor);
    let after = distinct_parties(settlement.client, settlement.contractor);
    if let ConservationResult::Anomaly(anomaly) = verify_transfer(&before, &after) {
        tracing::error!(job = %job, %anomaly, "job settlement failed conservation check");
        return Err(TransferError::ConservationViolated(anomaly.message));
    }

    Ok(settlement)
}

/// The parties of a payment, counting a self-contract once.
fn distinct_parties(client: BalanceSnapshot, contractor: BalanceSnapshot) -> Vec<BalanceSnapshot> {
    if client.profile == contractor.profile {
        vec![client]
    } else {
        vec![client, contractor]
    }
}

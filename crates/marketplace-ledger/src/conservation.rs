//! Conservation law verification.
//!
//! Money moves between profiles but is never created or destroyed inside
//! the marketplace. The only inflow is a deposit. Two checks are provided:
//!
//! - [`verify_transfer`]: the sum of the involved balances is unchanged by
//!   a transfer between them.
//! - [`verify_book`]: a whole book's closing total equals its opening total
//!   plus the deposits recorded in the ledger.
//!
//! Both hold by construction for well-formed settlements; they guard
//! against arithmetic or persistence bugs.

use rust_decimal::Decimal;

use marketplace_types::{LedgerEntry, LedgerEntryType};

use crate::settlement::BalanceSnapshot;
use crate::LedgerAnomaly;

/// The result of a conservation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// Totals match.
    Balanced,
    /// Totals differ.
    Anomaly(LedgerAnomaly),
}

/// Sum a set of balances, returning `None` on overflow.
fn checked_total<'a>(balances: impl IntoIterator<Item = &'a Decimal>) -> Option<Decimal> {
    balances
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, b| acc.checked_add(*b))
}

fn overflow_anomaly(what: &str) -> ConservationResult {
    ConservationResult::Anomaly(LedgerAnomaly {
        expected_total: Decimal::ZERO,
        actual_total: Decimal::ZERO,
        message: format!("LEDGER_ANOMALY: arithmetic overflow while summing {what}"),
    })
}

/// Verify that a transfer left the total of the involved balances unchanged.
pub fn verify_transfer(before: &[BalanceSnapshot], after: &[BalanceSnapshot]) -> ConservationResult {
    let Some(expected_total) = checked_total(before.iter().map(|s| &s.balance)) else {
        return overflow_anomaly("opening balances");
    };
    let Some(actual_total) = checked_total(after.iter().map(|s| &s.balance)) else {
        return overflow_anomaly("closing balances");
    };

    if expected_total == actual_total {
        ConservationResult::Balanced
    } else {
        ConservationResult::Anomaly(LedgerAnomaly {
            expected_total,
            actual_total,
            message: format!(
                "LEDGER_ANOMALY: transfer changed total balance from {expected_total} to {actual_total}"
            ),
        })
    }
}

/// Verify a whole book: `closing == opening + sum(deposits)`.
///
/// Job payments are internal movements and do not change the total.
pub fn verify_book(
    opening_total: Decimal,
    closing_total: Decimal,
    entries: &[LedgerEntry],
) -> ConservationResult {
    let deposits = entries
        .iter()
        .filter(|e| e.entry_type == LedgerEntryType::Deposit)
        .map(|e| &e.amount);
    let Some(deposited) = checked_total(deposits) else {
        return overflow_anomaly("deposits");
    };
    let Some(expected_total) = opening_total.checked_add(deposited) else {
        return overflow_anomaly("opening total and deposits");
    };

    if expected_total == closing_total {
        ConservationResult::Balanced
    } else {
        ConservationResult::Anomaly(LedgerAnomaly {
            expected_total,
            actual_total: closing_total,
            message: format!(
                "LEDGER_ANOMALY: book total is {closing_total}, expected {expected_total} \
                 ({opening_total} opening + {deposited} deposited)"
            ),
        })
    }
}

//! Amount validation and the deposit cap.
//!
//! A deposit is capped relative to the depositor's outstanding work: while
//! the requesting profile has unpaid jobs as a client, a single deposit may
//! not exceed `cap_ratio * unpaid_total`. With nothing outstanding there is
//! no cap.

use rust_decimal::Decimal;

use crate::TransferError;

/// Number of decimal places balances are stored with.
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a balance, price, or deposit may hold.
///
/// Matches the `NUMERIC(12, 2)` money columns: 9 999 999 999.99.
pub const MAX_MONEY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, MONEY_SCALE);

/// Default share of the unpaid total a single deposit may reach (25%).
pub const DEFAULT_CAP_RATIO: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

/// Validate a caller-supplied amount.
///
/// Returns the amount when present, strictly positive, no larger than
/// [`MAX_MONEY`], and representable at [`MONEY_SCALE`] decimal places.
pub fn validate_amount(amount: Option<Decimal>) -> Result<Decimal, TransferError> {
    let amount = amount.ok_or(TransferError::AmountMissing)?;

    if amount.is_zero() || amount.is_sign_negative() {
        return Err(TransferError::NonPositiveAmount { amount });
    }
    if amount > MAX_MONEY {
        return Err(TransferError::AmountTooLarge { amount });
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(TransferError::ExcessPrecision { amount });
    }

    Ok(amount)
}

/// Add `amount` to `balance`, refusing results above [`MAX_MONEY`].
pub fn credit(balance: Decimal, amount: Decimal) -> Result<Decimal, TransferError> {
    let after = balance.checked_add(amount).ok_or(TransferError::Overflow)?;
    if after > MAX_MONEY {
        return Err(TransferError::BalanceLimitExceeded { balance, amount });
    }
    Ok(after)
}

/// The deposit cap rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositPolicy {
    cap_ratio: Decimal,
}

impl DepositPolicy {
    /// Create a policy with the given cap ratio.
    ///
    /// Returns `None` unless `0 < cap_ratio <= 1`.
    pub fn new(cap_ratio: Decimal) -> Option<Self> {
        if cap_ratio.is_sign_positive() && !cap_ratio.is_zero() && cap_ratio <= Decimal::ONE {
            Some(Self { cap_ratio })
        } else {
            None
        }
    }

    /// The configured cap ratio.
    pub const fn cap_ratio(&self) -> Decimal {
        self.cap_ratio
    }

    /// The largest deposit allowed for the given unpaid total.
    ///
    /// `None` means uncapped (nothing outstanding).
    pub fn cap_for(&self, unpaid_total: Decimal) -> Result<Option<Decimal>, TransferError> {
        if unpaid_total <= Decimal::ZERO {
            return Ok(None);
        }
        self.cap_ratio
            .checked_mul(unpaid_total)
            .map(Some)
            .ok_or(TransferError::Overflow)
    }

    /// Check a validated amount against the cap.
    pub fn check(&self, amount: Decimal, unpaid_total: Decimal) -> Result<(), TransferError> {
        let Some(cap) = self.cap_for(unpaid_total)? else {
            return Ok(());
        };

        if amount > cap {
            let cap_percent = self
                .cap_ratio
                .checked_mul(Decimal::ONE_HUNDRED)
                .ok_or(TransferError::Overflow)?
                .normalize();
            tracing::debug!(%amount, %cap, %unpaid_total, "deposit over cap");
            return Err(TransferError::LimitExceeded {
                amount,
                cap,
                cap_percent,
            });
        }

        Ok(())
    }
}

impl Default for DepositPolicy {
    fn default() -> Self {
        Self {
            cap_ratio: DEFAULT_CAP_RATIO,
        }
    }
}

//! The store abstraction every backend implements.
//!
//! The HTTP layer only ever talks to a [`Marketplace`]. Each backend owns
//! its own atomicity: a deposit or job payment either commits the balance
//! change, the job update, and the ledger entry together, or none of them.

use std::future::Future;

use rust_decimal::Decimal;

use marketplace_ledger::DepositPolicy;
use marketplace_ledger::policy::{MAX_MONEY, MONEY_SCALE};
use marketplace_types::{
    ClientSpending, Contract, ContractId, Job, JobId, LedgerEntry, NewContract, NewJob, NewProfile,
    ProfessionEarnings, Profile, ProfileId,
};

use crate::access::ActiveContractFilter;
use crate::error::MarketError;
use crate::report::ReportRange;

/// Message returned when a deposit names an unknown profile.
pub const DEPOSIT_TARGET_NOT_FOUND: &str = "Client not found";

/// Message returned when a job is unknown or not payable by the caller.
pub const JOB_NOT_FOUND: &str = "Job not found";

/// Message returned when a contract is unknown or not visible.
pub const CONTRACT_NOT_FOUND: &str = "Contract not found";

/// Rules a store applies to money movements and listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarketPolicy {
    /// Deposit cap relative to unpaid work.
    pub deposit: DepositPolicy,
    /// Which contracts count as active for unpaid job listings.
    pub unpaid_jobs_filter: ActiveContractFilter,
}

/// A request to credit a profile's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositRequest {
    /// Profile whose balance is credited.
    pub target: ProfileId,
    /// Authenticated caller; their unpaid jobs determine the cap.
    pub requester: ProfileId,
    /// Amount as supplied by the caller, if any.
    pub amount: Option<Decimal>,
}

/// A marketplace store.
///
/// Implemented by the in-memory store in this crate and by the
/// `PostgreSQL` store in `marketplace-db`.
pub trait Marketplace: Send + Sync + 'static {
    /// Look a profile up by id.
    fn find_profile(
        &self,
        id: ProfileId,
    ) -> impl Future<Output = Result<Option<Profile>, MarketError>> + Send;

    /// Insert a profile.
    fn create_profile(
        &self,
        profile: NewProfile,
    ) -> impl Future<Output = Result<Profile, MarketError>> + Send;

    /// Insert a contract between two existing profiles.
    fn create_contract(
        &self,
        contract: NewContract,
    ) -> impl Future<Output = Result<Contract, MarketError>> + Send;

    /// Insert a job under an existing contract.
    fn create_job(&self, job: NewJob) -> impl Future<Output = Result<Job, MarketError>> + Send;

    /// Whether the store holds no profiles.
    fn is_empty(&self) -> impl Future<Output = Result<bool, MarketError>> + Send;

    /// Credit `request.target` with `request.amount`, capped by the
    /// requester's unpaid work. Returns the updated target profile.
    fn deposit(
        &self,
        request: DepositRequest,
    ) -> impl Future<Output = Result<Profile, MarketError>> + Send;

    /// Pay a job from its client's balance to its contractor's. Returns the
    /// updated job.
    fn pay_job(
        &self,
        job: JobId,
        payer: ProfileId,
    ) -> impl Future<Output = Result<Job, MarketError>> + Send;

    /// A contract the caller is party to.
    fn contract_for(
        &self,
        id: ContractId,
        caller: ProfileId,
    ) -> impl Future<Output = Result<Contract, MarketError>> + Send;

    /// Non-terminated contracts the caller is party to, by id.
    fn active_contracts(
        &self,
        caller: ProfileId,
    ) -> impl Future<Output = Result<Vec<Contract>, MarketError>> + Send;

    /// Unpaid jobs on the caller's active contracts, by id.
    fn unpaid_jobs(
        &self,
        caller: ProfileId,
    ) -> impl Future<Output = Result<Vec<Job>, MarketError>> + Send;

    /// Contractor professions ranked by paid earnings in the window.
    fn best_profession(
        &self,
        range: ReportRange,
    ) -> impl Future<Output = Result<Vec<ProfessionEarnings>, MarketError>> + Send;

    /// The top `limit` clients ranked by paid jobs in the window.
    fn best_clients(
        &self,
        range: ReportRange,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ClientSpending>, MarketError>> + Send;

    /// Ledger entries crediting or debiting the caller, oldest first.
    fn ledger_entries(
        &self,
        caller: ProfileId,
    ) -> impl Future<Output = Result<Vec<LedgerEntry>, MarketError>> + Send;
}

// ---------------------------------------------------------------------------
// Payload validation shared by stores
// ---------------------------------------------------------------------------

fn check_money(amount: Decimal, what: &str) -> Result<(), MarketError> {
    if amount > MAX_MONEY {
        return Err(MarketError::validation(format!(
            "{what} must not exceed {MAX_MONEY}"
        )));
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(MarketError::validation(format!(
            "{what} must have at most {MONEY_SCALE} decimal places"
        )));
    }
    Ok(())
}

/// Validate a new profile: non-negative balance at cent precision, within
/// [`MAX_MONEY`].
pub fn check_new_profile(profile: &NewProfile) -> Result<(), MarketError> {
    if profile.balance.is_sign_negative() && !profile.balance.is_zero() {
        return Err(MarketError::validation("Balance must not be negative"));
    }
    check_money(profile.balance, "Balance")
}

/// Validate a new job: positive price at cent precision within
/// [`MAX_MONEY`], and a payment
/// date only when paid.
pub fn check_new_job(job: &NewJob) -> Result<(), MarketError> {
    if job.price.is_zero() || job.price.is_sign_negative() {
        return Err(MarketError::validation("Price must be positive"));
    }
    check_money(job.price, "Price")?;
    if job.payment_date.is_some() && job.paid != Some(true) {
        return Err(MarketError::validation(
            "Payment date is only allowed on paid jobs",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use marketplace_types::{ContractId, ProfileKind};
    use rust_decimal_macros::dec;

    use super::*;

    fn new_profile(balance: Decimal) -> NewProfile {
        NewProfile {
            first_name: "Harry".to_owned(),
            last_name: "Potter".to_owned(),
            profession: "Wizard".to_owned(),
            balance,
            kind: ProfileKind::Client,
        }
    }

    fn new_job(price: Decimal) -> NewJob {
        NewJob {
            description: "work".to_owned(),
            price,
            paid: None,
            payment_date: None,
            contract_id: ContractId(1),
        }
    }

    #[test]
    fn profile_balance_rules() {
        assert!(check_new_profile(&new_profile(dec!(0))).is_ok());
        assert!(check_new_profile(&new_profile(dec!(1150.50))).is_ok());
        assert!(check_new_profile(&new_profile(dec!(-1))).is_err());
        assert!(check_new_profile(&new_profile(dec!(1.001))).is_err());
        assert!(check_new_profile(&new_profile(dec!(9999999999.99))).is_ok());
        assert!(matches!(
            check_new_profile(&new_profile(dec!(10000000000))),
            Err(MarketError::Validation(ref m)) if m == "Balance must not exceed 9999999999.99"
        ));
    }

    #[test]
    fn job_price_rules() {
        assert!(check_new_job(&new_job(dec!(200))).is_ok());
        assert!(check_new_job(&new_job(dec!(0))).is_err());
        assert!(check_new_job(&new_job(dec!(-5))).is_err());
        assert!(check_new_job(&new_job(dec!(0.005))).is_err());
        assert!(matches!(
            check_new_job(&new_job(dec!(100000000000000))),
            Err(MarketError::Validation(ref m)) if m == "Price must not exceed 9999999999.99"
        ));
    }

    #[test]
    fn payment_date_requires_paid_flag() {
        let mut job = new_job(dec!(10));
        job.payment_date = Some(chrono::Utc::now());
        assert!(check_new_job(&job).is_err());
        job.paid = Some(true);
        assert!(check_new_job(&job).is_ok());
    }

    #[test]
    fn default_policy_uses_quarter_cap_and_not_terminated() {
        let policy = MarketPolicy::default();
        assert_eq!(policy.deposit.cap_ratio(), dec!(0.25));
        assert_eq!(policy.unpaid_jobs_filter, ActiveContractFilter::NotTerminated);
    }
}

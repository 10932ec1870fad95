//! In-memory [`Marketplace`] backed by ordered maps.
//!
//! Used by the HTTP tests and by `storage.backend: memory` for local demos.
//! Every mutation takes the single write lock for its whole duration, so
//! the check and the act of a deposit or payment can never interleave with
//! another mutation.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use marketplace_ledger::policy::{credit, validate_amount};
use marketplace_ledger::settlement::settle_job;
use marketplace_ledger::{BalanceSnapshot, JobPaymentParams, Ledger, TransferError};
use marketplace_types::{
    ClientSpending, Contract, ContractId, Job, JobId, LedgerEntry, NewContract, NewJob, NewProfile,
    ProfessionEarnings, Profile, ProfileId,
};

use crate::access::{is_listed_contract, is_listed_unpaid_job, visible_contract};
use crate::error::MarketError;
use crate::market::{
    check_new_job, check_new_profile, DepositRequest, MarketPolicy, Marketplace,
    CONTRACT_NOT_FOUND, DEPOSIT_TARGET_NOT_FOUND, JOB_NOT_FOUND,
};
use crate::report::{rank_clients, rank_professions, ReportRange};

/// Everything the store holds, guarded by one lock.
#[derive(Debug, Default)]
struct Book {
    profiles: BTreeMap<ProfileId, Profile>,
    contracts: BTreeMap<ContractId, Contract>,
    jobs: BTreeMap<JobId, Job>,
    ledger: Ledger,
    last_profile: i64,
    last_contract: i64,
    last_job: i64,
}

fn next_id(last: &mut i64) -> Result<i64, MarketError> {
    *last = last
        .checked_add(1)
        .ok_or_else(|| MarketError::internal("id sequence exhausted"))?;
    Ok(*last)
}

impl Book {
    /// Sum of unpaid job prices on contracts where `client` pays.
    fn unpaid_total_for_client(&self, client: ProfileId) -> Result<Decimal, MarketError> {
        self.jobs
            .values()
            .filter(|job| !job.paid)
            .filter(|job| {
                self.contracts
                    .get(&job.contract_id)
                    .is_some_and(|c| c.client_id == client)
            })
            .try_fold(Decimal::ZERO, |acc, job| acc.checked_add(job.price))
            .ok_or_else(|| TransferError::Overflow.into())
    }

    fn profile(&self, id: ProfileId) -> Result<&Profile, MarketError> {
        self.profiles
            .get(&id)
            .ok_or_else(|| MarketError::internal(format!("contract party {id} is missing")))
    }

    /// Paid jobs in the window joined with their contract.
    fn paid_in_range(&self, range: ReportRange) -> impl Iterator<Item = (&Job, &Contract)> {
        self.jobs
            .values()
            .filter(move |job| job.paid && job.payment_date.is_some_and(|at| range.contains(at)))
            .filter_map(move |job| self.contracts.get(&job.contract_id).map(|c| (job, c)))
    }
}

/// A [`Marketplace`] held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryMarketplace {
    book: RwLock<Book>,
    policy: MarketPolicy,
}

impl MemoryMarketplace {
    /// Create an empty store with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given policy.
    pub fn with_policy(policy: MarketPolicy) -> Self {
        Self {
            book: RwLock::new(Book::default()),
            policy,
        }
    }

    /// The rules this store applies.
    pub const fn policy(&self) -> MarketPolicy {
        self.policy
    }

    /// Sum of all balances. Used to check conservation.
    pub async fn total_balance(&self) -> Result<Decimal, MarketError> {
        let book = self.book.read().await;
        book.profiles
            .values()
            .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.balance))
            .ok_or_else(|| TransferError::Overflow.into())
    }
}

impl Marketplace for MemoryMarketplace {
    async fn find_profile(&self, id: ProfileId) -> Result<Option<Profile>, MarketError> {
        Ok(self.book.read().await.profiles.get(&id).cloned())
    }

    async fn create_profile(&self, profile: NewProfile) -> Result<Profile, MarketError> {
        check_new_profile(&profile)?;
        let mut book = self.book.write().await;
        let id = ProfileId(next_id(&mut book.last_profile)?);
        let now = Utc::now();
        let profile = Profile {
            id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            profession: profile.profession,
            balance: profile.balance,
            kind: profile.kind,
            created_at: now,
            updated_at: now,
        };
        book.profiles.insert(id, profile.clone());
        Ok(profile)
    }

    async fn create_contract(&self, contract: NewContract) -> Result<Contract, MarketError> {
        let mut book = self.book.write().await;
        for party in [contract.client_id, contract.contractor_id] {
            if !book.profiles.contains_key(&party) {
                return Err(MarketError::not_found(format!("Profile {party} not found")));
            }
        }
        let id = ContractId(next_id(&mut book.last_contract)?);
        let now = Utc::now();
        let contract = Contract {
            id,
            terms: contract.terms,
            status: contract.status,
            client_id: contract.client_id,
            contractor_id: contract.contractor_id,
            created_at: now,
            updated_at: now,
        };
        book.contracts.insert(id, contract.clone());
        Ok(contract)
    }

    async fn create_job(&self, job: NewJob) -> Result<Job, MarketError> {
        check_new_job(&job)?;
        let mut book = self.book.write().await;
        if !book.contracts.contains_key(&job.contract_id) {
            return Err(MarketError::not_found(CONTRACT_NOT_FOUND));
        }
        let id = JobId(next_id(&mut book.last_job)?);
        let now = Utc::now();
        let job = Job {
            id,
            description: job.description,
            price: job.price,
            paid: job.paid.unwrap_or(false),
            payment_date: job.payment_date,
            contract_id: job.contract_id,
            created_at: now,
            updated_at: now,
        };
        book.jobs.insert(id, job.clone());
        Ok(job)
    }

    async fn is_empty(&self) -> Result<bool, MarketError> {
        Ok(self.book.read().await.profiles.is_empty())
    }

    async fn deposit(&self, request: DepositRequest) -> Result<Profile, MarketError> {
        let amount = validate_amount(request.amount)?;

        let mut guard = self.book.write().await;
        let book = &mut *guard;

        let balance = book
            .profiles
            .get(&request.target)
            .map(|p| p.balance)
            .ok_or_else(|| MarketError::not_found(DEPOSIT_TARGET_NOT_FOUND))?;

        let unpaid_total = book.unpaid_total_for_client(request.requester)?;
        self.policy.deposit.check(amount, unpaid_total)?;

        let new_balance = credit(balance, amount)?;
        book.ledger
            .record_deposit(request.target, amount, request.requester)?;

        let profile = book
            .profiles
            .get_mut(&request.target)
            .ok_or_else(|| MarketError::not_found(DEPOSIT_TARGET_NOT_FOUND))?;
        profile.balance = new_balance;
        profile.updated_at = Utc::now();

        tracing::info!(
            target_profile = %request.target,
            requester = %request.requester,
            %amount,
            %unpaid_total,
            "deposit committed"
        );
        Ok(profile.clone())
    }

    async fn pay_job(&self, job_id: JobId, payer: ProfileId) -> Result<Job, MarketError> {
        let mut guard = self.book.write().await;
        let book = &mut *guard;

        let (price, paid, contract_id) = book
            .jobs
            .get(&job_id)
            .map(|j| (j.price, j.paid, j.contract_id))
            .ok_or_else(|| MarketError::not_found(JOB_NOT_FOUND))?;
        let contract = book
            .contracts
            .get(&contract_id)
            .filter(|c| c.client_id == payer)
            .ok_or_else(|| MarketError::not_found(JOB_NOT_FOUND))?;
        let (client_id, contractor_id) = (contract.client_id, contract.contractor_id);

        let client = book.profile(client_id)?;
        let contractor = book.profile(contractor_id)?;
        let settlement = settle_job(JobPaymentParams {
            job: job_id,
            price,
            already_paid: paid,
            client: BalanceSnapshot::new(client.id, client.balance),
            contractor: BalanceSnapshot::new(contractor.id, contractor.balance),
        })?;

        book.ledger.record_job_payment(&settlement)?;

        let now = Utc::now();
        for snapshot in [settlement.client, settlement.contractor] {
            if let Some(profile) = book.profiles.get_mut(&snapshot.profile) {
                profile.balance = snapshot.balance;
                profile.updated_at = now;
            }
        }
        let job = book
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| MarketError::not_found(JOB_NOT_FOUND))?;
        job.paid = true;
        job.payment_date = Some(now);
        job.updated_at = now;

        tracing::info!(
            job = %job_id,
            client = %client_id,
            contractor = %contractor_id,
            %price,
            "job payment committed"
        );
        Ok(job.clone())
    }

    async fn contract_for(&self, id: ContractId, caller: ProfileId) -> Result<Contract, MarketError> {
        let book = self.book.read().await;
        book.contracts
            .get(&id)
            .and_then(|c| visible_contract(c, caller))
            .cloned()
            .ok_or_else(|| MarketError::not_found(CONTRACT_NOT_FOUND))
    }

    async fn active_contracts(&self, caller: ProfileId) -> Result<Vec<Contract>, MarketError> {
        let book = self.book.read().await;
        Ok(book
            .contracts
            .values()
            .filter(|c| is_listed_contract(c, caller))
            .cloned()
            .collect())
    }

    async fn unpaid_jobs(&self, caller: ProfileId) -> Result<Vec<Job>, MarketError> {
        let book = self.book.read().await;
        let filter = self.policy.unpaid_jobs_filter;
        Ok(book
            .jobs
            .values()
            .filter(|job| {
                book.contracts
                    .get(&job.contract_id)
                    .is_some_and(|c| is_listed_unpaid_job(job, c, caller, filter))
            })
            .cloned()
            .collect())
    }

    async fn best_profession(
        &self,
        range: ReportRange,
    ) -> Result<Vec<ProfessionEarnings>, MarketError> {
        let book = self.book.read().await;
        let mut rows = Vec::new();
        for (job, contract) in book.paid_in_range(range) {
            let contractor = book.profile(contract.contractor_id)?;
            rows.push((contractor.profession.clone(), job.price));
        }
        rank_professions(rows)
    }

    async fn best_clients(
        &self,
        range: ReportRange,
        limit: u32,
    ) -> Result<Vec<ClientSpending>, MarketError> {
        let book = self.book.read().await;
        let mut rows = Vec::new();
        for (job, contract) in book.paid_in_range(range) {
            let client = book.profile(contract.client_id)?;
            rows.push((client.id, client.full_name(), job.price));
        }
        rank_clients(rows, limit)
    }

    async fn ledger_entries(&self, caller: ProfileId) -> Result<Vec<LedgerEntry>, MarketError> {
        Ok(self.book.read().await.ledger.entries_for(caller))
    }
}

//! The `PostgreSQL` [`Marketplace`].
//!
//! Reads go straight to the per-table stores. The two money movements run
//! in a READ COMMITTED transaction with explicit row locks:
//!
//! ```text
//! deposit:  lock {target, requester} profiles (ascending id)
//!           -> sum requester's unpaid jobs -> cap check
//!           -> update target balance -> ledger entry -> commit
//!
//! pay_job:  lock job row (joined on payer as client)
//!           -> lock {client, contractor} profiles (ascending id)
//!           -> settle -> update balances -> mark job paid
//!           -> ledger entry -> commit
//! ```
//!
//! Any error drops the transaction, which rolls it back.

use sqlx::PgPool;

use marketplace_core::market::{
    check_new_job, check_new_profile, DEPOSIT_TARGET_NOT_FOUND, JOB_NOT_FOUND,
    CONTRACT_NOT_FOUND,
};
use marketplace_core::report::ReportRange;
use marketplace_core::{DepositRequest, MarketError, MarketPolicy, Marketplace};
use marketplace_ledger::policy::{credit, validate_amount};
use marketplace_ledger::settlement::settle_job;
use marketplace_ledger::{BalanceSnapshot, JobPaymentParams, TransactionBuilder};
use marketplace_types::{
    ClientSpending, Contract, ContractId, Job, JobId, LedgerEntry, NewContract, NewJob, NewProfile,
    ProfessionEarnings, Profile, ProfileId,
};

use crate::contract_store::ContractStore;
use crate::error::DbError;
use crate::job_store::{self, JobStore};
use crate::ledger_store::{self, LedgerStore};
use crate::postgres::PostgresPool;
use crate::profile_store::{self, ProfileStore};
use crate::report_store::ReportStore;

/// A [`Marketplace`] persisted in `PostgreSQL`.
#[derive(Clone)]
pub struct PgMarketplace {
    pool: PgPool,
    policy: MarketPolicy,
}

impl PgMarketplace {
    /// Wrap a connection pool.
    pub const fn new(pool: PgPool, policy: MarketPolicy) -> Self {
        Self { pool, policy }
    }

    /// Wrap an existing [`PostgresPool`].
    pub fn from_pool(pool: &PostgresPool, policy: MarketPolicy) -> Self {
        Self::new(pool.pool().clone(), policy)
    }

    /// Return a reference to the underlying [`PgPool`].
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn deposit_tx(&self, request: DepositRequest) -> Result<Profile, DbError> {
        let amount = validate_amount(request.amount)?;

        let mut tx = self.pool.begin().await?;

        let locked =
            profile_store::lock_profiles(&mut tx, &[request.target, request.requester]).await?;
        let target = locked
            .iter()
            .find(|p| p.id == request.target)
            .ok_or_else(|| MarketError::not_found(DEPOSIT_TARGET_NOT_FOUND))?;

        let unpaid_total = job_store::unpaid_total_for_client(&mut tx, request.requester).await?;
        self.policy.deposit.check(amount, unpaid_total)?;

        let new_balance = credit(target.balance, amount)?;
        let entry = TransactionBuilder::deposit(request.target, amount, request.requester).build()?;

        let updated = profile_store::update_balance(&mut tx, request.target, new_balance).await?;
        ledger_store::insert_entry(&mut tx, &entry).await?;
        tx.commit().await?;

        tracing::info!(
            target_profile = %request.target,
            requester = %request.requester,
            %amount,
            %unpaid_total,
            "deposit committed"
        );
        Ok(updated)
    }

    async fn pay_job_tx(&self, job_id: JobId, payer: ProfileId) -> Result<Job, DbError> {
        let mut tx = self.pool.begin().await?;

        let job = job_store::lock_payable_job(&mut tx, job_id, payer)
            .await?
            .ok_or_else(|| MarketError::not_found(JOB_NOT_FOUND))?;
        let client_id = ProfileId(job.client_id);
        let contractor_id = ProfileId(job.contractor_id);

        let locked = profile_store::lock_profiles(&mut tx, &[client_id, contractor_id]).await?;
        let snapshot = |id: ProfileId| {
            locked
                .iter()
                .find(|p| p.id == id)
                .map(|p| BalanceSnapshot::new(p.id, p.balance))
                .ok_or_else(|| DbError::Decode(format!("contract party {id} is missing")))
        };

        let settlement = settle_job(JobPaymentParams {
            job: JobId(job.id),
            price: job.price,
            already_paid: job.paid,
            client: snapshot(client_id)?,
            contractor: snapshot(contractor_id)?,
        })?;
        let entry = TransactionBuilder::job_payment(&settlement).build()?;

        profile_store::update_balance(&mut tx, client_id, settlement.client.balance).await?;
        if contractor_id != client_id {
            profile_store::update_balance(&mut tx, contractor_id, settlement.contractor.balance)
                .await?;
        }
        let paid = job_store::mark_paid(&mut tx, job_id).await?;
        ledger_store::insert_entry(&mut tx, &entry).await?;
        tx.commit().await?;

        tracing::info!(
            job = %job_id,
            client = %client_id,
            contractor = %contractor_id,
            price = %job.price,
            "job payment committed"
        );
        Ok(paid)
    }
}

impl Marketplace for PgMarketplace {
    async fn find_profile(&self, id: ProfileId) -> Result<Option<Profile>, MarketError> {
        Ok(ProfileStore::new(&self.pool).find(id).await?)
    }

    async fn create_profile(&self, profile: NewProfile) -> Result<Profile, MarketError> {
        check_new_profile(&profile)?;
        Ok(ProfileStore::new(&self.pool).insert(&profile).await?)
    }

    async fn create_contract(&self, contract: NewContract) -> Result<Contract, MarketError> {
        Ok(ContractStore::new(&self.pool).insert(&contract).await?)
    }

    async fn create_job(&self, job: NewJob) -> Result<Job, MarketError> {
        check_new_job(&job)?;
        Ok(JobStore::new(&self.pool).insert(&job).await?)
    }

    async fn is_empty(&self) -> Result<bool, MarketError> {
        Ok(ProfileStore::new(&self.pool).is_empty().await?)
    }

    async fn deposit(&self, request: DepositRequest) -> Result<Profile, MarketError> {
        Ok(self.deposit_tx(request).await?)
    }

    async fn pay_job(&self, job: JobId, payer: ProfileId) -> Result<Job, MarketError> {
        Ok(self.pay_job_tx(job, payer).await?)
    }

    async fn contract_for(&self, id: ContractId, caller: ProfileId) -> Result<Contract, MarketError> {
        ContractStore::new(&self.pool)
            .find_for(id, caller)
            .await?
            .ok_or_else(|| MarketError::not_found(CONTRACT_NOT_FOUND))
    }

    async fn active_contracts(&self, caller: ProfileId) -> Result<Vec<Contract>, MarketError> {
        Ok(ContractStore::new(&self.pool).list_active(caller).await?)
    }

    async fn unpaid_jobs(&self, caller: ProfileId) -> Result<Vec<Job>, MarketError> {
        Ok(JobStore::new(&self.pool)
            .list_unpaid(caller, self.policy.unpaid_jobs_filter)
            .await?)
    }

    async fn best_profession(
        &self,
        range: ReportRange,
    ) -> Result<Vec<ProfessionEarnings>, MarketError> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        Ok(ReportStore::new(&self.pool).best_profession(range).await?)
    }

    async fn best_clients(
        &self,
        range: ReportRange,
        limit: u32,
    ) -> Result<Vec<ClientSpending>, MarketError> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        Ok(ReportStore::new(&self.pool).best_clients(range, limit).await?)
    }

    async fn ledger_entries(&self, caller: ProfileId) -> Result<Vec<LedgerEntry>, MarketError> {
        Ok(LedgerStore::new(&self.pool).entries_for(caller).await?)
    }
}

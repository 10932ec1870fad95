//! Job persistence, unpaid listings, and payment-time locking.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use marketplace_core::access::ActiveContractFilter;
use marketplace_core::market::CONTRACT_NOT_FOUND;
use marketplace_core::MarketError;
use marketplace_types::{ContractId, Job, JobId, NewJob, ProfileId};

use crate::contract_store::contract_status_to_db;
use crate::error::{is_foreign_key_violation, DbError};

/// Operations on the `jobs` table.
pub struct JobStore<'a> {
    pool: &'a PgPool,
}

impl<'a> JobStore<'a> {
    /// Create a new job store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a job.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] with a not-found error if the contract
    /// does not exist, or [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, job: &NewJob) -> Result<Job, DbError> {
        let row = sqlx::query_as::<_, JobRow>(
            r"INSERT INTO jobs (description, price, paid, payment_date, contract_id)
              VALUES ($1, $2, COALESCE($3, FALSE), $4, $5)
              RETURNING id, description, price, COALESCE(paid, FALSE) AS paid, payment_date, contract_id, created_at, updated_at",
        )
        .bind(&job.description)
        .bind(job.price)
        .bind(job.paid)
        .bind(job.payment_date)
        .bind(job.contract_id.into_inner())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DbError::Rejected(MarketError::not_found(CONTRACT_NOT_FOUND))
            } else {
                DbError::Postgres(e)
            }
        })?;

        tracing::debug!(job = row.id, "Inserted job");
        Ok(row.into())
    }

    /// Unpaid jobs on the caller's active contracts, by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_unpaid(
        &self,
        caller: ProfileId,
        filter: ActiveContractFilter,
    ) -> Result<Vec<Job>, DbError> {
        let statuses: Vec<&str> = filter
            .statuses()
            .iter()
            .map(|s| contract_status_to_db(*s))
            .collect();

        let rows = sqlx::query_as::<_, JobRow>(
            r"SELECT j.id, j.description, j.price, COALESCE(j.paid, FALSE) AS paid, j.payment_date, j.contract_id, j.created_at, j.updated_at
              FROM jobs j
              JOIN contracts c ON c.id = j.contract_id
              WHERE j.paid IS NOT TRUE
                AND (c.client_id = $1 OR c.contractor_id = $1)
                AND c.status = ANY($2::contract_status[])
              ORDER BY j.id",
        )
        .bind(caller.into_inner())
        .bind(&statuses)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Job::from).collect())
    }
}

/// A job row locked for payment, joined with its contract parties.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct PayableJobRow {
    pub(crate) id: i64,
    pub(crate) price: Decimal,
    pub(crate) paid: bool,
    pub(crate) client_id: i64,
    pub(crate) contractor_id: i64,
}

/// Lock a job the payer is the client of.
///
/// Returns `None` when the job does not exist or belongs to a contract
/// with a different client.
pub(crate) async fn lock_payable_job(
    conn: &mut PgConnection,
    job: JobId,
    payer: ProfileId,
) -> Result<Option<PayableJobRow>, DbError> {
    let row = sqlx::query_as::<_, PayableJobRow>(
        r"SELECT j.id, j.price, COALESCE(j.paid, FALSE) AS paid, c.client_id, c.contractor_id
          FROM jobs j
          JOIN contracts c ON c.id = j.contract_id
          WHERE j.id = $1 AND c.client_id = $2
          FOR UPDATE OF j",
    )
    .bind(job.into_inner())
    .bind(payer.into_inner())
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

/// Mark a locked job paid now.
pub(crate) async fn mark_paid(conn: &mut PgConnection, job: JobId) -> Result<Job, DbError> {
    let row = sqlx::query_as::<_, JobRow>(
        r"UPDATE jobs
          SET paid = TRUE, payment_date = NOW(), updated_at = NOW()
          WHERE id = $1
          RETURNING id, description, price, COALESCE(paid, FALSE) AS paid, payment_date, contract_id, created_at, updated_at",
    )
    .bind(job.into_inner())
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

/// Sum of unpaid job prices on contracts where `client` pays.
pub(crate) async fn unpaid_total_for_client(
    conn: &mut PgConnection,
    client: ProfileId,
) -> Result<Decimal, DbError> {
    let total: Decimal = sqlx::query_scalar(
        r"SELECT COALESCE(SUM(j.price), 0)
          FROM jobs j
          JOIN contracts c ON c.id = j.contract_id
          WHERE c.client_id = $1 AND j.paid IS NOT TRUE",
    )
    .bind(client.into_inner())
    .fetch_one(&mut *conn)
    .await?;

    Ok(total)
}

/// A row from the `jobs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRow {
    /// Job id.
    pub id: i64,
    /// Description.
    pub description: String,
    /// Price.
    pub price: Decimal,
    /// Paid flag, with `NULL` read as `false`.
    pub paid: bool,
    /// Payment timestamp.
    pub payment_date: Option<DateTime<Utc>>,
    /// Owning contract id.
    pub contract_id: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Self {
            id: JobId(row.id),
            description: row.description,
            price: row.price,
            paid: row.paid,
            payment_date: row.payment_date,
            contract_id: ContractId(row.contract_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

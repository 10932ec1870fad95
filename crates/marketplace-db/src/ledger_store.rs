//! Balance ledger persistence.
//!
//! One row per committed deposit or job payment, inserted inside the same
//! transaction as the balance change it records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use marketplace_types::{JobId, LedgerEntry, LedgerEntryId, LedgerEntryType, ProfileId};

use crate::error::DbError;

/// Read operations on the `balance_ledger` table.
pub struct LedgerStore<'a> {
    pool: &'a PgPool,
}

impl<'a> LedgerStore<'a> {
    /// Create a new ledger store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Entries crediting or debiting a profile, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn entries_for(&self, profile: ProfileId) -> Result<Vec<LedgerEntry>, DbError> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r"SELECT id, entry_type::TEXT AS entry_type, from_profile, to_profile, amount, job_id, requested_by, created_at
              FROM balance_ledger
              WHERE from_profile = $1 OR to_profile = $1
              ORDER BY created_at, id",
        )
        .bind(profile.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    /// Sum of every deposit ever recorded.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn total_deposits(&self) -> Result<Decimal, DbError> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM balance_ledger WHERE entry_type = 'deposit'",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(total)
    }
}

/// Insert one entry inside the caller's transaction.
pub(crate) async fn insert_entry(
    conn: &mut PgConnection,
    entry: &LedgerEntry,
) -> Result<(), DbError> {
    sqlx::query(
        r"INSERT INTO balance_ledger (id, entry_type, from_profile, to_profile, amount, job_id, requested_by, created_at)
          VALUES ($1, $2::ledger_entry_type, $3, $4, $5, $6, $7, $8)",
    )
    .bind(entry.id.into_inner())
    .bind(ledger_entry_type_to_db(entry.entry_type))
    .bind(entry.from_profile.map(ProfileId::into_inner))
    .bind(entry.to_profile.into_inner())
    .bind(entry.amount)
    .bind(entry.job_id.map(JobId::into_inner))
    .bind(entry.requested_by.into_inner())
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    tracing::debug!(entry = %entry.id, entry_type = ?entry.entry_type, "Inserted ledger entry");
    Ok(())
}

/// A row from the `balance_ledger` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerRow {
    /// Ledger entry UUID.
    pub id: Uuid,
    /// Entry type as a string (cast from `PostgreSQL` enum).
    pub entry_type: String,
    /// Debited profile.
    pub from_profile: Option<i64>,
    /// Credited profile.
    pub to_profile: i64,
    /// Amount moved.
    pub amount: Decimal,
    /// Settled job.
    pub job_id: Option<i64>,
    /// Initiating profile.
    pub requested_by: i64,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = DbError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: LedgerEntryId(row.id),
            entry_type: ledger_entry_type_from_db(&row.entry_type)?,
            from_profile: row.from_profile.map(ProfileId),
            to_profile: ProfileId(row.to_profile),
            amount: row.amount,
            job_id: row.job_id.map(JobId),
            requested_by: ProfileId(row.requested_by),
            created_at: row.created_at,
        })
    }
}

/// Convert a [`LedgerEntryType`] to its `PostgreSQL` enum string.
const fn ledger_entry_type_to_db(entry_type: LedgerEntryType) -> &'static str {
    match entry_type {
        LedgerEntryType::Deposit => "deposit",
        LedgerEntryType::JobPayment => "job_payment",
    }
}

/// Parse a `PostgreSQL` `ledger_entry_type` label.
fn ledger_entry_type_from_db(label: &str) -> Result<LedgerEntryType, DbError> {
    match label {
        "deposit" => Ok(LedgerEntryType::Deposit),
        "job_payment" => Ok(LedgerEntryType::JobPayment),
        other => Err(DbError::Decode(format!("unknown ledger entry type: {other}"))),
    }
}

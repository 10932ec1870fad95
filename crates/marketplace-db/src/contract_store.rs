//! Contract persistence and party-filtered reads.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use marketplace_core::MarketError;
use marketplace_types::{Contract, ContractId, ContractStatus, NewContract, ProfileId};

use crate::error::{is_foreign_key_violation, DbError};

/// Operations on the `contracts` table.
pub struct ContractStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ContractStore<'a> {
    /// Create a new contract store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a contract.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Rejected`] with a not-found error if either party
    /// does not exist, or [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, contract: &NewContract) -> Result<Contract, DbError> {
        let row = sqlx::query_as::<_, ContractRow>(
            r"INSERT INTO contracts (terms, status, client_id, contractor_id)
              VALUES ($1, $2::contract_status, $3, $4)
              RETURNING id, terms, status::TEXT AS status, client_id, contractor_id, created_at, updated_at",
        )
        .bind(&contract.terms)
        .bind(contract_status_to_db(contract.status))
        .bind(contract.client_id.into_inner())
        .bind(contract.contractor_id.into_inner())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                DbError::Rejected(MarketError::not_found("Profile not found"))
            } else {
                DbError::Postgres(e)
            }
        })?;

        tracing::debug!(contract = row.id, "Inserted contract");
        row.try_into()
    }

    /// A contract, only if `caller` is its client or contractor.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn find_for(
        &self,
        id: ContractId,
        caller: ProfileId,
    ) -> Result<Option<Contract>, DbError> {
        let row = sqlx::query_as::<_, ContractRow>(
            r"SELECT id, terms, status::TEXT AS status, client_id, contractor_id, created_at, updated_at
              FROM contracts
              WHERE id = $1 AND (client_id = $2 OR contractor_id = $2)",
        )
        .bind(id.into_inner())
        .bind(caller.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(Contract::try_from).transpose()
    }

    /// Non-terminated contracts the caller is party to, by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn list_active(&self, caller: ProfileId) -> Result<Vec<Contract>, DbError> {
        let rows = sqlx::query_as::<_, ContractRow>(
            r"SELECT id, terms, status::TEXT AS status, client_id, contractor_id, created_at, updated_at
              FROM contracts
              WHERE (client_id = $1 OR contractor_id = $1)
                AND status <> 'terminated'
              ORDER BY id",
        )
        .bind(caller.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Contract::try_from).collect()
    }
}

/// A row from the `contracts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContractRow {
    /// Contract id.
    pub id: i64,
    /// Terms.
    pub terms: String,
    /// Status as a string (cast from `PostgreSQL` enum).
    pub status: String,
    /// Client profile id.
    pub client_id: i64,
    /// Contractor profile id.
    pub contractor_id: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ContractRow> for Contract {
    type Error = DbError;

    fn try_from(row: ContractRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ContractId(row.id),
            terms: row.terms,
            status: contract_status_from_db(&row.status)?,
            client_id: ProfileId(row.client_id),
            contractor_id: ProfileId(row.contractor_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Convert a [`ContractStatus`] to its `PostgreSQL` enum string.
pub(crate) const fn contract_status_to_db(status: ContractStatus) -> &'static str {
    match status {
        ContractStatus::New => "new",
        ContractStatus::InProgress => "in_progress",
        ContractStatus::Terminated => "terminated",
    }
}

/// Parse a `PostgreSQL` `contract_status` label.
fn contract_status_from_db(label: &str) -> Result<ContractStatus, DbError> {
    match label {
        "new" => Ok(ContractStatus::New),
        "in_progress" => Ok(ContractStatus::InProgress),
        "terminated" => Ok(ContractStatus::Terminated),
        other => Err(DbError::Decode(format!("unknown contract status: {other}"))),
    }
}

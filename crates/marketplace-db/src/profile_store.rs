//! Profile persistence and row locking.
//!
//! Balance writes only ever happen inside a transfer transaction, after the
//! affected rows have been locked with [`lock_profiles`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use marketplace_types::{NewProfile, Profile, ProfileId, ProfileKind};

use crate::error::DbError;

/// Operations on the `profiles` table.
pub struct ProfileStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileStore<'a> {
    /// Create a new profile store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a profile and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails.
    pub async fn insert(&self, profile: &NewProfile) -> Result<Profile, DbError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"INSERT INTO profiles (first_name, last_name, profession, balance, kind)
              VALUES ($1, $2, $3, $4, $5::profile_kind)
              RETURNING id, first_name, last_name, profession, balance, kind::TEXT AS kind, created_at, updated_at",
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.profession)
        .bind(profile.balance)
        .bind(profile_kind_to_db(profile.kind))
        .fetch_one(self.pool)
        .await?;

        tracing::debug!(profile = row.id, "Inserted profile");
        row.try_into()
    }

    /// Look a profile up by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn find(&self, id: ProfileId) -> Result<Option<Profile>, DbError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r"SELECT id, first_name, last_name, profession, balance, kind::TEXT AS kind, created_at, updated_at
              FROM profiles
              WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }

    /// Whether the table has no rows.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn is_empty(&self) -> Result<bool, DbError> {
        let empty: bool = sqlx::query_scalar("SELECT NOT EXISTS (SELECT 1 FROM profiles)")
            .fetch_one(self.pool)
            .await?;
        Ok(empty)
    }

    /// Sum of every balance.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn total_balance(&self) -> Result<Decimal, DbError> {
        let total: Decimal =
            sqlx::query_scalar("SELECT COALESCE(SUM(balance), 0) FROM profiles")
                .fetch_one(self.pool)
                .await?;
        Ok(total)
    }
}

/// Lock the given profile rows for update, in ascending id order.
///
/// Every transaction that locks more than one profile goes through here,
/// so concurrent transfers always acquire row locks in the same order.
/// Unknown ids are simply absent from the result.
pub(crate) async fn lock_profiles(
    conn: &mut PgConnection,
    ids: &[ProfileId],
) -> Result<Vec<Profile>, DbError> {
    let mut ids: Vec<i64> = ids.iter().map(|id| id.into_inner()).collect();
    ids.sort_unstable();
    ids.dedup();

    let rows = sqlx::query_as::<_, ProfileRow>(
        r"SELECT id, first_name, last_name, profession, balance, kind::TEXT AS kind, created_at, updated_at
          FROM profiles
          WHERE id = ANY($1)
          ORDER BY id
          FOR UPDATE",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(Profile::try_from).collect()
}

/// Write a new balance for a locked profile.
pub(crate) async fn update_balance(
    conn: &mut PgConnection,
    id: ProfileId,
    balance: Decimal,
) -> Result<Profile, DbError> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r"UPDATE profiles
          SET balance = $2, updated_at = NOW()
          WHERE id = $1
          RETURNING id, first_name, last_name, profession, balance, kind::TEXT AS kind, created_at, updated_at",
    )
    .bind(id.into_inner())
    .bind(balance)
    .fetch_one(&mut *conn)
    .await?;

    row.try_into()
}

/// A row from the `profiles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    /// Profile id.
    pub id: i64,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Profession.
    pub profession: String,
    /// Balance.
    pub balance: Decimal,
    /// Kind as a string (cast from `PostgreSQL` enum).
    pub kind: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = DbError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProfileId(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            profession: row.profession,
            balance: row.balance,
            kind: profile_kind_from_db(&row.kind)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Convert a [`ProfileKind`] to its `PostgreSQL` enum string.
const fn profile_kind_to_db(kind: ProfileKind) -> &'static str {
    match kind {
        ProfileKind::Client => "client",
        ProfileKind::Contractor => "contractor",
    }
}

/// Parse a `PostgreSQL` `profile_kind` label.
fn profile_kind_from_db(label: &str) -> Result<ProfileKind, DbError> {
    match label {
        "client" => Ok(ProfileKind::Client),
        "contractor" => Ok(ProfileKind::Contractor),
        other => Err(DbError::Decode(format!("unknown profile kind: {other}"))),
    }
}

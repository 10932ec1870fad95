//! Aggregation queries for the admin reports.
//!
//! Both reports sum paid job prices whose payment date falls in an
//! inclusive window, grouped by contractor profession or by client.

use rust_decimal::Decimal;
use sqlx::PgPool;

use marketplace_core::report::{sort_clients, sort_professions, ReportRange};
use marketplace_types::{ClientSpending, ProfessionEarnings, ProfileId};

use crate::error::DbError;

/// Read-only reporting over `jobs`, `contracts`, and `profiles`.
pub struct ReportStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportStore<'a> {
    /// Create a new report store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Contractor professions ranked by earnings in the window.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn best_profession(
        &self,
        range: ReportRange,
    ) -> Result<Vec<ProfessionEarnings>, DbError> {
        let rows = sqlx::query_as::<_, ProfessionRow>(
            r"SELECT p.profession, SUM(j.price) AS total_earnings
              FROM jobs j
              JOIN contracts c ON c.id = j.contract_id
              JOIN profiles p ON p.id = c.contractor_id
              WHERE j.paid IS TRUE
                AND j.payment_date >= $1
                AND j.payment_date <= $2
              GROUP BY p.profession
              ORDER BY total_earnings DESC, p.profession",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(self.pool)
        .await?;

        let mut rows: Vec<ProfessionEarnings> = rows
            .into_iter()
            .map(|r| ProfessionEarnings {
                profession: r.profession,
                total_earnings: r.total_earnings,
            })
            .collect();
        // Collation can order ties differently from byte order.
        sort_professions(&mut rows);
        Ok(rows)
    }

    /// The top `limit` clients ranked by spending in the window.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn best_clients(
        &self,
        range: ReportRange,
        limit: u32,
    ) -> Result<Vec<ClientSpending>, DbError> {
        let rows = sqlx::query_as::<_, ClientRow>(
            r"SELECT p.id, p.first_name || ' ' || p.last_name AS full_name, SUM(j.price) AS paid
              FROM jobs j
              JOIN contracts c ON c.id = j.contract_id
              JOIN profiles p ON p.id = c.client_id
              WHERE j.paid IS TRUE
                AND j.payment_date >= $1
                AND j.payment_date <= $2
              GROUP BY p.id
              ORDER BY paid DESC, p.id
              LIMIT $3",
        )
        .bind(range.start)
        .bind(range.end)
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        let mut rows: Vec<ClientSpending> = rows
            .into_iter()
            .map(|r| ClientSpending {
                id: ProfileId(r.id),
                full_name: r.full_name,
                paid: r.paid,
            })
            .collect();
        sort_clients(&mut rows);
        Ok(rows)
    }
}

/// One row of the profession report.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ProfessionRow {
    profession: String,
    total_earnings: Decimal,
}

/// One row of the client report.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ClientRow {
    id: i64,
    full_name: String,
    paid: Decimal,
}

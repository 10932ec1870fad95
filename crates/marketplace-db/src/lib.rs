//! `PostgreSQL` persistence for the contractor marketplace.
//!
//! Each table gets a small store borrowing the shared [`sqlx::PgPool`];
//! [`PgMarketplace`] composes them into a [`marketplace_core::Marketplace`]
//! and owns the two transactional money movements.
//!
//! ```text
//! PgMarketplace
//!     |-- ProfileStore   (profiles, balance row locks)
//!     |-- ContractStore  (party-filtered contract reads)
//!     |-- JobStore       (unpaid listings, payment locks)
//!     |-- ReportStore    (admin aggregations)
//!     +-- LedgerStore    (deposit and payment audit rows)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- connection pool, configuration, and migrations
//! - [`marketplace`] -- the transactional [`PgMarketplace`]
//! - [`error`] -- shared error types

pub mod contract_store;
pub mod error;
pub mod job_store;
pub mod ledger_store;
pub mod marketplace;
pub mod postgres;
pub mod profile_store;
pub mod report_store;

pub use contract_store::{ContractRow, ContractStore};
pub use error::DbError;
pub use job_store::{JobRow, JobStore};
pub use ledger_store::{LedgerRow, LedgerStore};
pub use marketplace::PgMarketplace;
pub use postgres::{PostgresConfig, PostgresPool};
pub use profile_store::{ProfileRow, ProfileStore};
pub use report_store::ReportStore;

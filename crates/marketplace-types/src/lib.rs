//! Shared type definitions for the marketplace back end.
//!
//! This crate is the single source of truth for the entities exchanged
//! between the store, the transfer rules, and the HTTP API. Types flow
//! downstream to `TypeScript` via `ts-rs` for API consumers.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for all entity identifiers
//! - [`enums`] -- Profile kind, contract status, ledger entry type
//! - [`structs`] -- Profiles, contracts, jobs, ledger entries, report rows

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ContractStatus, LedgerEntryType, ProfileKind};
pub use ids::{ContractId, JobId, LedgerEntryId, ProfileId};
pub use structs::{
    ClientSpending, Contract, Job, LedgerEntry, NewContract, NewJob, NewProfile,
    ProfessionEarnings, Profile,
};

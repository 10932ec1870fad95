//! Configuration, store abstraction, and visibility rules for the
//! marketplace.
//!
//! This crate sits between the pure money rules in `marketplace-ledger`
//! and the backends and HTTP layer built on top of it.
//!
//! # Modules
//!
//! - [`access`] -- Which contracts and jobs a profile may see.
//! - [`config`] -- Configuration loading from `marketplace-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- [`MarketError`], the taxonomy every operation reports.
//! - [`market`] -- The [`Marketplace`] store trait and shared payload checks.
//! - [`memory`] -- [`MemoryMarketplace`], the in-memory store.
//! - [`report`] -- Reporting windows, limits, and earnings ranking.
//!
//! [`MarketError`]: error::MarketError
//! [`Marketplace`]: market::Marketplace
//! [`MemoryMarketplace`]: memory::MemoryMarketplace

pub mod access;
pub mod config;
pub mod error;
pub mod market;
pub mod memory;
pub mod report;

pub use error::MarketError;
pub use market::{DepositRequest, MarketPolicy, Marketplace};
pub use memory::MemoryMarketplace;
pub use marketplace_ledger::TransferError;

//! HTTP API for the contractor marketplace.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Contract and job endpoints** scoped to the calling profile
//! - **Balance endpoints** for capped deposits and ledger history
//! - **Admin reports** ranking professions and clients by paid work
//! - **Health probe** at `/health`
//!
//! # Architecture
//!
//! Handlers are generic over the [`Marketplace`](marketplace_core::Marketplace)
//! store held in [`AppState`]. The caller is identified by the
//! `profile_id` header through the [`Caller`](auth::Caller) extractor;
//! every failure is rendered by [`ApiError`].

pub mod admin;
pub mod auth;
pub mod balances;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::AppState;

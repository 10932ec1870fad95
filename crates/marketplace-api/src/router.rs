//! Axum router construction for the marketplace API.
//!
//! Assembles every route into a single [`Router`] with CORS and
//! request tracing middleware.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use marketplace_core::Marketplace;

use crate::state::AppState;
use crate::{admin, balances, handlers};

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /health` -- liveness probe
/// - `GET /contracts` -- caller's active contracts
/// - `GET /contracts/{id}` -- single contract
/// - `GET /jobs/unpaid` -- caller's unpaid jobs
/// - `POST /jobs/{id}/pay` -- pay a job
/// - `POST /balances/deposit/{id}` -- deposit into a profile
/// - `GET /balances/history` -- caller's ledger entries
/// - `GET /admin/best-profession` -- top earning professions
/// - `GET /admin/best-clients` -- top paying clients
pub fn build_router<S: Marketplace>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Contracts
        .route("/contracts", get(handlers::list_contracts::<S>))
        .route("/contracts/{id}", get(handlers::get_contract::<S>))
        // Jobs
        .route("/jobs/unpaid", get(handlers::list_unpaid_jobs::<S>))
        .route("/jobs/{id}/pay", post(handlers::pay_job::<S>))
        // Balances
        .route("/balances/deposit/{id}", post(balances::deposit::<S>))
        .route("/balances/history", get(balances::history::<S>))
        // Admin reports
        .route("/admin/best-profession", get(admin::best_profession::<S>))
        .route("/admin/best-clients", get(admin::best_clients::<S>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! REST handlers for contracts, jobs, and service health.
//!
//! Every marketplace handler takes a [`Caller`] and only ever returns
//! records the caller is a party to.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/contracts` | Caller's non-terminated contracts |
//! | `GET` | `/contracts/{id}` | Single contract the caller is party to |
//! | `GET` | `/jobs/unpaid` | Unpaid jobs on the caller's active contracts |
//! | `POST` | `/jobs/{id}/pay` | Pay a job as its client |

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use marketplace_core::Marketplace;
use marketplace_types::{ContractId, JobId};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

/// Parse a numeric path segment.
pub(crate) fn parse_id<T>(raw: &str, what: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {what} id '{raw}': {e}")))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe. Never touches the store.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// Return a contract if the caller is its client or contractor.
pub async fn get_contract<S: Marketplace>(
    caller: Caller,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: ContractId = parse_id(&id, "contract")?;
    let contract = state.store.contract_for(id, caller.id()).await?;
    Ok(Json(contract))
}

/// List the caller's non-terminated contracts.
pub async fn list_contracts<S: Marketplace>(
    caller: Caller,
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let contracts = state.store.active_contracts(caller.id()).await?;
    Ok(Json(contracts))
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// List unpaid jobs on the caller's active contracts.
pub async fn list_unpaid_jobs<S: Marketplace>(
    caller: Caller,
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let jobs = state.store.unpaid_jobs(caller.id()).await?;
    Ok(Json(jobs))
}

/// Pay for a job. Only the contract's client may pay.
pub async fn pay_job<S: Marketplace>(
    caller: Caller,
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job: JobId = parse_id(&id, "job")?;
    let paid = state.store.pay_job(job, caller.id()).await?;
    Ok(Json(paid))
}

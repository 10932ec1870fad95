//! Admin reporting endpoints.
//!
//! Both reports take an inclusive `start`/`end` window on job payment
//! dates. Query values are taken as raw strings and validated here so
//! callers get the report's own messages rather than extractor rejections.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use marketplace_core::report::{resolve_limit, ReportRange};
use marketplace_core::Marketplace;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters shared by the admin reports.
#[derive(Debug, Default, serde::Deserialize)]
pub struct ReportQuery {
    /// Window start (RFC 3339, naive timestamp, or date).
    pub start: Option<String>,
    /// Window end, inclusive.
    pub end: Option<String>,
    /// Row limit for `best-clients`.
    pub limit: Option<String>,
}

impl ReportQuery {
    fn range(&self) -> Result<ReportRange, ApiError> {
        Ok(ReportRange::parse(
            self.start.as_deref(),
            self.end.as_deref(),
        )?)
    }
}

/// The profession that earned the most in the window.
///
/// Returns every profession with earnings, highest first; an empty array
/// when nothing was paid in the window.
pub async fn best_profession<S: Marketplace>(
    _caller: Caller,
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let range = query.range()?;
    let rows = state.store.best_profession(range).await?;
    Ok(Json(rows))
}

/// The clients that paid the most in the window.
pub async fn best_clients<S: Marketplace>(
    _caller: Caller,
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let range = query.range()?;
    let limit = resolve_limit(query.limit.as_deref(), state.best_clients_default_limit)?;
    let rows = state.store.best_clients(range, limit).await?;
    Ok(Json(rows))
}

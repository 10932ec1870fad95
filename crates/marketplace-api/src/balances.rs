//! Balance endpoints: deposits and ledger history.
//!
//! The deposit body is read as raw bytes rather than through the `Json`
//! extractor so a missing body, a missing field, and `null` all reach the
//! ledger rules as "no amount" and produce the same message.

use std::str::FromStr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde_json::Value;

use marketplace_core::{DepositRequest, Marketplace};
use marketplace_types::ProfileId;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::state::AppState;

/// Message for an `amount` that is present but not a number.
pub const AMOUNT_NOT_NUMERIC: &str = "Amount must be a number";

/// Extract `amount` from a deposit body.
///
/// Returns `Ok(None)` for an empty body or an absent/`null` field. Numbers
/// are parsed from their JSON text so no float rounding is involved;
/// numeric strings are accepted too.
pub fn parse_amount(body: &[u8]) -> Result<Option<Decimal>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed JSON body: {e}")))?;

    let raw = match value.get("amount") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(_) => return Err(ApiError::BadRequest(AMOUNT_NOT_NUMERIC.to_owned())),
    };

    Decimal::from_str(&raw)
        .or_else(|_exact| Decimal::from_scientific(&raw))
        .map(Some)
        .map_err(|e| ApiError::BadRequest(format!("{AMOUNT_NOT_NUMERIC}: {e}")))
}

/// Credit a profile's balance.
///
/// The amount is capped by the caller's outstanding unpaid work.
pub async fn deposit<S: Marketplace>(
    caller: Caller,
    State(state): State<Arc<AppState<S>>>,
    Path(target): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let target: ProfileId = parse_id(&target, "profile")?;
    let amount = parse_amount(&body)?;

    let updated = state
        .store
        .deposit(DepositRequest {
            target,
            requester: caller.id(),
            amount,
        })
        .await?;
    Ok(Json(updated))
}

/// Ledger entries the caller was credited or debited by, oldest first.
pub async fn history<S: Marketplace>(
    caller: Caller,
    State(state): State<Arc<AppState<S>>>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state.store.ledger_entries(caller.id()).await?;
    Ok(Json(entries))
}

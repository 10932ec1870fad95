//! Caller identity.
//!
//! Every marketplace route acts on behalf of the profile named by the
//! `profile_id` header. [`Caller`] resolves it through the store before
//! the handler runs, so path and body problems are only reported to
//! callers that exist.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use marketplace_core::Marketplace;
use marketplace_types::{Profile, ProfileId};

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the caller's profile id.
pub const PROFILE_HEADER: &str = "profile_id";

/// The authenticated profile making the request.
#[derive(Debug, Clone)]
pub struct Caller(pub Profile);

impl Caller {
    /// The caller's profile id.
    pub const fn id(&self) -> ProfileId {
        self.0.id
    }
}

impl<S: Marketplace> FromRequestParts<Arc<AppState<S>>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(PROFILE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.trim().parse::<ProfileId>().ok())
            .ok_or(ApiError::Unauthorized)?;

        match state.store.find_profile(id).await? {
            Some(profile) => Ok(Self(profile)),
            None => {
                tracing::debug!(profile = %id, "unknown caller");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

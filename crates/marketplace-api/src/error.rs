//! Error types for the marketplace API.
//!
//! [`ApiError`] unifies every failure mode into a single enum that
//! converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! error body has the shape `{"error": <message>, "status": <code>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use marketplace_core::MarketError;

/// Message returned in place of internal failure detail.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A marketplace operation failed.
    #[error(transparent)]
    Market(#[from] MarketError),

    /// The request could not be interpreted (bad path id, malformed body).
    #[error("{0}")]
    BadRequest(String),

    /// No valid caller identity.
    #[error("Unauthorized")]
    Unauthorized,
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Market(MarketError::Validation(_) | MarketError::Conflict(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Market(MarketError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Market(MarketError::Unauthenticated(_)) | Self::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Self::Market(MarketError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Market(MarketError::Internal(detail)) => {
                tracing::error!(error = %detail, "request failed");
                INTERNAL_MESSAGE.to_owned()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

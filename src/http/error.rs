//! Maps [`RuntimeError`] onto the wire: HTTP 511 carrying the taxonomy
//! envelope (spec.md §4.6/§9). 511 is deliberately non-standard so a
//! client can distinguish a typed application error from a transport
//! failure at a glance.

use crate::error::{ErrorEnvelope, RuntimeError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

const APPLICATION_ERROR_STATUS: u16 = 511;

/// Wrapper so handlers can return `Result<Json<T>, ApiError>` and get the
/// taxonomy envelope for free via `?`.
pub struct ApiError(pub RuntimeError);

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = ErrorEnvelope::from(&self.0);
        let status = StatusCode::from_u16(APPLICATION_ERROR_STATUS)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(envelope)).into_response()
    }
}

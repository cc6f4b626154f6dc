//! `X-API-Key` authentication middleware (spec.md §6).

use super::state::AppState;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

const API_KEY_HEADER: &str = "X-API-Key";

/// Reject the request with 401 if the server was started with a non-empty
/// API key and the request's `X-API-Key` header doesn't match it. If the
/// server's key is empty, authentication is disabled entirely.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.api_key.is_empty() {
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if key == state.api_key.as_str() => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

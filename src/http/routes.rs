//! Route handlers for the HTTP control surface (spec.md §6).

use super::auth::require_api_key;
use super::dto::{
    BashAction, CloseBashSessionRequest, CloseResponse, CloseSessionResponse, CommandRequest,
    CreateBashSessionRequest, CreateSessionResponse, IsAliveResponse, ReadFileRequest,
    ReadFileResponse, UploadResponse, WriteFileRequest, WriteFileResponse,
};
use super::error::ApiError;
use super::state::AppState;
use crate::error::RuntimeError;
use crate::facade::CreateSessionRequest;
use crate::session::Observation;
use axum::extract::{Multipart, State};
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

/// Build the full router: every endpoint from spec.md §6's table, behind
/// the `X-API-Key` auth layer and an access-log trace layer.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/is_alive", get(is_alive))
        .route("/create_session", post(create_session))
        .route("/run_in_session", post(run_in_session))
        .route("/close_session", post(close_session))
        .route("/execute", post(execute))
        .route("/read_file", post(read_file))
        .route("/write_file", post(write_file))
        .route("/upload", post(upload))
        .route("/close", post(close))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn is_alive(State(state): State<AppState>) -> Json<IsAliveResponse> {
    Json(IsAliveResponse {
        ok: state.facade.is_alive(),
    })
}

async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateBashSessionRequest>,
) -> Result<Json<CreateSessionResponse>, ApiError> {
    state
        .facade
        .create_session(CreateSessionRequest {
            name: req.session,
            startup_sources: req.startup_source,
            env: req.env.into_iter().collect(),
            cwd: req.cwd,
            default_timeout_secs: req.timeout,
        })
        .await?;
    Ok(Json(CreateSessionResponse { ok: true }))
}

async fn run_in_session(
    State(state): State<AppState>,
    Json(action): Json<BashAction>,
) -> Result<Json<Observation>, ApiError> {
    let opts = action.run_options();
    let observation = state
        .facade
        .run_in_session(&action.session, &action.command, opts)
        .await?;
    Ok(Json(observation))
}

async fn close_session(
    State(state): State<AppState>,
    Json(req): Json<CloseBashSessionRequest>,
) -> Result<Json<CloseSessionResponse>, ApiError> {
    state.facade.close_session(&req.session).await?;
    Ok(Json(CloseSessionResponse { ok: true }))
}

async fn execute(
    State(state): State<AppState>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<crate::executor::OneShotResponse>, ApiError> {
    let (spec, one_shot) = req.into_spec_and_request()?;
    let response = state.facade.execute(spec, one_shot).await;
    Ok(Json(response))
}

async fn read_file(
    State(state): State<AppState>,
    Json(req): Json<ReadFileRequest>,
) -> Result<Json<ReadFileResponse>, ApiError> {
    let content = state.facade.read_file(&req.path).await?;
    Ok(Json(ReadFileResponse { content }))
}

async fn write_file(
    State(state): State<AppState>,
    Json(req): Json<WriteFileRequest>,
) -> Result<Json<WriteFileResponse>, ApiError> {
    state
        .facade
        .write_file(&req.path, req.content.as_bytes())
        .await?;
    Ok(Json(WriteFileResponse { ok: true }))
}

/// `multipart: file, target_path, unzip` per spec.md §6. `unzip` (any
/// value present and not "false"/"0") requests tar+gzip extraction into
/// `target_path` instead of a plain file write.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let invalid = |msg: String| ApiError(RuntimeError::InvalidRequest(msg));

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut target_path: Option<String> = None;
    let mut extract_tar = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| invalid(e.to_string()))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                let bytes = field.bytes().await.map_err(|e| invalid(e.to_string()))?;
                file_bytes = Some(bytes.to_vec());
            }
            "target_path" => {
                let text = field.text().await.map_err(|e| invalid(e.to_string()))?;
                target_path = Some(text);
            }
            "unzip" => {
                let text = field.text().await.map_err(|e| invalid(e.to_string()))?;
                extract_tar = !matches!(text.as_str(), "" | "false" | "0");
            }
            _ => {}
        }
    }

    let bytes = file_bytes.ok_or_else(|| invalid("missing 'file' field".to_string()))?;
    let target = target_path.ok_or_else(|| invalid("missing 'target_path' field".to_string()))?;

    state.facade.upload(&target, bytes, extract_tar).await?;

    Ok(Json(UploadResponse { ok: true }))
}

async fn close(State(state): State<AppState>) -> Json<CloseResponse> {
    state.facade.close().await;
    Json(CloseResponse { ok: true })
}

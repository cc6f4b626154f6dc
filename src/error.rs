//! Error taxonomy shared by the session engine, the registry, and the HTTP
//! control surface.
//!
//! Every variant here is a taxonomy entry from the specification: a name
//! that crosses the HTTP boundary as `error_kind` so a client can
//! reconstruct the matching exception without parsing prose.

use serde::Serialize;
use thiserror::Error;

/// All errors that can originate below the HTTP boundary.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// `create_session` called with a name already present.
    #[error("session '{0}' already exists")]
    SessionExists(String),

    /// Any session operation referencing an unknown name.
    #[error("session '{0}' does not exist")]
    SessionDoesNotExist(String),

    /// Run called before prompt sync completed, or after the shell died.
    #[error("session '{0}' is not initialized")]
    SessionNotInitialized(String),

    /// The static syntax check rejected the command before it touched the shell.
    #[error("command is not a syntactically complete bash statement: {reason}")]
    BashIncorrectSyntax { reason: String },

    /// The command did not complete within the deadline.
    #[error("command timed out after {timeout_secs}s (recovered={recovered})")]
    CommandTimeout {
        command: String,
        timeout_secs: u64,
        recovered: bool,
        partial_output: String,
    },

    /// Raised only when the caller requested `check=raise` and exit code != 0.
    #[error("command exited with code {exit_code}")]
    NonZeroExitCode { exit_code: i32, output: String },

    /// The sentinel was found but the exit-code suffix was malformed.
    #[error("no exit code found in sentinel output — session state may be corrupted")]
    NoExitCode,

    /// The runtime facade was called before start completed.
    #[error("deployment has not started")]
    DeploymentNotStarted,

    /// Errors from `read_file` / `write_file` / `upload`, carrying the
    /// underlying OS error message verbatim.
    #[error("file operation failed: {0}")]
    FileOp(String),

    /// The request body was malformed in a way below the HTTP boundary
    /// cares about: wrong JSON shape, missing required multipart field, etc.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RuntimeError {
    /// The taxonomy name serialized as `error_kind` in the HTTP error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::SessionExists(_) => "SessionExistsError",
            RuntimeError::SessionDoesNotExist(_) => "SessionDoesNotExistError",
            RuntimeError::SessionNotInitialized(_) => "SessionNotInitializedError",
            RuntimeError::BashIncorrectSyntax { .. } => "BashIncorrectSyntaxError",
            RuntimeError::CommandTimeout { .. } => "CommandTimeoutError",
            RuntimeError::NonZeroExitCode { .. } => "NonZeroExitCodeError",
            RuntimeError::NoExitCode => "NoExitCodeError",
            RuntimeError::DeploymentNotStarted => "DeploymentNotStartedError",
            RuntimeError::FileOp(_) => "FileOpError",
            RuntimeError::InvalidRequest(_) => "InvalidRequestError",
        }
    }

    /// Extra structured fields carried by some variants, for the `extra`
    /// slot of the HTTP error envelope.
    pub fn extra(&self) -> Option<serde_json::Value> {
        match self {
            RuntimeError::CommandTimeout {
                command,
                timeout_secs,
                recovered,
                partial_output,
            } => Some(serde_json::json!({
                "command": command,
                "timeout": timeout_secs,
                "recovered": recovered,
                "partial_output": partial_output,
            })),
            RuntimeError::NonZeroExitCode { exit_code, output } => Some(serde_json::json!({
                "exit_code": exit_code,
                "output": output,
            })),
            _ => None,
        }
    }
}

/// Wire shape of the error envelope described by the specification: every
/// non-2xx application error crosses the HTTP boundary as this JSON body
/// under status 511.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error_kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

impl From<&RuntimeError> for ErrorEnvelope {
    fn from(err: &RuntimeError) -> Self {
        ErrorEnvelope {
            error_kind: err.kind().to_string(),
            message: err.to_string(),
            extra: err.extra(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

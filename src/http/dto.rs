//! Wire-facing request/response shapes for the HTTP control surface
//! (spec.md §3 and §6). These are the only types that know about JSON;
//! everything below the HTTP boundary speaks plain Rust types.

use crate::error::RuntimeError;
use crate::executor::{CommandSpec, OneShotRequest};
use crate::session::{CheckMode, RunOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize, Deserialize)]
pub struct IsAliveResponse {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateBashSessionRequest {
    pub session: String,
    #[serde(default)]
    pub startup_source: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct BashAction {
    pub session: String,
    pub command: String,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub is_interactive_command: bool,
    #[serde(default)]
    pub is_interactive_quit: bool,
    #[serde(default)]
    pub check: Option<String>,
}

impl BashAction {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            timeout_secs: self.timeout,
            is_interactive_command: self.is_interactive_command,
            is_interactive_quit: self.is_interactive_quit,
            check: self.check.as_deref().map(|c| match c {
                "raise" => CheckMode::Raise,
                _ => CheckMode::Silent,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CloseBashSessionRequest {
    pub session: String,
}

#[derive(Debug, Serialize)]
pub struct CloseSessionResponse {
    pub ok: bool,
}

/// Body of `POST /execute`. `command` is either an argv list or, when
/// `shell` is true, a single shell string run via `/bin/sh -c`.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: serde_json::Value,
    #[serde(default)]
    pub shell: bool,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub stdin: Option<String>,
}

impl CommandRequest {
    pub fn into_spec_and_request(self) -> Result<(CommandSpec, OneShotRequest), RuntimeError> {
        let spec = if self.shell {
            let s = self.command.as_str().ok_or_else(|| {
                RuntimeError::InvalidRequest(
                    "shell=true requires 'command' to be a string".to_string(),
                )
            })?;
            CommandSpec::Shell(s.to_string())
        } else {
            let argv = self
                .command
                .as_array()
                .ok_or_else(|| {
                    RuntimeError::InvalidRequest(
                        "'command' must be an array of strings unless shell=true".to_string(),
                    )
                })?
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<String>>>()
                .ok_or_else(|| {
                    RuntimeError::InvalidRequest(
                        "'command' array must contain only strings".to_string(),
                    )
                })?;
            CommandSpec::Argv(argv)
        };
        let request = OneShotRequest {
            env: self.env.into_iter().collect(),
            cwd: self.cwd,
            timeout_secs: self.timeout,
            stdin: self.stdin,
        };
        Ok((spec, request))
    }
}

#[derive(Debug, Deserialize)]
pub struct ReadFileRequest {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ReadFileResponse {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct WriteFileRequest {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct WriteFileResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct CloseResponse {
    pub ok: bool,
}

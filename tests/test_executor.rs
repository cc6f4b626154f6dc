//! Unit tests for the One-Shot Executor.

use swerex_runtime::executor::{execute, CommandSpec, OneShotRequest};

// ---------------------------------------------------------------------------
// Basic execution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_captures_stdout_and_stderr_separately() {
    let resp = execute(
        CommandSpec::Shell("echo out; echo err >&2".to_string()),
        OneShotRequest::default(),
    )
    .await;
    assert_eq!(resp.stdout, "out\n");
    assert_eq!(resp.stderr, "err\n");
    assert_eq!(resp.exit_code, Some(0));
    assert!(resp.success);
}

#[tokio::test]
async fn test_non_zero_exit_does_not_error() {
    let resp = execute(CommandSpec::Shell("exit 7".to_string()), OneShotRequest::default()).await;
    assert_eq!(resp.exit_code, Some(7));
    assert!(!resp.success);
}

#[tokio::test]
async fn test_argv_form_runs_without_a_shell() {
    let resp = execute(
        CommandSpec::Argv(vec!["/bin/echo".to_string(), "hi".to_string()]),
        OneShotRequest::default(),
    )
    .await;
    assert_eq!(resp.stdout, "hi\n");
}

// ---------------------------------------------------------------------------
// stdin and timeout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_stdin_is_forwarded() {
    let resp = execute(
        CommandSpec::Shell("cat".to_string()),
        OneShotRequest {
            stdin: Some("hello\n".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(resp.stdout, "hello\n");
}

#[tokio::test]
async fn test_timeout_kills_process_and_reports_no_exit_code() {
    let resp = execute(
        CommandSpec::Shell("sleep 30".to_string()),
        OneShotRequest {
            timeout_secs: Some(1),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(resp.exit_code, None);
    assert!(!resp.success);
}

//! Tests for the Runtime Facade: the stateless dispatcher sitting between
//! the HTTP control surface and the registry/executor/filesystem.

use swerex_runtime::error::RuntimeError;
use swerex_runtime::executor::{CommandSpec, OneShotRequest};
use swerex_runtime::facade::{CreateSessionRequest, RuntimeFacade};
use swerex_runtime::session::RunOptions;

#[tokio::test]
async fn test_is_alive_is_always_true() {
    let facade = RuntimeFacade::new();
    assert!(facade.is_alive());
}

#[tokio::test]
async fn test_create_run_close_round_trip() {
    let facade = RuntimeFacade::new();
    facade
        .create_session(CreateSessionRequest {
            name: "main".to_string(),
            ..Default::default()
        })
        .await
        .expect("create");
    let obs = facade
        .run_in_session("main", "echo hi", RunOptions::default())
        .await
        .expect("run");
    assert_eq!(obs.output, "hi\n");
    facade.close_session("main").await.expect("close");
    let err = facade.close_session("main").await.unwrap_err();
    assert!(matches!(err, RuntimeError::SessionDoesNotExist(_)));
}

#[tokio::test]
async fn test_write_then_read_file_round_trips() {
    let facade = RuntimeFacade::new();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested/deep/file.txt");
    let path_str = path.to_str().unwrap().to_string();
    facade.write_file(&path_str, b"hello").await.expect("write");
    let content = facade.read_file(&path_str).await.expect("read");
    assert_eq!(content, "hello");
}

#[tokio::test]
async fn test_execute_delegates_to_one_shot_executor() {
    let facade = RuntimeFacade::new();
    let resp = facade
        .execute(
            CommandSpec::Shell("echo one-shot".to_string()),
            OneShotRequest::default(),
        )
        .await;
    assert_eq!(resp.stdout, "one-shot\n");
    assert!(resp.success);
}

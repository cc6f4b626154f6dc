//! Unit tests for the PTY I/O loop.

use std::time::Duration;
use swerex_runtime::pty::{PtyChannel, TextReadOutcome};

#[tokio::test]
async fn test_spawn_echo_and_read() {
    let argv = vec!["/bin/echo".to_string(), "hello-pty".to_string()];
    let mut pty = PtyChannel::spawn(&argv, &[], None, 24, 200)
        .await
        .expect("spawn");

    let mut collected = String::new();
    for _ in 0..20 {
        match pty.read_text(4096, Duration::from_millis(500)).await {
            TextReadOutcome::Text(s) => collected.push_str(&s),
            TextReadOutcome::Eof => break,
            TextReadOutcome::TimedOut => continue,
        }
    }
    assert!(collected.contains("hello-pty"), "got: {collected:?}");
}

#[tokio::test]
async fn test_interrupt_does_not_panic_on_dead_child() {
    let argv = vec!["/bin/true".to_string()];
    let mut pty = PtyChannel::spawn(&argv, &[], None, 24, 200)
        .await
        .expect("spawn");
    let _ = pty.wait().await;
    assert!(pty.interrupt().is_ok());
}

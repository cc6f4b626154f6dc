//! One-Shot Executor (spec.md §4.5): runs a single command in a fresh
//! process, independent of any session.
//!
//! Grounded on the teacher's `process::run`, generalized in two ways:
//! stdout and stderr are captured into separate buffers instead of one
//! interleaved buffer (the spec's response shape requires it), and the
//! command may be given as argv or as a shell string.

use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::Command;

/// How the command text is interpreted.
#[derive(Debug, Clone)]
pub enum CommandSpec {
    /// Executed directly, no shell involved.
    Argv(Vec<String>),
    /// Executed as `/bin/sh -c <command>`.
    Shell(String),
}

/// Input to [`execute`] (spec.md §3 "One-Shot Command").
#[derive(Debug, Clone, Default)]
pub struct OneShotRequest {
    pub env: Vec<(String, String)>,
    pub cwd: Option<String>,
    pub timeout_secs: Option<u64>,
    pub stdin: Option<String>,
}

/// Output of [`execute`] (spec.md §3 "One-Shot Response").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OneShotResponse {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub success: bool,
}

/// Run `spec` to completion (or until `request.timeout_secs` elapses),
/// never raising on a non-zero exit — the caller inspects `exit_code`.
pub async fn execute(spec: CommandSpec, request: OneShotRequest) -> OneShotResponse {
    let mut cmd = match &spec {
        CommandSpec::Argv(argv) => {
            let Some((program, args)) = argv.split_first() else {
                return OneShotResponse {
                    stdout: String::new(),
                    stderr: "empty argv".to_string(),
                    exit_code: None,
                    success: false,
                };
            };
            let mut cmd = Command::new(program);
            cmd.args(args);
            cmd
        }
        CommandSpec::Shell(command) => {
            let mut cmd = Command::new("/bin/sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    };

    cmd.stdin(if request.stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    for (k, v) in &request.env {
        cmd.env(k, v);
    }
    if let Some(dir) = &request.cwd {
        cmd.current_dir(dir);
    }

    // Own process group so a timeout kill takes any children with it.
    unsafe {
        cmd.pre_exec(|| {
            nix::unistd::setsid().map_err(std::io::Error::other)?;
            Ok(())
        });
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return OneShotResponse {
                stdout: String::new(),
                stderr: format!("failed to spawn process: {e}"),
                exit_code: None,
                success: false,
            };
        }
    };

    if let (Some(input), Some(mut stdin)) = (request.stdin, child.stdin.take()) {
        use tokio::io::AsyncWriteExt;
        let _ = stdin.write_all(input.as_bytes()).await;
        drop(stdin);
    }

    let stdout_pipe = child.stdout.take().expect("stdout piped");
    let stderr_pipe = child.stderr.take().expect("stderr piped");

    let stdout_task = tokio::spawn(read_all(stdout_pipe));
    let stderr_task = tokio::spawn(read_all(stderr_pipe));

    let exit_code = match request.timeout_secs {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), child.wait()).await {
            Ok(Ok(status)) => status.code(),
            Ok(Err(_)) => None,
            Err(_) => {
                kill_process_group(&child);
                let _ = child.wait().await;
                None
            }
        },
        None => child.wait().await.ok().and_then(|s| s.code()),
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    OneShotResponse {
        success: exit_code == Some(0),
        stdout,
        stderr,
        exit_code,
    }
}

async fn read_all(pipe: impl tokio::io::AsyncRead + Unpin) -> String {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}

fn kill_process_group(child: &tokio::process::Child) {
    let Some(pid) = child.id() else { return };
    let _ = nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(-(pid as i32)),
        nix::sys::signal::Signal::SIGKILL,
    );
}

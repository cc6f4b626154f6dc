//! Bash Session State Machine (spec.md §4.2).
//!
//! Wraps one [`PtyChannel`] and implements start/run/interrupt/close:
//! prompt synchronization, sentinel-based end-of-command detection,
//! output sanitization, timeout-with-interrupt recovery, and the
//! incomplete-command pre-check.

use crate::error::{Result, RuntimeError};
use crate::output;
use crate::pty::{PtyChannel, TextReadOutcome};
use crate::syntax;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Configuration for a single session, set at creation time and immutable
/// thereafter (spec.md §3 "Session").
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Absolute paths `source`d, in order, during start.
    pub startup_sources: Vec<String>,
    /// Extra environment variables applied on top of the inherited environment.
    pub env: Vec<(String, String)>,
    /// Initial working directory. `None` uses the runtime's cwd.
    pub cwd: Option<String>,
    /// Default timeout applied to `run` when the caller doesn't specify one.
    pub default_timeout_secs: u64,
    /// The PS1 string used for prompt synchronization. Must be unlikely to
    /// occur in natural command output.
    pub ps1: String,
    /// The PS2 continuation-prompt string, stripped from multi-line output.
    pub ps2: String,
    /// Byte sent first when `is_interactive_quit` is set (default Ctrl-D).
    pub quit_byte: u8,
    /// Grace period for recovery after a timeout-triggered SIGINT, before
    /// escalating to SIGTERM/SIGKILL and marking the session failed.
    pub recovery_timeout_secs: u64,
    pub pty_rows: u16,
    pub pty_cols: u16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            startup_sources: Vec::new(),
            env: Vec::new(),
            cwd: None,
            default_timeout_secs: 60,
            ps1: "SWE-REX-PS1>".to_string(),
            ps2: "SWE-REX-PS2>".to_string(),
            quit_byte: 0x04,
            recovery_timeout_secs: 5,
            pty_rows: 40,
            pty_cols: 200,
        }
    }
}

/// Whether a non-zero exit code should be silently reported or raised as
/// an error (spec.md §3 "Command Request").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    Silent,
    Raise,
}

/// Per-call options for [`BashSession::run`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub timeout_secs: Option<u64>,
    pub is_interactive_command: bool,
    pub is_interactive_quit: bool,
    pub check: Option<CheckMode>,
}

/// The structured result of a session run (spec.md §3 "Observation").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub output: String,
    pub exit_code: Option<i32>,
    pub failure_reason: String,
    pub session_type: String,
}

impl Observation {
    fn success(output: String, exit_code: Option<i32>) -> Self {
        Self {
            output,
            exit_code,
            failure_reason: String::new(),
            session_type: "bash".to_string(),
        }
    }
}

/// A long-lived interactive Bash shell attached to a PTY.
#[derive(Debug)]
pub struct BashSession {
    config: SessionConfig,
    pty: Option<PtyChannel>,
    started: bool,
    failed: bool,
    rolling: String,
}

impl BashSession {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            pty: None,
            started: false,
            failed: false,
            rolling: String::new(),
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Spawn bash, disable echo/history/bracketed-paste, source every
    /// configured startup file, then drain until the PS1 prompt appears at
    /// the tail of the buffer (spec.md §4.2 "Start").
    pub async fn start(&mut self) -> Result<()> {
        let argv = vec![
            "/bin/bash".to_string(),
            "--norc".to_string(),
            "--noprofile".to_string(),
        ];
        let mut pty = PtyChannel::spawn(
            &argv,
            &self.config.env,
            self.config.cwd.as_deref(),
            self.config.pty_rows,
            self.config.pty_cols,
        )
        .await
        .map_err(|e| RuntimeError::SessionNotInitialized(format!("spawn failed: {e}")))?;

        let setup = format!(
            "stty -echo -icanon\nset +H\nbind 'set enable-bracketed-paste off' 2>/dev/null\nexport PS1='{}' PS2='{}'\n",
            self.config.ps1, self.config.ps2
        );
        pty.write(setup.as_bytes())
            .await
            .map_err(|e| RuntimeError::SessionNotInitialized(format!("setup write failed: {e}")))?;

        self.pty = Some(pty);

        // Drain until the prompt first appears, establishing ground state.
        self.sync_prompt(Duration::from_secs(10)).await?;

        for source in self.config.startup_sources.clone() {
            let cmd = format!("source {source}");
            let obs = self.run_internal(&cmd, Duration::from_secs(30), false).await?;
            if obs.exit_code != Some(0) {
                self.failed = true;
                return Err(RuntimeError::SessionNotInitialized(format!(
                    "startup source '{source}' failed: {}",
                    obs.output
                )));
            }
        }

        self.started = true;
        Ok(())
    }

    /// Drain the PTY until the PS1 string is observed at the tail of the
    /// rolling buffer.
    async fn sync_prompt(&mut self, deadline: Duration) -> Result<()> {
        let pty = self.pty.as_mut().ok_or_else(|| {
            RuntimeError::SessionNotInitialized("session has no pty".to_string())
        })?;
        let start = Instant::now();
        let mut buf = String::new();
        while start.elapsed() < deadline {
            match pty
                .read_text(8192, Duration::from_millis(200))
                .await
            {
                TextReadOutcome::Text(s) => {
                    buf.push_str(&s);
                    if buf.trim_end().ends_with(self.config.ps1.as_str()) {
                        return Ok(());
                    }
                }
                TextReadOutcome::TimedOut => continue,
                TextReadOutcome::Eof => {
                    self.failed = true;
                    return Err(RuntimeError::SessionNotInitialized(
                        "shell exited during startup".to_string(),
                    ));
                }
            }
        }
        self.failed = true;
        Err(RuntimeError::SessionNotInitialized(
            "timed out waiting for prompt sync".to_string(),
        ))
    }

    /// Run a command through the full sentinel-wrap/timeout/sanitize
    /// pipeline (spec.md §4.2 "Run"), or in interactive mode if requested.
    pub async fn run(&mut self, command: &str, opts: RunOptions) -> Result<Observation> {
        if !self.started {
            return Err(RuntimeError::SessionNotInitialized(
                "session has not completed start".to_string(),
            ));
        }
        if self.failed {
            return Err(RuntimeError::SessionNotInitialized(
                "session shell has died or failed to recover".to_string(),
            ));
        }

        if opts.is_interactive_quit {
            self.send_quit().await?;
            if command.trim().is_empty() {
                return Ok(Observation::success(String::new(), None));
            }
        }

        if opts.is_interactive_command || opts.is_interactive_quit {
            return self.run_interactive(command, opts).await;
        }

        // Static syntax pre-check: reject without touching the shell.
        if let Err(reason) = syntax::check_complete(command) {
            return Err(RuntimeError::BashIncorrectSyntax {
                reason: reason.to_string(),
            });
        }

        let timeout = Duration::from_secs(
            opts.timeout_secs
                .unwrap_or(self.config.default_timeout_secs),
        );
        let observation = self.run_internal(command, timeout, true).await?;

        if opts.check.unwrap_or(CheckMode::Silent) == CheckMode::Raise {
            if let Some(code) = observation.exit_code {
                if code != 0 {
                    return Err(RuntimeError::NonZeroExitCode {
                        exit_code: code,
                        output: observation.output,
                    });
                }
            }
        }

        Ok(observation)
    }

    /// Core sentinel-wrap/read-loop/timeout-recovery implementation, shared
    /// between user-facing `run` and the internal startup-source calls.
    async fn run_internal(
        &mut self,
        command: &str,
        timeout: Duration,
        sanitize_command_echo: bool,
    ) -> Result<Observation> {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let sout = format!("SOUT:{nonce}");
        let scode_prefix = format!("SCODE:{nonce}:");

        let wrapper = format!("{command}\nEC=$?; echo {sout}; echo {scode_prefix}$EC\n");

        let ps1 = self.config.ps1.clone();
        let ps2 = self.config.ps2.clone();

        let pty = self
            .pty
            .as_mut()
            .ok_or_else(|| RuntimeError::SessionNotInitialized("session has no pty".to_string()))?;

        pty.write(wrapper.as_bytes())
            .await
            .map_err(|e| RuntimeError::SessionNotInitialized(format!("write failed: {e}")))?;

        let deadline = Instant::now() + timeout;
        let mut buf = String::new();
        let mut eof_hit = false;

        loop {
            if Instant::now() >= deadline {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            let slice = remaining.min(Duration::from_millis(300));
            match pty.read_text(8192, slice).await {
                TextReadOutcome::Text(s) => buf.push_str(&s),
                TextReadOutcome::TimedOut => {}
                TextReadOutcome::Eof => {
                    eof_hit = true;
                    break;
                }
            }
            if let Some(parsed) = try_extract(&buf, &sout, &scode_prefix, &ps1) {
                let sanitized = if sanitize_command_echo {
                    output::sanitize(&parsed.raw_output, command, &ps1, &ps2)
                } else {
                    output::sanitize(&parsed.raw_output, "", &ps1, &ps2)
                };
                return Ok(Observation::success(sanitized, Some(parsed.exit_code)));
            }
        }

        if eof_hit {
            self.failed = true;
            return Err(RuntimeError::SessionNotInitialized(
                "session bash process exited unexpectedly".to_string(),
            ));
        }

        // Timeout: attempt interrupt-and-recover.
        self.rolling = buf;
        self.timeout_recover(command, timeout).await
    }

    /// On a command timeout: SIGINT the foreground process, then look for
    /// the PS1 prompt within the recovery grace period. If found, the
    /// session remains usable; if not, escalate to termination and mark
    /// the session failed (spec.md §4.2 step 4).
    async fn timeout_recover(&mut self, command: &str, timeout: Duration) -> Result<Observation> {
        let partial = self.rolling.clone();
        let ps1 = self.config.ps1.clone();
        let recovery = Duration::from_secs(self.config.recovery_timeout_secs);

        let interrupted = {
            let pty = self
                .pty
                .as_mut()
                .ok_or_else(|| RuntimeError::SessionNotInitialized("no pty".to_string()))?;
            pty.interrupt().is_ok()
        };

        if interrupted {
            let deadline = Instant::now() + recovery;
            let mut buf = String::new();
            while Instant::now() < deadline {
                let pty = self.pty.as_mut().unwrap();
                match pty.read_text(8192, Duration::from_millis(200)).await {
                    TextReadOutcome::Text(s) => {
                        buf.push_str(&s);
                        if buf.trim_end().ends_with(ps1.as_str()) {
                            return Err(RuntimeError::CommandTimeout {
                                command: command.to_string(),
                                timeout_secs: timeout.as_secs(),
                                recovered: true,
                                partial_output: output::sanitize(&partial, command, &ps1, &self.config.ps2),
                            });
                        }
                    }
                    TextReadOutcome::TimedOut => continue,
                    TextReadOutcome::Eof => break,
                }
            }
        }

        // Recovery failed: escalate and mark the session failed.
        if let Some(pty) = self.pty.take() {
            pty.terminate().await;
        }
        self.failed = true;
        Err(RuntimeError::CommandTimeout {
            command: command.to_string(),
            timeout_secs: timeout.as_secs(),
            recovered: false,
            partial_output: output::sanitize(&partial, command, &ps1, &self.config.ps2),
        })
    }

    /// Send the quit byte (Ctrl-D by default) ahead of an interactive run.
    async fn send_quit(&mut self) -> Result<()> {
        let byte = [self.config.quit_byte];
        let pty = self
            .pty
            .as_mut()
            .ok_or_else(|| RuntimeError::SessionNotInitialized("no pty".to_string()))?;
        pty.write(&byte)
            .await
            .map_err(|e| RuntimeError::SessionNotInitialized(format!("write failed: {e}")))
    }

    /// Drive a REPL inside the session: write the command plus a newline,
    /// then read for up to the timeout and return whatever accumulated.
    /// No sentinel wrapping, no exit-code retrieval (spec.md §4.2
    /// "Interactive mode").
    async fn run_interactive(&mut self, command: &str, opts: RunOptions) -> Result<Observation> {
        let timeout = Duration::from_secs(
            opts.timeout_secs
                .unwrap_or(self.config.default_timeout_secs),
        );
        let ps1 = self.config.ps1.clone();
        let ps2 = self.config.ps2.clone();

        if !command.is_empty() {
            let pty = self
                .pty
                .as_mut()
                .ok_or_else(|| RuntimeError::SessionNotInitialized("no pty".to_string()))?;
            let line = format!("{command}\n");
            pty.write(line.as_bytes())
                .await
                .map_err(|e| RuntimeError::SessionNotInitialized(format!("write failed: {e}")))?;
        }

        let deadline = Instant::now() + timeout;
        let mut buf = String::new();
        while Instant::now() < deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let slice = remaining.min(Duration::from_millis(200));
            let pty = self
                .pty
                .as_mut()
                .ok_or_else(|| RuntimeError::SessionNotInitialized("no pty".to_string()))?;
            match pty.read_text(8192, slice).await {
                TextReadOutcome::Text(s) => buf.push_str(&s),
                TextReadOutcome::TimedOut => {}
                TextReadOutcome::Eof => {
                    self.failed = true;
                    break;
                }
            }
        }

        let sanitized = output::sanitize(&buf, command, &ps1, &ps2);
        Ok(Observation::success(sanitized, None))
    }

    /// Send `exit`, wait briefly, force-terminate if needed, close the PTY.
    pub async fn close(&mut self) {
        if let Some(pty) = self.pty.as_mut() {
            let _ = pty.write(b"exit\n").await;
        }
        if let Some(pty) = self.pty.take() {
            pty.terminate().await;
        }
        self.started = false;
    }
}

struct ExtractedResult {
    raw_output: String,
    exit_code: i32,
}

/// Scan `buf`'s tail for `SCODE:<nonce>:<N>` followed by the PS1 prompt,
/// per spec.md §4.2 step 3. Returns the raw output preceding `SOUT:<nonce>`
/// and the parsed exit code, or `None` if the sentinel hasn't fully
/// appeared yet.
fn try_extract(buf: &str, sout: &str, scode_prefix: &str, ps1: &str) -> Option<ExtractedResult> {
    let scode_pos = buf.find(scode_prefix)?;
    let after_scode = &buf[scode_pos + scode_prefix.len()..];
    let newline_pos = after_scode.find('\n')?;
    let code_str = after_scode[..newline_pos].trim();
    let rest = &after_scode[newline_pos + 1..];
    if !rest.trim_end().ends_with(ps1) {
        return None;
    }
    let exit_code: i32 = code_str.parse().ok()?;

    let sout_pos = buf.find(sout)?;
    let raw_output = buf[..sout_pos].to_string();

    Some(ExtractedResult {
        raw_output,
        exit_code,
    })
}

//! PTY I/O Loop: owns a child process attached to a pseudo-terminal and
//! provides non-blocking reads and blocking writes over it.
//!
//! This is the lowest layer of the engine. It knows nothing about bash
//! sentinels, prompts, or sessions — only bytes in and bytes out, plus
//! signal delivery to the child's process group.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Outcome of a single non-blocking read attempt.
pub enum ReadOutcome {
    /// Bytes were read (possibly fewer than requested).
    Data(Vec<u8>),
    /// No bytes arrived within the timeout window.
    TimedOut,
    /// The child closed its end of the PTY (it exited).
    Eof,
}

/// A PTY-backed child process. Owns the master-side read/write halves and
/// the child handle; nothing else may touch this PTY while it's alive.
#[derive(Debug)]
pub struct PtyChannel {
    child: tokio::process::Child,
    writer: pty_process::OwnedWritePty,
    reader: pty_process::OwnedReadPty,
    /// Bytes read but not yet consumed as valid UTF-8 (a multi-byte
    /// codepoint split across two reads). Re-prepended to the next chunk.
    partial: Vec<u8>,
}

impl PtyChannel {
    /// Spawn `argv[0]` with the remaining `argv` as arguments, attached to a
    /// freshly allocated PTY. `env` entries are applied on top of the
    /// inherited environment; `cwd` sets the initial working directory.
    pub async fn spawn(
        argv: &[String],
        env: &[(String, String)],
        cwd: Option<&str>,
        rows: u16,
        cols: u16,
    ) -> std::io::Result<Self> {
        let (pty, pts) = pty_process::open().map_err(std::io::Error::other)?;
        pty.resize(pty_process::Size::new(rows, cols))
            .map_err(std::io::Error::other)?;

        let (program, args) = argv
            .split_first()
            .ok_or_else(|| std::io::Error::other("empty argv"))?;

        let mut cmd = pty_process::Command::new(program);
        for arg in args {
            cmd = cmd.arg(arg);
        }
        for (k, v) in env {
            cmd = cmd.env(k, v);
        }
        if let Some(dir) = cwd {
            cmd = cmd.current_dir(dir);
        }

        let child = cmd.spawn(pts).map_err(std::io::Error::other)?;
        let (reader, writer) = pty.into_split();

        Ok(Self {
            child,
            writer,
            reader,
            partial: Vec::new(),
        })
    }

    /// Write bytes to the PTY master (i.e. the child's stdin). Blocking is
    /// acceptable: writes in this engine are always small (a command plus a
    /// sentinel wrapper).
    pub async fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await
    }

    /// Return whatever bytes are currently buffered, up to `max_bytes`,
    /// waiting up to `timeout` if nothing is available yet.
    pub async fn read_nonblocking(&mut self, max_bytes: usize, timeout: Duration) -> ReadOutcome {
        let mut buf = vec![0u8; max_bytes.max(1)];
        match tokio::time::timeout(timeout, self.reader.read(&mut buf)).await {
            Ok(Ok(0)) => ReadOutcome::Eof,
            Ok(Ok(n)) => {
                buf.truncate(n);
                ReadOutcome::Data(buf)
            }
            Ok(Err(_)) => ReadOutcome::Eof,
            Err(_) => ReadOutcome::TimedOut,
        }
    }

    /// Read and append to `out` as a lossy-decoded `String`, carrying any
    /// trailing partial UTF-8 sequence over to the next call so multi-byte
    /// codepoints split across reads don't get mangled.
    pub async fn read_text(&mut self, max_bytes: usize, timeout: Duration) -> TextReadOutcome {
        match self.read_nonblocking(max_bytes, timeout).await {
            ReadOutcome::Eof => TextReadOutcome::Eof,
            ReadOutcome::TimedOut => TextReadOutcome::TimedOut,
            ReadOutcome::Data(mut bytes) => {
                if !self.partial.is_empty() {
                    let mut combined = std::mem::take(&mut self.partial);
                    combined.append(&mut bytes);
                    bytes = combined;
                }
                match std::str::from_utf8(&bytes) {
                    Ok(s) => TextReadOutcome::Text(s.to_string()),
                    Err(e) => {
                        let valid_up_to = e.valid_up_to();
                        let (valid, rest) = bytes.split_at(valid_up_to);
                        // Only carry the remainder if it's short enough to be
                        // a genuinely split codepoint (UTF-8 is at most 4
                        // bytes); a longer invalid tail is just bad data.
                        let text = String::from_utf8_lossy(valid).to_string();
                        if rest.len() <= 3 {
                            self.partial = rest.to_vec();
                        }
                        TextReadOutcome::Text(text)
                    }
                }
            }
        }
    }

    /// Deliver SIGINT to the child's process group (the child is its own
    /// session/process-group leader because PTYs make the slave the
    /// controlling terminal of a new session).
    pub fn interrupt(&self) -> std::io::Result<()> {
        self.signal(nix::sys::signal::Signal::SIGINT)
    }

    /// Deliver an arbitrary signal to the child's process group.
    pub fn signal(&self, sig: nix::sys::signal::Signal) -> std::io::Result<()> {
        let Some(pid) = self.child.id() else {
            return Ok(()); // already reaped
        };
        nix::sys::signal::kill(nix::unistd::Pid::from_raw(-(pid as i32)), sig)
            .or_else(|_| nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), sig))
            .map_err(std::io::Error::other)
    }

    /// Best-effort graceful shutdown: SIGTERM, wait briefly, then SIGKILL,
    /// then drop both PTY halves.
    pub async fn terminate(mut self) {
        let _ = self.signal(nix::sys::signal::Signal::SIGTERM);
        if tokio::time::timeout(Duration::from_millis(500), self.child.wait())
            .await
            .is_err()
        {
            let _ = self.signal(nix::sys::signal::Signal::SIGKILL);
            let _ = tokio::time::timeout(Duration::from_millis(500), self.child.wait()).await;
        }
        drop(self.writer);
        drop(self.reader);
    }

    /// Non-blocking liveness check.
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    pub async fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        self.child.wait().await
    }
}

/// Outcome of [`PtyChannel::read_text`].
pub enum TextReadOutcome {
    Text(String),
    TimedOut,
    Eof,
}

//! Runtime Facade (spec.md §4.4): the stateless dispatcher the HTTP
//! control surface talks to. It owns the Session Registry and routes
//! every operation to the registry, the one-shot executor, or the
//! filesystem.

use crate::error::{Result, RuntimeError};
use crate::executor::{self, CommandSpec, OneShotRequest, OneShotResponse};
use crate::registry::SessionRegistry;
use crate::session::{Observation, RunOptions, SessionConfig};
use std::path::Path;

/// Request shape for `create_session` (spec.md §3 "Session" fields).
#[derive(Debug, Clone, Default)]
pub struct CreateSessionRequest {
    pub name: String,
    pub startup_sources: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<String>,
    pub default_timeout_secs: Option<u64>,
}

/// The stateless glue described by spec.md §4.4's operation table.
pub struct RuntimeFacade {
    registry: SessionRegistry,
}

impl Default for RuntimeFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeFacade {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: SessionRegistry::new(),
        }
    }

    /// The process being reachable to answer this call is itself the proof.
    pub fn is_alive(&self) -> bool {
        true
    }

    pub async fn create_session(&self, req: CreateSessionRequest) -> Result<()> {
        let mut config = SessionConfig {
            startup_sources: req.startup_sources,
            env: req.env,
            cwd: req.cwd,
            ..SessionConfig::default()
        };
        if let Some(secs) = req.default_timeout_secs {
            config.default_timeout_secs = secs;
        }
        self.registry.create(&req.name, config).await?;
        Ok(())
    }

    pub async fn run_in_session(
        &self,
        session: &str,
        command: &str,
        opts: RunOptions,
    ) -> Result<Observation> {
        let shared = self.registry.get(session).await?;
        let mut guard = shared.lock().await;
        guard.run(command, opts).await
    }

    pub async fn close_session(&self, session: &str) -> Result<()> {
        self.registry.remove(session).await
    }

    pub async fn list_sessions(&self) -> Vec<String> {
        self.registry.list().await
    }

    pub async fn execute(&self, spec: CommandSpec, req: OneShotRequest) -> OneShotResponse {
        executor::execute(spec, req).await
    }

    pub async fn read_file(&self, path: &str) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RuntimeError::FileOp(format!("read '{path}': {e}")))
    }

    /// Writes `content`, creating missing parent directories (mode 0755).
    pub async fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all_0755(parent)
                    .await
                    .map_err(|e| RuntimeError::FileOp(format!("mkdir '{}': {e}", parent.display())))?;
            }
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|e| RuntimeError::FileOp(format!("write '{path}': {e}")))
    }

    /// Writes an uploaded file to `target_path`, or — if `extract_tar` is
    /// set — decompresses and unpacks it into `target_path` as a
    /// directory tree.
    pub async fn upload(&self, target_path: &str, bytes: Vec<u8>, extract_tar: bool) -> Result<()> {
        if !extract_tar {
            return self.write_file(target_path, &bytes).await;
        }

        create_dir_all_0755(Path::new(target_path))
            .await
            .map_err(|e| RuntimeError::FileOp(format!("mkdir '{target_path}': {e}")))?;

        let target = target_path.to_string();
        tokio::task::spawn_blocking(move || extract_tar_gz(&bytes, Path::new(&target)))
            .await
            .map_err(|e| RuntimeError::FileOp(format!("extraction task panicked: {e}")))?
    }

    pub async fn close(&self) {
        self.registry.close_all().await;
    }
}

async fn create_dir_all_0755(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755)).await?;
    }
    Ok(())
}

fn extract_tar_gz(bytes: &[u8], dest_dir: &Path) -> Result<()> {
    let gz = flate2::read::GzDecoder::new(bytes);
    let mut archive = tar::Archive::new(gz);
    archive
        .unpack(dest_dir)
        .map_err(|e| RuntimeError::FileOp(format!("tar unpack into '{}': {e}", dest_dir.display())))
}

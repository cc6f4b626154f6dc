//! Session Registry (spec.md §4.3): a name-keyed map of live
//! [`BashSession`]s shared across every HTTP request.
//!
//! Locking discipline matters here. The registry mutex protects only map
//! membership (insert/remove/lookup-and-clone-the-Arc); it is always
//! released before a caller acquires a session's own mutex, which is held
//! for the full duration of a command. Holding the registry lock across a
//! command would serialize every session in the runtime behind whichever
//! one is slowest — a convoy.

use crate::error::{Result, RuntimeError};
use crate::session::{BashSession, SessionConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A session, reference-counted so the registry lock can be released while
/// a caller still holds a handle to run commands against it.
pub type SharedSession = Arc<Mutex<BashSession>>;

/// The live set of named sessions for one runtime instance.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Create and start a new session under `name`. Fails with
    /// `SessionExistsError` if the name is already taken; the check and the
    /// insert happen under one registry-lock acquisition so two concurrent
    /// creates under the same name can't both succeed.
    pub async fn create(&self, name: &str, config: SessionConfig) -> Result<SharedSession> {
        {
            let sessions = self.sessions.lock().await;
            if sessions.contains_key(name) {
                return Err(RuntimeError::SessionExists(name.to_string()));
            }
        }

        let mut session = BashSession::new(config);
        session.start().await?;
        let shared: SharedSession = Arc::new(Mutex::new(session));

        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(name) {
            // Lost a race with a concurrent create of the same name; the
            // session we just started is simply dropped (closed on drop
            // would be nicer but BashSession's close is async, so the
            // loser's PTY is reaped by the OS instead).
            return Err(RuntimeError::SessionExists(name.to_string()));
        }
        sessions.insert(name.to_string(), Arc::clone(&shared));
        Ok(shared)
    }

    /// Look up a session by name without holding the registry lock across
    /// the caller's subsequent use of it.
    pub async fn get(&self, name: &str) -> Result<SharedSession> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::SessionDoesNotExist(name.to_string()))
    }

    /// Remove a session from the map and close it. Closing happens after
    /// the registry lock is released, so a slow shutdown never blocks
    /// lookups of other sessions.
    pub async fn remove(&self, name: &str) -> Result<()> {
        let removed = {
            let mut sessions = self.sessions.lock().await;
            sessions.remove(name)
        };
        let Some(shared) = removed else {
            return Err(RuntimeError::SessionDoesNotExist(name.to_string()));
        };
        shared.lock().await.close().await;
        Ok(())
    }

    /// Names of all currently registered sessions.
    pub async fn list(&self) -> Vec<String> {
        self.sessions.lock().await.keys().cloned().collect()
    }

    /// Close every session and empty the map, for graceful shutdown.
    pub async fn close_all(&self) {
        let drained: Vec<SharedSession> = {
            let mut sessions = self.sessions.lock().await;
            sessions.drain().map(|(_, v)| v).collect()
        };
        for shared in drained {
            shared.lock().await.close().await;
        }
    }
}

//! Per-number session storage.
//!
//! One directory per canonical phone number, created on demand, holding the
//! bridge's credential files. The directory is the only state that outlives
//! the request handler; it exists from bootstrap until cleanup or process
//! restart.

use crate::error::GatewayError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Filename of the self-describing credential snapshot inside a session
/// directory. Written on every credentials-updated event so the post-auth
/// delivery can read a complete file.
pub const CREDS_FILE: &str = "creds.json";

/// Creates and destroys per-number session directories.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Idempotently ensure a session directory exists for `number`.
    ///
    /// Concurrent requests for the same number share the directory; that
    /// race is accepted, the last writer's client wins.
    pub async fn prepare(&self, number: &str) -> Result<SessionHandle, GatewayError> {
        let dir = self.root.join(number);
        fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "Session directory ready");
        Ok(SessionHandle { dir })
    }
}

/// Handle to one session's directory.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    dir: PathBuf,
}

impl SessionHandle {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn creds_path(&self) -> PathBuf {
        self.dir.join(CREDS_FILE)
    }

    /// Read the persisted credential snapshot, if there is one. Unreadable
    /// or unparseable files count as absent.
    pub async fn load_creds(&self) -> Option<Value> {
        let bytes = fs::read(self.creds_path()).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(creds) => Some(creds),
            Err(e) => {
                warn!(dir = %self.dir.display(), "Unparseable credential file: {}", e);
                None
            }
        }
    }

    /// Read the raw credential file for delivery to the paired account.
    pub async fn read_creds_bytes(&self) -> Option<Vec<u8>> {
        fs::read(self.creds_path()).await.ok()
    }

    /// Persist a credential snapshot. Completes before returning so a
    /// subsequent open event always sees the latest file.
    pub async fn save_creds(&self, creds: &Value) -> Result<(), GatewayError> {
        let bytes = serde_json::to_vec_pretty(creds)
            .map_err(|e| GatewayError::Storage(e.to_string()))?;
        fs::write(self.creds_path(), bytes).await?;
        debug!(dir = %self.dir.display(), "Credential snapshot persisted");
        Ok(())
    }

    /// Best-effort recursive removal. Failures are logged, never
    /// propagated; removing an already-removed directory is a no-op.
    pub async fn destroy(&self) {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => debug!(dir = %self.dir.display(), "Session directory removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(dir = %self.dir.display(), "Session cleanup failed: {}", e),
        }
    }
}

/// Whether a persisted snapshot marks the number as already paired.
pub fn is_registered(creds: &Value) -> bool {
    creds["registered"].as_bool().unwrap_or(false) || !creds["me"].is_null()
}

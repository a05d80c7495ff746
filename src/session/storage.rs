//! Persisted session state: bearer token plus last-known identity.
//!
//! The two entries live and die together — the record type makes a
//! partially cleared state unrepresentable. The session authority is
//! the only writer; everything else reads through it.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::session::models::Identity;

/// What survives a restart: the token and the identity snapshot it was
/// last verified against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub token: String,
    pub identity: Identity,
}

/// Durable client-side session storage.
pub trait SessionStore: Send + Sync {
    /// `None` when nothing is stored or the record is unreadable.
    fn load(&self) -> Option<PersistedSession>;

    fn save(&self, session: &PersistedSession) -> Result<()>;

    /// Remove both entries. Idempotent.
    fn clear(&self) -> Result<()>;
}

/// In-process store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Option<PersistedSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Option<PersistedSession> {
        self.inner.lock().clone()
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        *self.inner.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.inner.lock() = None;
        Ok(())
    }
}

/// JSON file store. Writes go to a temp file first and are renamed into
/// place, so a crash mid-write never leaves a half-written record.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(".tmp");
        path.into()
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Option<PersistedSession> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read session file {:?}: {}", self.path, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Discarding unreadable session file {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        let raw = serde_json::to_vec_pretty(session).context("Failed to serialize session")?;

        let temp = self.temp_path();
        let mut file = fs::File::create(&temp)
            .with_context(|| format!("Failed to create {:?}", temp))?;
        file.write_all(&raw)
            .with_context(|| format!("Failed to write {:?}", temp))?;
        file.sync_all().ok();

        fs::rename(&temp, &self.path)
            .with_context(|| format!("Failed to move session file into place at {:?}", self.path))
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to clear session file {:?}", self.path)),
        }
    }
}

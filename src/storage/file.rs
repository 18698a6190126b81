//! File-based session storage for Quarry.
//!
//! The live session is stored as JSON in `<vault>/.quarry/session.json`.
//! Writes are atomic via temp file + rename.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::session_path;
use crate::core::AtomisationSession;
use crate::error::{QuarryError, Result};
use crate::storage::SessionStore;
use crate::util::{read_to_string_with_limit, write_atomic, MAX_NOTE_SIZE};

/// File-based session storage.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store for the vault rooted at `vault_root`.
    pub fn for_vault(vault_root: &Path) -> Self {
        Self::with_path(session_path(vault_root))
    }

    /// Store at an explicit file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The session file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<AtomisationSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = read_to_string_with_limit(&self.path, MAX_NOTE_SIZE)?;
        let session = serde_json::from_str(&content).map_err(|e| {
            QuarryError::serde(format!("corrupt session file {}: {}", self.path.display(), e))
        })?;
        Ok(Some(session))
    }

    fn save(&self, session: &AtomisationSession) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        write_atomic(&self.path, json.as_bytes())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(QuarryError::storage(&self.path, e)),
        }
    }
}

//! In-memory vault for Quarry.
//!
//! Useful for testing and for dry runs. Not persistent.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::RwLock;

use crate::error::{QuarryError, Result};
use crate::vault::Vault;

/// Vault held in memory.
#[derive(Debug, Default)]
pub struct MemoryVault {
    notes: RwLock<BTreeMap<String, String>>,
    folders: RwLock<BTreeSet<String>>,
}

impl MemoryVault {
    /// Create an empty vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a vault seeded with `(path, content)` pairs.
    pub fn with_notes<I, P, C>(notes: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        let vault = Self::new();
        if let Ok(mut map) = vault.notes.write() {
            for (path, content) in notes {
                map.insert(path.into(), content.into());
            }
        }
        vault
    }

    /// Number of notes stored.
    pub fn len(&self) -> usize {
        self.notes.read().map(|n| n.len()).unwrap_or(0)
    }

    /// Check if the vault holds no notes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_error(path: &str) -> QuarryError {
        QuarryError::storage(path, io::Error::other("vault lock poisoned"))
    }

    fn not_found(path: &str) -> QuarryError {
        QuarryError::storage(
            path,
            io::Error::new(io::ErrorKind::NotFound, "note does not exist"),
        )
    }
}

impl Vault for MemoryVault {
    fn read(&self, path: &str) -> Result<String> {
        let notes = self.notes.read().map_err(|_| Self::lock_error(path))?;
        notes.get(path).cloned().ok_or_else(|| Self::not_found(path))
    }

    fn create(&self, path: &str, content: &str) -> Result<String> {
        let mut notes = self.notes.write().map_err(|_| Self::lock_error(path))?;
        if notes.contains_key(path) {
            return Err(QuarryError::storage(
                path,
                io::Error::new(io::ErrorKind::AlreadyExists, "note already exists"),
            ));
        }
        notes.insert(path.to_string(), content.to_string());
        Ok(path.to_string())
    }

    fn modify(&self, path: &str, content: &str) -> Result<()> {
        let mut notes = self.notes.write().map_err(|_| Self::lock_error(path))?;
        match notes.get_mut(path) {
            Some(existing) => {
                *existing = content.to_string();
                Ok(())
            }
            None => Err(Self::not_found(path)),
        }
    }

    fn exists(&self, path: &str) -> bool {
        let in_notes = self
            .notes
            .read()
            .map(|n| n.contains_key(path))
            .unwrap_or(false);
        in_notes
            || self
                .folders
                .read()
                .map(|f| f.contains(path.trim_matches('/')))
                .unwrap_or(false)
    }

    fn create_folder(&self, path: &str) -> Result<()> {
        let mut folders = self.folders.write().map_err(|_| Self::lock_error(path))?;
        folders.insert(path.trim_matches('/').to_string());
        Ok(())
    }

    fn list_markdown(&self) -> Result<Vec<String>> {
        let notes = self.notes.read().map_err(|_| Self::lock_error(""))?;
        Ok(notes
            .keys()
            .filter(|p| p.ends_with(".md"))
            .filter(|p| !p.split('/').any(|segment| segment.starts_with('.')))
            .cloned()
            .collect())
    }
}

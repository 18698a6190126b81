//! Filesystem vault for Quarry.
//!
//! Notes live under a root directory. Modifications are atomic via temp
//! file + rename; creation uses `create_new` so an existing note is never
//! overwritten.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::{QuarryError, Result};
use crate::util::{read_to_string_with_limit, write_atomic, MAX_NOTE_SIZE};
use crate::vault::Vault;

/// Vault backed by a directory.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Open a vault rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The vault root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a vault path to a filesystem path.
    ///
    /// Rejects absolute paths and `..` components.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(QuarryError::storage(
                relative,
                io::Error::new(io::ErrorKind::InvalidInput, "path is outside the vault"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl Vault for FsVault {
    fn read(&self, path: &str) -> Result<String> {
        let full = self.resolve(path)?;
        read_to_string_with_limit(&full, MAX_NOTE_SIZE)
    }

    fn create(&self, path: &str, content: &str) -> Result<String> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| QuarryError::storage(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .map_err(|e| QuarryError::storage(&full, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| QuarryError::storage(&full, e))?;

        tracing::debug!(path, "created note");
        Ok(path.to_string())
    }

    fn modify(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(QuarryError::storage(
                &full,
                io::Error::new(io::ErrorKind::NotFound, "note does not exist"),
            ));
        }
        write_atomic(&full, content.as_bytes())
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn create_folder(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full).map_err(|e| QuarryError::storage(&full, e))
    }

    fn list_markdown(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        collect_md_files(&self.root, &mut files).map_err(|e| QuarryError::storage(&self.root, e))?;

        let mut notes: Vec<String> = files
            .iter()
            .filter_map(|p| p.strip_prefix(&self.root).ok())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        notes.sort();
        Ok(notes)
    }
}

fn collect_md_files(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            collect_md_files(&path, out)?;
        } else if path.extension().and_then(|s| s.to_str()) == Some("md") {
            out.push(path);
        }
    }
    Ok(())
}

//! Storage collaborator trait for Quarry.
//!
//! A vault is a tree of Markdown notes addressed by vault-relative paths
//! using `/` as the separator (e.g. `Quarry/Reading notes.md`).

use std::sync::Arc;

use crate::error::Result;

/// Trait for note storage.
///
/// Implementations must be thread-safe.
pub trait Vault: Send + Sync {
    /// Read a note's full text.
    fn read(&self, path: &str) -> Result<String>;

    /// Create a new note and return its path.
    ///
    /// Fails if `path` already exists; callers check [`Vault::exists`] first
    /// and pick another name.
    fn create(&self, path: &str, content: &str) -> Result<String>;

    /// Replace the text of an existing note.
    fn modify(&self, path: &str, content: &str) -> Result<()>;

    /// Check if a note or folder exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Create a folder. Succeeds if it already exists.
    fn create_folder(&self, path: &str) -> Result<()>;

    /// All Markdown notes in the vault, sorted, skipping hidden entries.
    fn list_markdown(&self) -> Result<Vec<String>>;
}

/// Blanket implementation of Vault for Arc-wrapped vaults.
impl<T: Vault + ?Sized> Vault for Arc<T> {
    fn read(&self, path: &str) -> Result<String> {
        (**self).read(path)
    }

    fn create(&self, path: &str, content: &str) -> Result<String> {
        (**self).create(path, content)
    }

    fn modify(&self, path: &str, content: &str) -> Result<()> {
        (**self).modify(path, content)
    }

    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }

    fn create_folder(&self, path: &str) -> Result<()> {
        (**self).create_folder(path)
    }

    fn list_markdown(&self) -> Result<Vec<String>> {
        (**self).list_markdown()
    }
}

/// Join a folder and a file name into a vault path.
///
/// An empty folder yields the bare name.
pub fn join_path(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

/// Test utilities for Vault implementations.
#[cfg(test)]
pub mod tests {
    use super::*;

    /// Exercise the contract every vault must honour.
    pub fn test_vault_contract<V: Vault>(vault: &V) {
        assert!(!vault.exists("Atoms/First.md"));

        vault.create_folder("Atoms").unwrap();
        vault.create_folder("Atoms").unwrap();
        assert!(vault.exists("Atoms"));

        let path = vault.create("Atoms/First.md", "# First\n").unwrap();
        assert_eq!(path, "Atoms/First.md");
        assert!(vault.exists("Atoms/First.md"));
        assert_eq!(vault.read("Atoms/First.md").unwrap(), "# First\n");

        // Creating over an existing note fails and leaves it untouched
        assert!(vault.create("Atoms/First.md", "clobbered").is_err());
        assert_eq!(vault.read("Atoms/First.md").unwrap(), "# First\n");

        vault.modify("Atoms/First.md", "# First\n\nEdited.\n").unwrap();
        assert_eq!(vault.read("Atoms/First.md").unwrap(), "# First\n\nEdited.\n");

        vault.create("Quarry/Long note.md", "text").unwrap();
        vault.create("Quarry/.hidden.md", "hidden").unwrap();
        vault.create("Quarry/image.png", "binary").unwrap();
        assert_eq!(
            vault.list_markdown().unwrap(),
            vec!["Atoms/First.md".to_string(), "Quarry/Long note.md".to_string()]
        );

        assert!(vault.read("Missing.md").is_err());
        assert!(vault.modify("Missing.md", "x").is_err());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("Atoms", "A.md"), "Atoms/A.md");
        assert_eq!(join_path("Atoms/", "A.md"), "Atoms/A.md");
        assert_eq!(join_path("", "A.md"), "A.md");
        assert_eq!(join_path("/", "A.md"), "A.md");
    }
}

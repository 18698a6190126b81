//! Create command for Quarry.
//!
//! Writes the approved atoms, marks the source note as atomised and moves
//! the session to the complete phase.

use serde::Serialize;

use crate::atoms::{materialise_atoms, CreatedAtom};
use crate::cli::{exit_code_for, render, CommandOptions};
use crate::config::Config;
use crate::core::Phase;
use crate::discovery::mark_atomised;
use crate::error::{exit_codes, FailOpen, QuarryError, Result};
use crate::storage::SessionStore;
use crate::vault::Vault;

/// Output format for the create command.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOutput {
    /// Whether every approved atom was written.
    pub success: bool,
    /// Atoms written by this run.
    pub created: Vec<CreatedAtom>,
    /// Paths written before a failure stopped the batch.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partial: Vec<String>,
    /// Whether the source note's migration status was rewritten.
    pub source_updated: bool,
    /// Error message if the command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub exit_code: i32,
}

impl CreateOutput {
    /// Create a successful output.
    pub fn success(created: Vec<CreatedAtom>, source_updated: bool) -> Self {
        Self {
            success: true,
            created,
            partial: Vec::new(),
            source_updated,
            error: None,
            exit_code: exit_codes::OK,
        }
    }

    /// Create a failed output. Partial batches keep their created paths.
    pub fn failure(err: &QuarryError) -> Self {
        let partial = match err {
            QuarryError::Materialise { created, .. } => created.clone(),
            _ => Vec::new(),
        };
        Self {
            success: false,
            created: Vec::new(),
            partial,
            source_updated: false,
            error: Some(err.to_string()),
            exit_code: exit_code_for(err),
        }
    }

    /// Format output based on options.
    pub fn format(&self, options: &CommandOptions) -> String {
        render(self, options, Self::format_human_readable)
    }

    fn format_human_readable(&self) -> String {
        if !self.success {
            let mut out = format!(
                "Create failed: {}\n",
                self.error.as_deref().unwrap_or("unknown error")
            );
            if !self.partial.is_empty() {
                out.push_str("Already written:\n");
                for path in &self.partial {
                    out.push_str(&format!("  {}\n", path));
                }
            }
            return out;
        }

        let mut out = match self.created.len() {
            0 => "No approved candidates; nothing written.\n".to_string(),
            1 => "Created 1 atom:\n".to_string(),
            n => format!("Created {} atoms:\n", n),
        };
        for atom in &self.created {
            out.push_str(&format!("  {}\n", atom.path));
        }
        if self.source_updated {
            out.push_str("Source note marked as atomised.\n");
        }
        out
    }
}

/// The create command implementation.
pub struct CreateCommand<S: SessionStore, V: Vault> {
    store: S,
    vault: V,
    config: Config,
}

impl<S: SessionStore, V: Vault> CreateCommand<S, V> {
    /// Create a new create command.
    pub fn new(store: S, vault: V, config: Config) -> Self {
        Self {
            store,
            vault,
            config,
        }
    }

    /// Materialise the approved atoms and finish the session.
    pub fn run(&self) -> CreateOutput {
        self.create().unwrap_or_else(|err| CreateOutput::failure(&err))
    }

    fn create(&self) -> Result<CreateOutput> {
        let mut atomiser = self.store.load_atomiser()?;
        let created = match materialise_atoms(&mut atomiser, &self.vault, &self.config.atoms) {
            Ok(created) => created,
            Err(err @ QuarryError::Materialise { .. }) => {
                // Keep the withdrawn approvals so a rerun skips written atoms.
                self.store.persist(&atomiser)?;
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let source_path = atomiser.session_mut()?.source.path.clone();
        let source_updated = mark_atomised(&self.vault, &source_path, &self.config.discovery)
            .fail_open_default("marking source note as atomised");

        atomiser.set_phase(Phase::Complete)?;
        self.store.persist(&atomiser)?;

        Ok(CreateOutput::success(created, source_updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Atomiser, CandidatePatch, SourceNote};
    use crate::storage::MemorySessionStore;
    use crate::vault::MemoryVault;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const SOURCE: &str = "---\nmigration: quarry\n---\n# Memory\n\nLong note.\n";

    fn setup(approved: &[bool]) -> (Arc<MemorySessionStore>, Arc<MemoryVault>) {
        let vault = Arc::new(MemoryVault::with_notes([("Quarry/Memory.md", SOURCE)]));
        let store = Arc::new(MemorySessionStore::new());

        let mut atomiser = Atomiser::new();
        atomiser.start_session(SourceNote::new("Quarry/Memory.md", "Memory", SOURCE));
        for (i, approve) in approved.iter().enumerate() {
            let candidate = atomiser.add_candidate(format!("concept number {}", i)).unwrap();
            let patch = CandidatePatch::new()
                .explanation("An explanation long enough to pass the length gate.")
                .approved(*approve);
            atomiser.update_candidate(&candidate.id, &patch).unwrap();
        }
        store.persist(&atomiser).unwrap();
        (store, vault)
    }

    #[test]
    fn test_create_writes_atoms_and_finishes() {
        let (store, vault) = setup(&[true, false, true]);

        let output =
            CreateCommand::new(Arc::clone(&store), Arc::clone(&vault), Config::default()).run();

        assert!(output.success);
        assert_eq!(output.created.len(), 2);
        assert!(output.source_updated);
        assert!(vault.exists("Atoms/Concept number 0.md"));
        assert!(vault.exists("Atoms/Concept number 2.md"));
        assert!(!vault.exists("Atoms/Concept number 1.md"));
        assert!(vault
            .read("Quarry/Memory.md")
            .unwrap()
            .contains("migration: atomised"));

        let session = store.load().unwrap().unwrap();
        assert!(session.completed);
        assert_eq!(session.phase, Phase::Complete);
    }

    #[test]
    fn test_create_with_no_approved() {
        let (store, vault) = setup(&[false]);

        let output =
            CreateCommand::new(Arc::clone(&store), Arc::clone(&vault), Config::default()).run();

        assert!(output.success);
        assert!(output.created.is_empty());
        assert!(output
            .format(&CommandOptions::default())
            .contains("nothing written"));
        assert!(store.load().unwrap().unwrap().completed);
    }

    #[test]
    fn test_create_missing_source_still_succeeds() {
        let (store, _) = setup(&[true]);
        let vault = Arc::new(MemoryVault::new());

        let output = CreateCommand::new(Arc::clone(&store), Arc::clone(&vault), Config::default())
            .run();

        assert!(output.success);
        assert!(!output.source_updated);
        assert_eq!(output.created.len(), 1);
    }

    #[test]
    fn test_create_without_session() {
        let output = CreateCommand::new(
            Arc::new(MemorySessionStore::new()),
            Arc::new(MemoryVault::new()),
            Config::default(),
        )
        .run();

        assert!(!output.success);
        assert_eq!(output.exit_code, exit_codes::NO_SESSION);
    }

    #[test]
    fn test_partial_failure_reports_written_paths() {
        let err = QuarryError::materialise(
            vec!["Atoms/A.md".to_string()],
            QuarryError::provider("disk full"),
        );
        let output = CreateOutput::failure(&err);

        assert_eq!(output.partial, vec!["Atoms/A.md"]);
        let text = output.format(&CommandOptions::default());
        assert!(text.contains("Already written:\n  Atoms/A.md"));
    }

    /// Vault that refuses to create one note while `broken` is set.
    struct BrokenNoteVault {
        inner: MemoryVault,
        refuse: &'static str,
        broken: AtomicBool,
    }

    impl Vault for BrokenNoteVault {
        fn read(&self, path: &str) -> Result<String> {
            self.inner.read(path)
        }
        fn create(&self, path: &str, content: &str) -> Result<String> {
            if self.broken.load(Ordering::SeqCst) && path == self.refuse {
                return Err(QuarryError::storage(path, std::io::Error::other("disk full")));
            }
            self.inner.create(path, content)
        }
        fn modify(&self, path: &str, content: &str) -> Result<()> {
            self.inner.modify(path, content)
        }
        fn exists(&self, path: &str) -> bool {
            self.inner.exists(path)
        }
        fn create_folder(&self, path: &str) -> Result<()> {
            self.inner.create_folder(path)
        }
        fn list_markdown(&self) -> Result<Vec<String>> {
            self.inner.list_markdown()
        }
    }

    #[test]
    fn test_rerun_after_partial_failure_does_not_duplicate() {
        let (store, _) = setup(&[true, true]);
        let vault = Arc::new(BrokenNoteVault {
            inner: MemoryVault::with_notes([("Quarry/Memory.md", SOURCE)]),
            refuse: "Atoms/Concept number 1.md",
            broken: AtomicBool::new(true),
        });

        let output =
            CreateCommand::new(Arc::clone(&store), Arc::clone(&vault), Config::default()).run();
        assert!(!output.success);
        assert_eq!(output.partial, vec!["Atoms/Concept number 0.md"]);

        let session = store.load().unwrap().unwrap();
        assert!(!session.completed);
        assert_eq!(session.approved_candidates().len(), 1);
        assert_eq!(session.approved_candidates()[0].concept, "concept number 1");

        vault.broken.store(false, Ordering::SeqCst);
        let output =
            CreateCommand::new(Arc::clone(&store), Arc::clone(&vault), Config::default()).run();

        assert!(output.success);
        assert_eq!(output.created.len(), 1);
        assert_eq!(output.created[0].path, "Atoms/Concept number 1.md");
        assert_eq!(vault.inner.list_markdown().unwrap().len(), 3);
        assert!(store.load().unwrap().unwrap().completed);
    }
}

//! Quarry - guided atomisation of long-form notes
//!
//! Quarry walks a user through breaking one long "quarry" note into atomic
//! notes: identify the concepts, explain each in their own words, review a
//! critique, refine, approve, and write the approved atoms into the vault.
//! Explanations are checked by a rule-based validator; critiques can come
//! from a text-generation provider with a rule-based fallback.

pub mod atoms;
pub mod cli;
pub mod config;
pub mod core;
pub mod discovery;
pub mod error;
pub mod providers;
pub mod storage;
pub mod util;
pub mod vault;

pub use atoms::{materialise_atoms, CreatedAtom};
pub use config::Config;
pub use core::{
    validate_explanation, AtomCandidate, AtomisationSession, Atomiser, CandidatePatch, Critique,
    Phase, SourceNote, ValidationResult,
};
pub use discovery::{mark_atomised, NoteDiscovery};
pub use error::{QuarryError, Result};
pub use providers::{create_provider, TextGenerator};
pub use storage::{FileSessionStore, SessionStore};
pub use vault::{FsVault, Vault};

// CLI commands
pub use cli::{
    AddCommand, AdvanceCommand, CreateCommand, CritiqueCommand, EndCommand, PhaseCommand,
    PickCommand, QuarriesCommand, RemoveCommand, StartCommand, StatusCommand, UpdateCommand,
    ValidateCommand,
};

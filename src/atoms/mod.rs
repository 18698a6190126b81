//! Atom materialisation for Quarry.
//!
//! Turns approved candidates into Markdown notes in the vault.

pub mod format;
pub mod materialise;

pub use format::{apply_template, build_default_content, sanitize_title};
pub use materialise::{materialise_atoms, materialise_atoms_at, unique_path, CreatedAtom};

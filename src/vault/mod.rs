//! Note storage for Quarry.
//!
//! The [`Vault`] trait is the storage collaborator the materialiser and
//! discovery depend on. [`FsVault`] works against a directory of Markdown
//! files; [`MemoryVault`] keeps everything in memory.

pub mod fs;
pub mod markdown;
pub mod memory;
pub mod traits;

pub use fs::FsVault;
pub use markdown::{frontmatter_string, inline_field, note_title, rewrite_field, split_frontmatter};
pub use memory::MemoryVault;
pub use traits::{join_path, Vault};

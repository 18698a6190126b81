//! Quarry note discovery.
//!
//! Finds notes whose migration field marks them as quarries, picks one at
//! random, and rewrites the marker once a note has been atomised.

pub mod index;

pub use index::{FrontmatterScanIndex, InlineFieldIndex, MetadataIndex, NoteQuery};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::DiscoveryConfig;
use crate::error::Result;
use crate::vault::{rewrite_field, Vault};

/// Discovery over a vault using a metadata index with a scan fallback.
pub struct NoteDiscovery {
    index: Box<dyn MetadataIndex>,
    config: DiscoveryConfig,
}

impl NoteDiscovery {
    /// Build discovery from configuration.
    ///
    /// Uses [`InlineFieldIndex`] when inline fields are enabled, otherwise
    /// the frontmatter scan.
    pub fn new(config: DiscoveryConfig) -> Self {
        let index: Box<dyn MetadataIndex> = if config.use_inline_fields {
            Box::new(InlineFieldIndex)
        } else {
            Box::new(FrontmatterScanIndex)
        };
        Self { index, config }
    }

    /// Build discovery with an explicit index.
    pub fn with_index(config: DiscoveryConfig, index: Box<dyn MetadataIndex>) -> Self {
        Self { index, config }
    }

    /// The query for quarry notes.
    pub fn query(&self) -> NoteQuery {
        NoteQuery::new(
            self.config.quarry_folders.clone(),
            &self.config.migration_field,
            &self.config.quarry_status,
        )
    }

    /// All quarry notes, sorted.
    ///
    /// Falls back to a frontmatter scan when the index is unavailable or
    /// fails.
    pub fn find_quarry_notes(&self, vault: &dyn Vault) -> Result<Vec<String>> {
        let query = self.query();
        if self.index.is_available() {
            match self.index.find(vault, &query) {
                Ok(found) => return Ok(found),
                Err(err) => tracing::warn!(
                    index = self.index.name(),
                    error = %err,
                    "metadata index failed, falling back to frontmatter scan"
                ),
            }
        } else {
            tracing::debug!(index = self.index.name(), "metadata index unavailable");
        }
        FrontmatterScanIndex.find(vault, &query)
    }

    /// Pick a quarry note uniformly at random. `None` when there are none.
    pub fn pick_random(&self, vault: &dyn Vault) -> Result<Option<String>> {
        self.pick_random_with(vault, &mut rand::thread_rng())
    }

    /// [`NoteDiscovery::pick_random`] with a caller-supplied RNG.
    pub fn pick_random_with<R: Rng + ?Sized>(
        &self,
        vault: &dyn Vault,
        rng: &mut R,
    ) -> Result<Option<String>> {
        let notes = self.find_quarry_notes(vault)?;
        Ok(notes.choose(rng).cloned())
    }
}

/// Rewrite a note's quarry marker to the atomised status.
///
/// Returns whether the note changed. Only markers reading the quarry status
/// are rewritten; a note without one is left as it is.
pub fn mark_atomised(vault: &dyn Vault, path: &str, config: &DiscoveryConfig) -> Result<bool> {
    let text = vault.read(path)?;
    match rewrite_field(
        &text,
        &config.migration_field,
        &config.quarry_status,
        &config.atomised_status,
    ) {
        Some(updated) => {
            vault.modify(path, &updated)?;
            tracing::debug!(path, status = %config.atomised_status, "migration status updated");
            Ok(true)
        }
        None => Ok(false),
    }
}

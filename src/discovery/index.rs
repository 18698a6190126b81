//! Metadata index trait and implementations.
//!
//! An index answers one question: which notes under these folders have
//! `field` set to `value`? Two implementations are provided:
//! - [`FrontmatterScanIndex`]: reads every candidate note and inspects only
//!   its frontmatter (the fallback)
//! - [`InlineFieldIndex`]: also honours inline `field:: value` lines, the
//!   way structured-query plugins see a note

use crate::error::{FailOpen, Result};
use crate::vault::{frontmatter_string, inline_field, split_frontmatter, Vault};

/// A metadata query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteQuery {
    /// Folder prefixes to search. Empty means the whole vault.
    pub folders: Vec<String>,
    /// Metadata field to match.
    pub field: String,
    /// Required value of the field.
    pub value: String,
}

impl NoteQuery {
    /// Create a query.
    pub fn new(folders: Vec<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            folders,
            field: field.into(),
            value: value.into(),
        }
    }

    /// Check if `path` lies under one of the query's folders.
    pub fn in_scope(&self, path: &str) -> bool {
        if self.folders.is_empty() {
            return true;
        }
        self.folders.iter().any(|folder| {
            let folder = folder.trim_matches('/');
            folder.is_empty() || path.starts_with(&format!("{}/", folder))
        })
    }
}

/// Trait for metadata indexes.
pub trait MetadataIndex: Send + Sync {
    /// Paths of notes matching `query`, sorted.
    fn find(&self, vault: &dyn Vault, query: &NoteQuery) -> Result<Vec<String>>;

    /// Whether the index can serve queries.
    fn is_available(&self) -> bool {
        true
    }

    /// Index name for logging.
    fn name(&self) -> &'static str;
}

/// Scan notes in scope and compare a frontmatter field.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrontmatterScanIndex;

impl MetadataIndex for FrontmatterScanIndex {
    fn find(&self, vault: &dyn Vault, query: &NoteQuery) -> Result<Vec<String>> {
        scan(vault, query, |text| {
            let (fm, _) = split_frontmatter(text);
            frontmatter_string(&fm, &query.field)
        })
    }

    fn name(&self) -> &'static str {
        "frontmatter-scan"
    }
}

/// Match on frontmatter or inline fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineFieldIndex;

impl MetadataIndex for InlineFieldIndex {
    fn find(&self, vault: &dyn Vault, query: &NoteQuery) -> Result<Vec<String>> {
        scan(vault, query, |text| {
            let (fm, _) = split_frontmatter(text);
            frontmatter_string(&fm, &query.field).or_else(|| inline_field(text, &query.field))
        })
    }

    fn name(&self) -> &'static str {
        "inline-field"
    }
}

fn scan<F>(vault: &dyn Vault, query: &NoteQuery, read_field: F) -> Result<Vec<String>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut matches = Vec::new();
    for path in vault.list_markdown()? {
        if !query.in_scope(&path) {
            continue;
        }
        // Unreadable notes are skipped, not fatal
        let Some(text) = vault.read(&path).map(Some).fail_open_default("reading note") else {
            continue;
        };
        if read_field(&text).is_some_and(|v| v.trim() == query.value) {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches)
}

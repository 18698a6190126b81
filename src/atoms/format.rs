//! Atom note content for Quarry.
//!
//! Default layout:
//!
//! ```text
//! ---
//! created: 2026-01-01T12:00:00+00:00
//! type: atom
//! tags: [memory, learning]
//! source: "[[Source note]]"
//! ---
//!
//! # Title
//!
//! Explanation.
//!
//! ## Evidence
//!
//! > Quoted evidence
//!
//! ## Related
//!
//! - [[Other atom]]
//! ```
//!
//! The tags line and the Evidence and Related sections are omitted when
//! their field is empty.

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::{Captures, Regex};

use crate::core::AtomCandidate;

/// Value of the `type` frontmatter key on every atom.
pub const ATOM_TYPE: &str = "atom";

/// Name used when a title sanitises to nothing.
pub const UNTITLED: &str = "Untitled";

/// Characters that cannot appear in a note file name.
const PATH_HOSTILE: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("valid placeholder regex"));

/// Strip path-hostile characters from a title and trim it.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title.chars().filter(|c| !PATH_HOSTILE.contains(c)).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        UNTITLED.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Build the default atom note for `candidate`.
pub fn build_default_content(
    candidate: &AtomCandidate,
    source_title: &str,
    created: DateTime<Utc>,
) -> String {
    let mut md = String::new();

    md.push_str("---\n");
    md.push_str(&format!(
        "created: {}\n",
        created.to_rfc3339_opts(SecondsFormat::Secs, false)
    ));
    md.push_str(&format!("type: {}\n", ATOM_TYPE));
    if !candidate.tags.is_empty() {
        md.push_str(&format!("tags: [{}]\n", candidate.tags.join(", ")));
    }
    md.push_str(&format!("source: \"[[{}]]\"\n", source_title));
    md.push_str("---\n\n");

    md.push_str(&format!("# {}\n\n", candidate.suggested_title));
    md.push_str(&candidate.explanation);
    md.push('\n');

    if !candidate.evidence.is_empty() {
        md.push_str("\n## Evidence\n\n");
        for line in candidate.evidence.lines() {
            if line.is_empty() {
                md.push_str(">\n");
            } else {
                md.push_str(&format!("> {}\n", line));
            }
        }
    }

    if !candidate.related_atoms.is_empty() {
        md.push_str("\n## Related\n\n");
        for related in &candidate.related_atoms {
            md.push_str(&format!("- [[{}]]\n", related));
        }
    }

    md
}

/// Substitute placeholders in a user template.
///
/// Supported: `{{title}}`, `{{concept}}`, `{{explanation}}`, `{{evidence}}`,
/// `{{tags}}`, `{{date}}` and `{{content}}` (the default-built note).
/// Unknown placeholders are left as written. Substituted values are not
/// scanned again.
pub fn apply_template(
    template: &str,
    candidate: &AtomCandidate,
    default_content: &str,
    created: DateTime<Utc>,
) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            match name {
                "title" => candidate.suggested_title.clone(),
                "concept" => candidate.concept.clone(),
                "explanation" => candidate.explanation.clone(),
                "evidence" => candidate.evidence.clone(),
                "tags" => candidate.tags.join(", "),
                "date" => created.format("%Y-%m-%d").to_string(),
                "content" => default_content.to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

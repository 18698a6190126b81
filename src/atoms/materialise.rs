//! Atom creation for Quarry.
//!
//! Writes one note per approved candidate, in identification order, into the
//! configured output folder. Existing notes are never overwritten: a
//! colliding name gets a `-<unix millis>` suffix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::atoms::format::{apply_template, build_default_content, sanitize_title};
use crate::config::AtomsConfig;
use crate::core::{AtomCandidate, Atomiser, CandidatePatch};
use crate::error::{FailOpen, QuarryError, Result};
use crate::vault::{join_path, Vault};

/// One atom note written to the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAtom {
    /// Id of the candidate it came from.
    pub candidate_id: String,
    /// Note title as written in the heading.
    pub title: String,
    /// Vault path of the new note.
    pub path: String,
}

/// Create notes for every approved candidate and mark the session completed.
///
/// Candidates are written one at a time. A failure stops the batch and is
/// returned as [`QuarryError::Materialise`] listing the notes already
/// written. Those candidates lose their approval so a rerun only retries the
/// rest; the session stays not completed.
pub fn materialise_atoms(
    atomiser: &mut Atomiser,
    vault: &dyn Vault,
    config: &AtomsConfig,
) -> Result<Vec<CreatedAtom>> {
    materialise_atoms_at(atomiser, vault, config, Utc::now())
}

/// [`materialise_atoms`] with an explicit creation time.
pub fn materialise_atoms_at(
    atomiser: &mut Atomiser,
    vault: &dyn Vault,
    config: &AtomsConfig,
    now: DateTime<Utc>,
) -> Result<Vec<CreatedAtom>> {
    let session = atomiser.session().ok_or(QuarryError::NoActiveSession)?;
    let source_title = session.source.title.clone();
    let approved: Vec<AtomCandidate> = session
        .approved_candidates()
        .into_iter()
        .cloned()
        .collect();

    let template = load_template(vault, config);

    if !config.output_folder.trim_matches('/').is_empty() {
        vault.create_folder(&config.output_folder)?;
    }

    let mut created: Vec<CreatedAtom> = Vec::with_capacity(approved.len());
    for candidate in &approved {
        match create_atom(vault, config, candidate, &source_title, template.as_deref(), now) {
            Ok(atom) => {
                tracing::debug!(path = %atom.path, id = %atom.candidate_id, "atom created");
                created.push(atom);
            }
            Err(err) => {
                let unapprove = CandidatePatch::new().approved(false);
                for atom in &created {
                    atomiser.update_candidate(&atom.candidate_id, &unapprove)?;
                }
                let written = created.into_iter().map(|a| a.path).collect();
                return Err(QuarryError::materialise(written, err));
            }
        }
    }

    atomiser.mark_completed()?;
    tracing::info!(
        count = created.len(),
        source = %source_title,
        "atomisation complete"
    );
    Ok(created)
}

fn create_atom(
    vault: &dyn Vault,
    config: &AtomsConfig,
    candidate: &AtomCandidate,
    source_title: &str,
    template: Option<&str>,
    now: DateTime<Utc>,
) -> Result<CreatedAtom> {
    let default_content = build_default_content(candidate, source_title, now);
    let content = match template {
        Some(t) => apply_template(t, candidate, &default_content, now),
        None => default_content,
    };

    let base = sanitize_title(&candidate.suggested_title);
    let path = unique_path(vault, &config.output_folder, &base, now);
    let path = vault.create(&path, &content)?;

    Ok(CreatedAtom {
        candidate_id: candidate.id.clone(),
        title: candidate.suggested_title.clone(),
        path,
    })
}

/// First free path for `base` in `folder`.
///
/// Tries `base.md`, then `base-<millis>.md`, counting up from `now` until
/// the name is free.
pub fn unique_path(vault: &dyn Vault, folder: &str, base: &str, now: DateTime<Utc>) -> String {
    let plain = join_path(folder, &format!("{}.md", base));
    if !vault.exists(&plain) {
        return plain;
    }

    let mut stamp = now.timestamp_millis();
    loop {
        let candidate = join_path(folder, &format!("{}-{}.md", base, stamp));
        if !vault.exists(&candidate) {
            return candidate;
        }
        stamp += 1;
    }
}

/// Read the configured template, if any.
///
/// A missing or unreadable template falls back to the default layout.
fn load_template(vault: &dyn Vault, config: &AtomsConfig) -> Option<String> {
    let path = config.template_path.as_deref()?.trim();
    if path.is_empty() {
        return None;
    }
    read_template(vault, path)
        .map(Some)
        .fail_open_default("loading atom template")
}

fn read_template(vault: &dyn Vault, path: &str) -> Result<String> {
    if !vault.exists(path) {
        return Err(QuarryError::template(format!("{} not found", path)));
    }
    vault
        .read(path)
        .map_err(|err| QuarryError::template(format!("{} unreadable: {}", path, err)))
}

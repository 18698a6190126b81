//! Candidate commands for Quarry.
//!
//! Add, update and remove atom candidates in the live session.

use serde::Serialize;

use crate::cli::{exit_code_for, format_candidate_line, render, CommandOptions};
use crate::core::{AtomCandidate, CandidatePatch};
use crate::error::{exit_codes, QuarryError, Result};
use crate::storage::SessionStore;

/// Output format for the candidate commands.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateOutput {
    /// Whether the command succeeded.
    pub success: bool,
    /// The candidate after the command ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<AtomCandidate>,
    /// Set by `remove`: the id that was removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<String>,
    /// Error message if the command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub exit_code: i32,
}

impl CandidateOutput {
    /// Create a successful output carrying a candidate.
    pub fn success(candidate: AtomCandidate) -> Self {
        Self {
            success: true,
            candidate: Some(candidate),
            removed: None,
            error: None,
            exit_code: exit_codes::OK,
        }
    }

    /// Create a successful removal output.
    pub fn removed(id: impl Into<String>) -> Self {
        Self {
            success: true,
            candidate: None,
            removed: Some(id.into()),
            error: None,
            exit_code: exit_codes::OK,
        }
    }

    /// Create a failed output with a plain message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            candidate: None,
            removed: None,
            error: Some(error.into()),
            exit_code: exit_codes::ERROR,
        }
    }

    /// Create a failed output from an error.
    pub fn from_error(err: &QuarryError) -> Self {
        Self {
            exit_code: exit_code_for(err),
            ..Self::failure(err.to_string())
        }
    }

    fn from_result(result: Result<Self>) -> Self {
        result.unwrap_or_else(|err| Self::from_error(&err))
    }

    /// Format output based on options.
    pub fn format(&self, options: &CommandOptions) -> String {
        render(self, options, Self::format_human_readable)
    }

    fn format_human_readable(&self) -> String {
        if !self.success {
            return format!(
                "Candidate command failed: {}\n",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }
        if let Some(ref id) = self.removed {
            return format!("Removed candidate {}.\n", id);
        }
        match self.candidate {
            Some(ref candidate) => {
                let mut out = format_candidate_line(candidate);
                out.push_str(&format!("  concept: {}\n", candidate.concept));
                if !candidate.explanation.is_empty() {
                    out.push_str(&format!("  explanation: {}\n", candidate.explanation));
                }
                if !candidate.tags.is_empty() {
                    out.push_str(&format!("  tags: {}\n", candidate.tags.join(", ")));
                }
                if !candidate.related_atoms.is_empty() {
                    out.push_str(&format!(
                        "  related: {}\n",
                        candidate.related_atoms.join(", ")
                    ));
                }
                out
            }
            None => String::new(),
        }
    }
}

fn unknown_candidate(id: &str) -> CandidateOutput {
    CandidateOutput::failure(format!("No candidate with id {}", id))
}

// =============================================================================
// add
// =============================================================================

/// Add a candidate for a concept.
pub struct AddCommand<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> AddCommand<S> {
    /// Create a new add command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Append a candidate for `concept` and persist.
    pub fn run(&self, concept: &str) -> CandidateOutput {
        let concept = concept.trim();
        if concept.is_empty() {
            return CandidateOutput::failure("Concept cannot be empty");
        }
        CandidateOutput::from_result(self.add(concept))
    }

    fn add(&self, concept: &str) -> Result<CandidateOutput> {
        let mut atomiser = self.store.load_atomiser()?;
        let candidate = atomiser.add_candidate(concept)?;
        self.store.persist(&atomiser)?;
        Ok(CandidateOutput::success(candidate))
    }
}

// =============================================================================
// update
// =============================================================================

/// Field changes requested on the command line.
#[derive(Debug, Clone, Default)]
pub struct UpdateArgs {
    pub concept: Option<String>,
    pub explanation: Option<String>,
    pub evidence: Option<String>,
    pub title: Option<String>,
    pub tags: Option<Vec<String>>,
    pub related: Option<Vec<String>>,
    /// `Some(true)` for `--approve`, `Some(false)` for `--reject`.
    pub approved: Option<bool>,
}

impl UpdateArgs {
    /// Convert into a patch. Only the supplied fields are set.
    pub fn to_patch(&self) -> CandidatePatch {
        CandidatePatch {
            concept: self.concept.clone(),
            explanation: self.explanation.clone(),
            evidence: self.evidence.clone(),
            suggested_title: self.title.clone(),
            tags: self.tags.clone(),
            related_atoms: self.related.clone(),
            critique: None,
            approved: self.approved,
        }
    }
}

/// Split a comma separated list, dropping empty entries.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Update fields of an existing candidate.
pub struct UpdateCommand<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> UpdateCommand<S> {
    /// Create a new update command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Apply `args` to the candidate with `id` and persist.
    pub fn run(&self, id: &str, args: &UpdateArgs) -> CandidateOutput {
        let patch = args.to_patch();
        if patch.is_empty() {
            return CandidateOutput::failure("Nothing to update");
        }
        CandidateOutput::from_result(self.update(id, &patch))
    }

    fn update(&self, id: &str, patch: &CandidatePatch) -> Result<CandidateOutput> {
        let mut atomiser = self.store.load_atomiser()?;
        let Some(candidate) = atomiser.update_candidate(id, patch)? else {
            return Ok(unknown_candidate(id));
        };
        self.store.persist(&atomiser)?;
        Ok(CandidateOutput::success(candidate))
    }
}

// =============================================================================
// remove
// =============================================================================

/// Remove a candidate.
pub struct RemoveCommand<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> RemoveCommand<S> {
    /// Create a new remove command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Remove the candidate with `id` and persist.
    pub fn run(&self, id: &str) -> CandidateOutput {
        CandidateOutput::from_result(self.remove(id))
    }

    fn remove(&self, id: &str) -> Result<CandidateOutput> {
        let mut atomiser = self.store.load_atomiser()?;
        if !atomiser.has_session() {
            return Err(QuarryError::NoActiveSession);
        }
        if !atomiser.remove_candidate(id) {
            return Ok(unknown_candidate(id));
        }
        self.store.persist(&atomiser)?;
        Ok(CandidateOutput::removed(id))
    }
}

//! Session and phase types for Quarry.
//!
//! These types represent the runtime state of one atomisation session: the
//! source note being worked on, the candidates identified so far and the
//! current workflow phase.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::atom::AtomCandidate;
use crate::error::QuarryError;

/// Workflow phase.
///
/// Phases are totally ordered; `Complete` is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Read the source and orient.
    #[default]
    Introduction,
    /// Name the distinct concepts in the source.
    Identification,
    /// Explain each concept in your own words.
    Explanation,
    /// Review critiques of each candidate.
    Critique,
    /// Revise candidates based on the critique.
    Refinement,
    /// Approve the candidates that should become atoms.
    Confirmation,
    /// Write the approved atoms to the vault.
    Creation,
    /// Session finished.
    Complete,
}

impl Phase {
    /// All phases in workflow order.
    pub fn all() -> &'static [Phase] {
        &[
            Phase::Introduction,
            Phase::Identification,
            Phase::Explanation,
            Phase::Critique,
            Phase::Refinement,
            Phase::Confirmation,
            Phase::Creation,
            Phase::Complete,
        ]
    }

    /// The phase one step after this one. `Complete` stays `Complete`.
    pub fn next(self) -> Phase {
        match self {
            Phase::Introduction => Phase::Identification,
            Phase::Identification => Phase::Explanation,
            Phase::Explanation => Phase::Critique,
            Phase::Critique => Phase::Refinement,
            Phase::Refinement => Phase::Confirmation,
            Phase::Confirmation => Phase::Creation,
            Phase::Creation => Phase::Complete,
            Phase::Complete => Phase::Complete,
        }
    }

    /// Check if this is the terminal phase.
    pub fn is_terminal(self) -> bool {
        self == Phase::Complete
    }

    /// Machine name (kebab-case, as used in config and on the command line).
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Introduction => "introduction",
            Phase::Identification => "identification",
            Phase::Explanation => "explanation",
            Phase::Critique => "critique",
            Phase::Refinement => "refinement",
            Phase::Confirmation => "confirmation",
            Phase::Creation => "creation",
            Phase::Complete => "complete",
        }
    }

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Phase::Introduction => "Introduction",
            Phase::Identification => "Identification",
            Phase::Explanation => "Explanation",
            Phase::Critique => "Critique",
            Phase::Refinement => "Refinement",
            Phase::Confirmation => "Confirmation",
            Phase::Creation => "Creation",
            Phase::Complete => "Complete",
        }
    }

    /// One-line prompt shown to the user while in this phase.
    pub fn description(self) -> &'static str {
        match self {
            Phase::Introduction => "Read the source note and get a feel for what it covers.",
            Phase::Identification => "List each distinct concept the note contains.",
            Phase::Explanation => {
                "Explain each concept in your own words and quote supporting evidence."
            }
            Phase::Critique => "Review the critique of each candidate.",
            Phase::Refinement => "Revise explanations, titles and links based on the critique.",
            Phase::Confirmation => "Approve the candidates that should become atomic notes.",
            Phase::Creation => "Create the approved atoms in the vault.",
            Phase::Complete => "Atomisation complete.",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Phase {
    type Err = QuarryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Phase::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| QuarryError::invalid_phase(s))
    }
}

/// A quarry note loaded for atomisation.
///
/// Read-only for the lifetime of the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceNote {
    /// Vault-relative path of the note.
    pub path: String,
    /// Note title (file stem).
    pub title: String,
    /// Raw note text.
    pub body: String,
    /// Frontmatter key/value pairs.
    pub frontmatter: BTreeMap<String, serde_json::Value>,
    /// Value of the migration field, if the note has one.
    pub migration_status: Option<String>,
}

impl SourceNote {
    /// Create a source note with no frontmatter.
    pub fn new(path: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            body: body.into(),
            frontmatter: BTreeMap::new(),
            migration_status: None,
        }
    }
}

/// One atomisation session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtomisationSession {
    /// The note being atomised.
    pub source: SourceNote,
    /// Candidates in identification order.
    pub candidates: Vec<AtomCandidate>,
    /// Current workflow phase.
    pub phase: Phase,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// Set once the approved atoms have been written.
    pub completed: bool,
}

impl AtomisationSession {
    /// Create a fresh session around a source note.
    pub fn new(source: SourceNote) -> Self {
        Self {
            source,
            candidates: Vec::new(),
            phase: Phase::Introduction,
            started_at: Utc::now(),
            completed: false,
        }
    }

    /// Look up a candidate by id.
    pub fn candidate(&self, id: &str) -> Option<&AtomCandidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Candidates marked approved, in identification order.
    pub fn approved_candidates(&self) -> Vec<&AtomCandidate> {
        self.candidates.iter().filter(|c| c.approved).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order_is_total() {
        let phases = Phase::all();
        assert_eq!(phases.len(), 8);
        for pair in phases.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].next(), pair[1]);
        }
    }

    #[test]
    fn test_complete_is_terminal_and_sticky() {
        assert!(Phase::Complete.is_terminal());
        assert_eq!(Phase::Complete.next(), Phase::Complete);
        assert_eq!(Phase::all().iter().filter(|p| p.is_terminal()).count(), 1);
    }

    #[test]
    fn test_phase_from_str() {
        assert_eq!("critique".parse::<Phase>().unwrap(), Phase::Critique);
        assert_eq!(" Confirmation ".parse::<Phase>().unwrap(), Phase::Confirmation);
        assert!(matches!(
            "drafting".parse::<Phase>(),
            Err(QuarryError::InvalidPhase { .. })
        ));
    }

    #[test]
    fn test_phase_display_matches_serde() {
        for phase in Phase::all() {
            let json = serde_json::to_string(phase).unwrap();
            assert_eq!(json, format!("\"{}\"", phase));
        }
    }

    #[test]
    fn test_new_session_defaults() {
        let session = AtomisationSession::new(SourceNote::new("Quarry/Long.md", "Long", "text"));
        assert_eq!(session.phase, Phase::Introduction);
        assert!(session.candidates.is_empty());
        assert!(!session.completed);
        assert_eq!(session.source.title, "Long");
    }
}

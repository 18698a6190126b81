//! CLI commands for Quarry.
//!
//! One command struct per user action, organized into:
//! - **Discovery commands**: pick, quarries
//! - **Session commands**: start, status, advance, phase, end
//! - **Candidate commands**: add, update, remove
//! - **Review commands**: validate, critique
//! - **Creation**: create
//!
//! Every command returns a serialisable output that renders as JSON or as
//! human-readable text.

// Discovery commands
pub mod pick;

// Session commands
pub mod session_cmd;

// Candidate commands
pub mod candidates;
pub mod review;

// Creation
pub mod create;

pub use candidates::{AddCommand, RemoveCommand, UpdateArgs, UpdateCommand};
pub use create::CreateCommand;
pub use pick::{PickCommand, QuarriesCommand};
pub use review::{CritiqueCommand, ValidateCommand};
pub use session_cmd::{AdvanceCommand, EndCommand, PhaseCommand, StartCommand, StatusCommand};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::{AtomCandidate, AtomisationSession, Phase};
use crate::error::{exit_codes, QuarryError};
use crate::util::truncate_chars;

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Snapshot of the live session for command output.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub source_path: String,
    pub source_title: String,
    pub phase: Phase,
    pub phase_name: String,
    /// What the user should do in this phase.
    pub prompt: String,
    pub started_at: DateTime<Utc>,
    pub completed: bool,
    pub candidates: Vec<AtomCandidate>,
}

impl SessionSummary {
    /// Summarise a session.
    pub fn from_session(session: &AtomisationSession) -> Self {
        Self {
            source_path: session.source.path.clone(),
            source_title: session.source.title.clone(),
            phase: session.phase,
            phase_name: session.phase.display_name().to_string(),
            prompt: session.phase.description().to_string(),
            started_at: session.started_at,
            completed: session.completed,
            candidates: session.candidates.clone(),
        }
    }

    /// Number of approved candidates.
    pub fn approved_count(&self) -> usize {
        self.candidates.iter().filter(|c| c.approved).count()
    }

    /// Multi-line human-readable rendering.
    pub fn format_human_readable(&self) -> String {
        let mut out = format!(
            "Source: {} ({})\nPhase: {} - {}\n",
            self.source_title, self.source_path, self.phase_name, self.prompt
        );
        if self.candidates.is_empty() {
            out.push_str("No candidates yet.\n");
        } else {
            out.push_str(&format!(
                "Candidates ({} approved of {}):\n",
                self.approved_count(),
                self.candidates.len()
            ));
            for candidate in &self.candidates {
                out.push_str(&format_candidate_line(candidate));
            }
        }
        if self.completed {
            out.push_str("Atoms created.\n");
        }
        out
    }
}

/// One-line rendering of a candidate.
pub(crate) fn format_candidate_line(candidate: &AtomCandidate) -> String {
    let mark = if candidate.approved { "x" } else { " " };
    format!(
        "  [{}] {}  {}\n",
        mark,
        candidate.id,
        truncate_chars(&candidate.suggested_title, 60)
    )
}

/// Exit code for a failed command.
pub fn exit_code_for(err: &QuarryError) -> i32 {
    match err {
        QuarryError::NoActiveSession => exit_codes::NO_SESSION,
        _ => exit_codes::ERROR,
    }
}

/// Render `output` according to `options`.
///
/// Quiet wins over JSON; otherwise `human` produces the text form.
pub(crate) fn render<T, F>(output: &T, options: &CommandOptions, human: F) -> String
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    if options.quiet {
        return String::new();
    }

    if options.json {
        serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
    } else {
        human(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Atomiser, SourceNote};

    #[test]
    fn test_exit_code_for() {
        assert_eq!(
            exit_code_for(&QuarryError::NoActiveSession),
            exit_codes::NO_SESSION
        );
        assert_eq!(
            exit_code_for(&QuarryError::provider("down")),
            exit_codes::ERROR
        );
    }

    #[test]
    fn test_render_modes() {
        let value = serde_json::json!({"success": true});
        let human = |_: &serde_json::Value| "done\n".to_string();

        assert_eq!(render(&value, &CommandOptions::default(), human), "done\n");
        let quiet = CommandOptions {
            json: true,
            quiet: true,
        };
        assert!(render(&value, &quiet, human).is_empty());
        let json = CommandOptions {
            json: true,
            quiet: false,
        };
        assert!(render(&value, &json, human).contains("\"success\": true"));
    }

    #[test]
    fn test_summary_counts_and_text() {
        let mut atomiser = Atomiser::new();
        atomiser.start_session(SourceNote::new("Quarry/Sleep.md", "Sleep", "body"));
        let first = atomiser.add_candidate("sleep consolidates memory").unwrap();
        atomiser.add_candidate("naps help").unwrap();
        atomiser
            .update_candidate(&first.id, &crate::core::CandidatePatch::new().approved(true))
            .unwrap();

        let summary = SessionSummary::from_session(atomiser.session().unwrap());
        assert_eq!(summary.approved_count(), 1);
        assert_eq!(summary.phase, Phase::Introduction);

        let text = summary.format_human_readable();
        assert!(text.contains("Source: Sleep (Quarry/Sleep.md)"));
        assert!(text.contains("1 approved of 2"));
        assert!(text.contains(&format!("[x] {}", first.id)));
    }
}

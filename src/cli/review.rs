//! Review commands for Quarry.
//!
//! `validate` runs the explanation gates on one candidate; `critique`
//! produces and stores a critique, using the configured provider when
//! enabled.

use serde::Serialize;

use crate::cli::{exit_code_for, render, CommandOptions};
use crate::config::Config;
use crate::core::{
    critique_candidate, validate_candidate, Critique, CritiqueSource, ValidationResult,
};
use crate::error::{exit_codes, QuarryError, Result};
use crate::providers::TextGenerator;
use crate::storage::SessionStore;

/// Output format for the review commands.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutput {
    /// Whether the command succeeded.
    pub success: bool,
    pub candidate_id: String,
    /// Set by `validate`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
    /// Set by `critique`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critique: Option<Critique>,
    /// Error message if the command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub exit_code: i32,
}

impl ReviewOutput {
    fn empty(candidate_id: &str) -> Self {
        Self {
            success: true,
            candidate_id: candidate_id.to_string(),
            validation: None,
            critique: None,
            error: None,
            exit_code: exit_codes::OK,
        }
    }

    /// Create a validation output.
    pub fn validated(candidate_id: &str, result: ValidationResult) -> Self {
        Self {
            validation: Some(result),
            ..Self::empty(candidate_id)
        }
    }

    /// Create a critique output.
    pub fn critiqued(candidate_id: &str, critique: Critique) -> Self {
        Self {
            critique: Some(critique),
            ..Self::empty(candidate_id)
        }
    }

    /// Create a failed output.
    pub fn failure(candidate_id: &str, err: &QuarryError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            exit_code: exit_code_for(err),
            ..Self::empty(candidate_id)
        }
    }

    fn unknown(candidate_id: &str) -> Self {
        Self {
            success: false,
            error: Some(format!("No candidate with id {}", candidate_id)),
            exit_code: exit_codes::ERROR,
            ..Self::empty(candidate_id)
        }
    }

    /// Format output based on options.
    pub fn format(&self, options: &CommandOptions) -> String {
        render(self, options, Self::format_human_readable)
    }

    fn format_human_readable(&self) -> String {
        if !self.success {
            return format!(
                "Review failed: {}\n",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut out = String::new();
        if let Some(ref result) = self.validation {
            let verdict = if result.valid { "PASS" } else { "FAIL" };
            out.push_str(&format!("{} ({}): {}\n", verdict, result.gate, result.feedback));
            for suggestion in result.suggestions.iter().flatten() {
                out.push_str(&format!("  - {}\n", suggestion));
            }
        }
        if let Some(ref critique) = self.critique {
            if let CritiqueSource::Provider(ref name) = critique.source {
                out.push_str(&format!("Critique from {}:\n", name));
            }
            out.push_str(&critique.text);
            out.push('\n');
        }
        out
    }
}

// =============================================================================
// validate
// =============================================================================

/// Validate a candidate's explanation.
pub struct ValidateCommand<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> ValidateCommand<S> {
    /// Create a new validate command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate the candidate with `id`. The session is not modified.
    pub fn run(&self, id: &str) -> ReviewOutput {
        self.validate(id)
            .unwrap_or_else(|err| ReviewOutput::failure(id, &err))
    }

    fn validate(&self, id: &str) -> Result<ReviewOutput> {
        let atomiser = self.store.load_atomiser()?;
        let session = atomiser.session().ok_or(QuarryError::NoActiveSession)?;
        Ok(match session.candidate(id) {
            Some(candidate) => ReviewOutput::validated(id, validate_candidate(candidate)),
            None => ReviewOutput::unknown(id),
        })
    }
}

// =============================================================================
// critique
// =============================================================================

/// Critique a candidate and store the critique on it.
pub struct CritiqueCommand<S: SessionStore, P: TextGenerator> {
    store: S,
    provider: P,
    config: Config,
}

impl<S: SessionStore, P: TextGenerator> CritiqueCommand<S, P> {
    /// Create a new critique command.
    pub fn new(store: S, provider: P, config: Config) -> Self {
        Self {
            store,
            provider,
            config,
        }
    }

    /// Critique the candidate with `id` and persist the result.
    pub fn run(&self, id: &str) -> ReviewOutput {
        self.critique(id)
            .unwrap_or_else(|err| ReviewOutput::failure(id, &err))
    }

    fn critique(&self, id: &str) -> Result<ReviewOutput> {
        let mut atomiser = self.store.load_atomiser()?;
        let Some(critique) =
            critique_candidate(&mut atomiser, id, &self.config.critique, &self.provider)?
        else {
            return Ok(ReviewOutput::unknown(id));
        };
        self.store.persist(&atomiser)?;
        Ok(ReviewOutput::critiqued(id, critique))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CritiqueConfig;
    use crate::core::{Atomiser, CandidatePatch, SourceNote, ValidationGate};
    use crate::providers::{DisabledProvider, MockGenerator};
    use crate::storage::MemorySessionStore;
    use std::sync::Arc;

    fn setup(explanation: &str) -> (Arc<MemorySessionStore>, String) {
        let store = Arc::new(MemorySessionStore::new());
        let mut atomiser = Atomiser::new();
        atomiser.start_session(SourceNote::new("Quarry/Memory.md", "Memory", "body text"));
        let candidate = atomiser.add_candidate("spaced repetition").unwrap();
        atomiser
            .update_candidate(&candidate.id, &CandidatePatch::new().explanation(explanation))
            .unwrap();
        store.persist(&atomiser).unwrap();
        (store, candidate.id)
    }

    fn llm_config() -> Config {
        Config {
            critique: CritiqueConfig {
                use_llm_critique: true,
                ..CritiqueConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_validate_reports_gate() {
        let (store, id) = setup("short");

        let output = ValidateCommand::new(Arc::clone(&store)).run(&id);

        assert!(output.success);
        let result = output.validation.unwrap();
        assert!(!result.valid);
        assert_eq!(result.gate, ValidationGate::Length);
    }

    #[test]
    fn test_validate_unknown_id() {
        let (store, _) = setup("short");
        let output = ValidateCommand::new(store).run("atom_missing");

        assert!(!output.success);
        assert_eq!(output.exit_code, exit_codes::ERROR);
    }

    #[test]
    fn test_validate_without_session() {
        let output = ValidateCommand::new(Arc::new(MemorySessionStore::new())).run("atom_x");
        assert_eq!(output.exit_code, exit_codes::NO_SESSION);
    }

    #[test]
    fn test_critique_stores_rule_based_text() {
        let (store, id) = setup("short");

        let output =
            CritiqueCommand::new(Arc::clone(&store), DisabledProvider, Config::default()).run(&id);

        assert!(output.success);
        let critique = output.critique.unwrap();
        assert_eq!(critique.source, CritiqueSource::Rules);
        let session = store.load().unwrap().unwrap();
        assert_eq!(session.candidates[0].critique, critique.text);
    }

    #[test]
    fn test_critique_uses_enabled_provider() {
        let (store, id) = setup("Reviewing at growing intervals keeps recall cheap.");
        let provider = MockGenerator::new("Name the interval schedule.");

        let output = CritiqueCommand::new(Arc::clone(&store), provider, llm_config()).run(&id);

        let critique = output.critique.unwrap();
        assert_eq!(critique.text, "Name the interval schedule.");
        assert_eq!(critique.source, CritiqueSource::Provider("mock".to_string()));
        let text = ReviewOutput::critiqued(&id, critique).format(&CommandOptions::default());
        assert!(text.starts_with("Critique from mock:"));
    }

    #[test]
    fn test_critique_provider_failure_falls_back() {
        let (store, id) = setup("Reviewing at growing intervals keeps recall cheap.");
        let provider = MockGenerator::failing("timeout");

        let output = CritiqueCommand::new(store, provider, llm_config()).run(&id);

        assert!(output.success);
        assert_eq!(output.critique.unwrap().source, CritiqueSource::Rules);
    }

    #[test]
    fn test_format_validation() {
        let (store, id) = setup("short");
        let output = ValidateCommand::new(store).run(&id);

        let text = output.format(&CommandOptions::default());
        assert!(text.starts_with("FAIL (length):"));
    }
}

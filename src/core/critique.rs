//! Critique generation for Quarry.
//!
//! The rule-based critique collects every structural issue with a candidate
//! (unlike validation, which stops at the first failing gate). When enabled
//! and available, a text-generation provider writes the critique instead;
//! recoverable provider failures fall back to the rule-based text.

use serde::{Deserialize, Serialize};

use crate::config::CritiqueConfig;
use crate::core::atom::{AtomCandidate, CandidatePatch};
use crate::core::session::Atomiser;
use crate::core::state::SourceNote;
use crate::core::validate::validate_candidate;
use crate::error::Result;
use crate::providers::TextGenerator;

/// Titles shorter than this are flagged.
pub const TITLE_MIN_LENGTH: usize = 10;
/// Titles longer than this are flagged.
pub const TITLE_MAX_LENGTH: usize = 80;
/// Evidence shorter than this is flagged as sparse.
pub const EVIDENCE_MIN_LENGTH: usize = 30;

/// Message returned when nothing needs attention.
pub const NO_ISSUES_MESSAGE: &str =
    "No significant issues identified. This atom is ready for creation.";

/// Where a critique came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "provider")]
pub enum CritiqueSource {
    /// Built from the rule-based checks.
    Rules,
    /// Written by the named text-generation provider.
    Provider(String),
}

/// A generated critique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Critique {
    /// The critique text.
    pub text: String,
    /// Which generator produced it.
    pub source: CritiqueSource,
}

impl Critique {
    fn rules(text: String) -> Self {
        Self {
            text,
            source: CritiqueSource::Rules,
        }
    }
}

/// Build the rule-based critique for a candidate.
///
/// Issues are separated by blank lines.
pub fn generate_rule_based_critique(candidate: &AtomCandidate) -> String {
    let mut issues: Vec<String> = Vec::new();

    let title_len = candidate.suggested_title.chars().count();
    if title_len < TITLE_MIN_LENGTH {
        issues.push(
            "The title is too short to be descriptive. A good atom title states the idea."
                .to_string(),
        );
    }
    if title_len > TITLE_MAX_LENGTH {
        issues.push(format!(
            "The title is too long ({} characters). Keep it under {}.",
            title_len, TITLE_MAX_LENGTH
        ));
    }

    if candidate.evidence.is_empty() {
        issues.push(
            "There is no supporting evidence. Quote the passage of the source this comes from."
                .to_string(),
        );
    } else if candidate.evidence.chars().count() < EVIDENCE_MIN_LENGTH {
        issues.push(
            "The evidence is sparse. Consider quoting more of the source for context.".to_string(),
        );
    }

    let validation = validate_candidate(candidate);
    if !validation.valid {
        issues.push(validation.feedback);
    }

    if candidate.related_atoms.is_empty() {
        issues.push(
            "There are no related atoms linked. How does this idea connect to others?"
                .to_string(),
        );
    }

    if issues.is_empty() {
        NO_ISSUES_MESSAGE.to_string()
    } else {
        issues.join("\n\n")
    }
}

/// Critique used while rendering the critique phase.
pub fn generate_critique(candidate: &AtomCandidate) -> String {
    generate_rule_based_critique(candidate)
}

/// Build the prompt sent to a text-generation provider.
///
/// Includes at most `excerpt_chars` characters of the source note.
pub fn build_critique_prompt(
    candidate: &AtomCandidate,
    source: &SourceNote,
    excerpt_chars: usize,
) -> String {
    let excerpt: String = source.body.chars().take(excerpt_chars).collect();
    let evidence = if candidate.evidence.is_empty() {
        "(none provided)"
    } else {
        candidate.evidence.as_str()
    };

    format!(
        "You are reviewing an atomic note extracted from a longer source note.\n\
         Critique the user's explanation. Point out vagueness, restatement of the concept, \
         multiple ideas bundled together, weak or missing evidence, and missing links to \
         related ideas. Be concise and specific. If the atom is ready, say so.\n\
         \n\
         Concept: {}\n\
         Proposed title: {}\n\
         \n\
         Explanation:\n{}\n\
         \n\
         Evidence:\n{}\n\
         \n\
         Source note \"{}\" (excerpt):\n{}\n",
        candidate.concept,
        candidate.suggested_title,
        candidate.explanation,
        evidence,
        source.title,
        excerpt
    )
}

/// Generate a critique, preferring the provider when configured.
///
/// The provider is used only when `config.use_llm_critique` is set and the
/// provider reports itself available. Recoverable provider errors and empty
/// responses are logged and replaced by the rule-based critique; any other
/// error is returned.
pub fn generate_critique_with_provider(
    candidate: &AtomCandidate,
    source: &SourceNote,
    config: &CritiqueConfig,
    provider: &dyn TextGenerator,
) -> Result<Critique> {
    if !config.use_llm_critique {
        return Ok(Critique::rules(generate_rule_based_critique(candidate)));
    }
    if !provider.is_available() {
        tracing::warn!(
            provider = provider.name(),
            "critique provider unavailable, using rule-based critique"
        );
        return Ok(Critique::rules(generate_rule_based_critique(candidate)));
    }

    let prompt = build_critique_prompt(candidate, source, config.source_excerpt_chars);
    let completion = match provider.complete(&prompt) {
        Ok(text) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
        Err(err) if err.is_recoverable() => {
            tracing::warn!(
                provider = provider.name(),
                error = %err,
                "critique provider failed, using rule-based critique"
            );
            None
        }
        Err(err) => return Err(err),
    };

    Ok(match completion {
        Some(text) => Critique {
            text,
            source: CritiqueSource::Provider(provider.name().to_string()),
        },
        None => Critique::rules(generate_rule_based_critique(candidate)),
    })
}

/// Critique the candidate with `id` and store the text on it.
///
/// Returns `Ok(None)` when no candidate has that id.
pub fn critique_candidate(
    atomiser: &mut Atomiser,
    id: &str,
    config: &CritiqueConfig,
    provider: &dyn TextGenerator,
) -> Result<Option<Critique>> {
    let session = atomiser.session_mut()?;
    let Some(candidate) = session.candidate(id) else {
        return Ok(None);
    };
    let critique = generate_critique_with_provider(candidate, &session.source, config, provider)?;

    atomiser.update_candidate(id, &CandidatePatch::new().critique(critique.text.clone()))?;
    Ok(Some(critique))
}

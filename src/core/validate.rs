//! Explanation validation for Quarry.
//!
//! Scores a candidate's explanation against a fixed sequence of heuristic
//! gates. Gates run in order and the first failure is returned.
//!
//! 1. Length gate
//! 2. Hedging-language gate
//! 3. Repetition gate
//! 4. Atomicity gate

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::atom::AtomCandidate;

// =============================================================================
// Constants
// =============================================================================

/// Minimum explanation length, in characters.
pub const EXPLANATION_MIN_LENGTH: usize = 20;

/// Share of the concept's words that may reappear in the explanation.
pub const REPETITION_THRESHOLD: f64 = 0.7;

/// Concept words must be longer than this to count towards repetition.
pub const REPETITION_MIN_WORD_LENGTH: usize = 3;

/// Vague phrases that signal the user has not pinned the idea down.
pub const HEDGING_MARKERS: &[&str] = &[
    "something like",
    "kind of",
    "sort of",
    "basically",
    "generally",
    "usually",
    "i think maybe",
];

/// A conjunction followed later on the same line by a linking verb.
static MULTIPLE_CONCEPTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(and|also|additionally|furthermore|moreover)\b.*\b(is|are|means|implies)\b")
        .expect("valid multiple-concepts regex")
});

// =============================================================================
// Types
// =============================================================================

/// The gate that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationGate {
    /// Explanation too short.
    Length,
    /// Explanation uses vague qualifiers.
    Hedging,
    /// Explanation restates the concept.
    Repetition,
    /// Explanation bundles several ideas.
    Atomicity,
    /// Every gate passed.
    Passed,
}

impl std::fmt::Display for ValidationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationGate::Length => write!(f, "length"),
            ValidationGate::Hedging => write!(f, "hedging"),
            ValidationGate::Repetition => write!(f, "repetition"),
            ValidationGate::Atomicity => write!(f, "atomicity"),
            ValidationGate::Passed => write!(f, "passed"),
        }
    }
}

/// Outcome of validating one explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the explanation passed every gate.
    pub valid: bool,
    /// Human-readable feedback.
    pub feedback: String,
    /// Follow-up prompts, when the gate offers any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    /// Which gate decided the result.
    pub gate: ValidationGate,
}

impl ValidationResult {
    fn invalid(gate: ValidationGate, feedback: &str, suggestions: &[&str]) -> Self {
        Self {
            valid: false,
            feedback: feedback.to_string(),
            suggestions: Some(suggestions.iter().map(|s| s.to_string()).collect()),
            gate,
        }
    }

    fn valid(feedback: &str) -> Self {
        Self {
            valid: true,
            feedback: feedback.to_string(),
            suggestions: None,
            gate: ValidationGate::Passed,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validate an explanation of `concept`.
pub fn validate_explanation(concept: &str, explanation: &str) -> ValidationResult {
    if explanation.chars().count() < EXPLANATION_MIN_LENGTH {
        return ValidationResult::invalid(
            ValidationGate::Length,
            "Your explanation is too brief. Try to explain the idea fully in your own words.",
            &[
                "What is the core claim, in one sentence?",
                "Why is this true, or why does it matter?",
                "How would you explain it to someone who has not read the source?",
            ],
        );
    }

    let lower = explanation.to_lowercase();
    if HEDGING_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return ValidationResult::invalid(
            ValidationGate::Hedging,
            "Your explanation uses hedging language. Atomic notes should state ideas directly.",
            &[
                "State the idea directly, without qualifiers.",
                "Identify what exactly is unclear to you and resolve it first.",
            ],
        );
    }

    if repeats_concept(concept, &lower) {
        return ValidationResult::invalid(
            ValidationGate::Repetition,
            "Your explanation mostly repeats the concept. Explain it rather than restate it.",
            &[
                "Describe the mechanism or reasoning behind the concept.",
                "Give an example that shows the concept at work.",
            ],
        );
    }

    if MULTIPLE_CONCEPTS.is_match(explanation) {
        return ValidationResult::invalid(
            ValidationGate::Atomicity,
            "Your explanation may contain multiple concepts. An atom should capture one idea.",
            &[
                "Consider splitting this into separate atoms.",
                "Keep the single core idea here and link the rest as related atoms.",
            ],
        );
    }

    ValidationResult::valid(
        "Looks good. Ask yourself: does this stand alone without the source note?",
    )
}

/// Validate a stored candidate using its own concept and explanation.
pub fn validate_candidate(candidate: &AtomCandidate) -> ValidationResult {
    validate_explanation(&candidate.concept, &candidate.explanation)
}

/// Check whether most of the concept's words reappear in the explanation.
///
/// `explanation_lower` must already be lower-cased.
fn repeats_concept(concept: &str, explanation_lower: &str) -> bool {
    let concept_lower = concept.to_lowercase();
    let concept_words: Vec<&str> = concept_lower.split_whitespace().collect();
    if concept_words.is_empty() {
        return false;
    }

    let explanation_words: HashSet<&str> = explanation_lower.split_whitespace().collect();
    let overlap: HashSet<&str> = concept_words
        .iter()
        .copied()
        .filter(|w| w.chars().count() > REPETITION_MIN_WORD_LENGTH)
        .filter(|w| explanation_words.contains(w))
        .collect();

    overlap.len() as f64 > concept_words.len() as f64 * REPETITION_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brief_explanation_invalid() {
        let result = validate_explanation("spacing", "It helps.");

        assert!(!result.valid);
        assert_eq!(result.gate, ValidationGate::Length);
        assert!(result.feedback.contains("too brief"));
        assert_eq!(result.suggestions.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 19 two-byte characters
        let explanation = "é".repeat(19);
        assert_eq!(
            validate_explanation("x", &explanation).gate,
            ValidationGate::Length
        );
    }

    #[test]
    fn test_hedging_scenario() {
        let result = validate_explanation(
            "testing is important",
            "Testing is kind of important because it sort of helps",
        );

        assert!(!result.valid);
        assert_eq!(result.gate, ValidationGate::Hedging);
        assert!(result.feedback.contains("hedging"));
        assert_eq!(result.suggestions.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_hedging_is_case_insensitive() {
        let result = validate_explanation(
            "recall",
            "BASICALLY retrieval practice strengthens the memory trace.",
        );
        assert_eq!(result.gate, ValidationGate::Hedging);

        let result = validate_explanation(
            "recall",
            "I think maybe retrieval strengthens the memory trace itself.",
        );
        assert_eq!(result.gate, ValidationGate::Hedging);
    }

    #[test]
    fn test_repetition_invalid() {
        let result = validate_explanation(
            "spaced repetition improves retention",
            "Spaced repetition improves retention over the long run.",
        );

        assert!(!result.valid);
        assert_eq!(result.gate, ValidationGate::Repetition);
        assert!(result.feedback.contains("repeats the concept"));
    }

    #[test]
    fn test_repetition_ignores_short_words() {
        // Only "memory" (len > 3) overlaps: 1 of 4 words
        let result = validate_explanation(
            "the art of memory",
            "Memory palaces place images along a walk you know well.",
        );
        assert!(result.valid, "{:?}", result);
    }

    #[test]
    fn test_repetition_at_threshold_passes() {
        // 7 of 10 concept words overlap: 7 is not > 7.0
        let concept = "alpha bravo charlie delta echoes foxtrot golfer hotel1 india1 juliet";
        let explanation = "alpha bravo charlie delta echoes foxtrot golfer but none of the rest";
        let result = validate_explanation(concept, explanation);
        assert_ne!(result.gate, ValidationGate::Repetition);
    }

    #[test]
    fn test_multiple_concepts_invalid() {
        let result = validate_explanation(
            "interleaved study",
            "Interleaving mixes problem types, and blocking practice is worse for transfer.",
        );

        assert!(!result.valid);
        assert_eq!(result.gate, ValidationGate::Atomicity);
        assert!(result.feedback.contains("multiple concepts"));
    }

    #[test]
    fn test_multiple_concepts_spans_sentences_on_one_line() {
        let result = validate_explanation(
            "interleaved study",
            "Interleaving mixes problem types. Also, the effect is strongest for maths.",
        );
        assert_eq!(result.gate, ValidationGate::Atomicity);
    }

    #[test]
    fn test_multiple_concepts_needs_whole_words() {
        // "band" and "this" must not match the conjunction or verb
        let result = validate_explanation(
            "rehearsal",
            "A band rehearses the hard passages first, this pays off at the concert.",
        );
        assert!(result.valid, "{:?}", result);
    }

    #[test]
    fn test_multiple_concepts_does_not_cross_lines() {
        let result = validate_explanation(
            "retrieval practice",
            "Recalling information strengthens it and\nthat is why quizzes help.",
        );
        assert_eq!(result.gate, ValidationGate::Passed);
    }

    #[test]
    fn test_valid_explanation() {
        let result = validate_explanation(
            "desirable difficulty",
            "Effortful retrieval leaves a stronger trace than easy rereading.",
        );

        assert!(result.valid);
        assert_eq!(result.gate, ValidationGate::Passed);
        assert!(result.feedback.contains("stand alone"));
        assert!(result.suggestions.is_none());
    }

    #[test]
    fn test_gates_short_circuit_in_order() {
        // Short and hedging: length wins
        assert_eq!(
            validate_explanation("x", "kind of").gate,
            ValidationGate::Length
        );
        // Hedging and repetition: hedging wins
        assert_eq!(
            validate_explanation(
                "retrieval strengthens memory",
                "basically retrieval strengthens memory",
            )
            .gate,
            ValidationGate::Hedging
        );
    }

    #[test]
    fn test_validate_candidate_uses_candidate_fields() {
        let mut candidate = AtomCandidate::new("retrieval");
        candidate.explanation = "short".to_string();
        assert_eq!(validate_candidate(&candidate).gate, ValidationGate::Length);
    }

    #[test]
    fn test_gate_display() {
        assert_eq!(ValidationGate::Length.to_string(), "length");
        assert_eq!(ValidationGate::Passed.to_string(), "passed");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: anything under the minimum length is rejected as too brief
            #[test]
            fn prop_short_always_too_brief(concept in ".{0,30}", explanation in ".{0,19}") {
                let result = validate_explanation(&concept, &explanation);
                prop_assert!(!result.valid);
                prop_assert!(result.feedback.contains("too brief"));
            }

            // Property: a hedging marker invalidates an explanation of any length
            #[test]
            fn prop_hedging_always_invalid(
                marker in prop::sample::select(HEDGING_MARKERS.to_vec()),
                prefix in "[a-z ]{0,40}",
                suffix in "[a-z ]{0,200}",
            ) {
                let explanation = format!("{} {} and padding to length {}", prefix, marker, suffix);
                let result = validate_explanation("unrelated", &explanation);
                prop_assert!(!result.valid);
                prop_assert_eq!(result.gate, ValidationGate::Hedging);
            }
        }
    }
}

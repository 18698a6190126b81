//! Atom candidate types for Quarry.
//!
//! A candidate is one concept identified in a quarry note, together with the
//! user's explanation of it, supporting evidence and review state. Candidates
//! are changed through [`CandidatePatch`] values so that only the supplied
//! fields move.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a derived title, in characters.
pub const TITLE_MAX_LENGTH: usize = 80;

/// Marker appended to titles truncated to [`TITLE_MAX_LENGTH`].
pub const TITLE_ELLIPSIS: &str = "...";

/// An atom candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AtomCandidate {
    /// Unique identifier within the session.
    pub id: String,
    /// Short free-text statement of the concept.
    pub concept: String,
    /// The user's own explanation.
    pub explanation: String,
    /// Quote or reference from the source note.
    pub evidence: String,
    /// Title used for the atom note.
    pub suggested_title: String,
    /// Tags for the atom note.
    pub tags: Vec<String>,
    /// Titles of other atoms this one links to. Not checked for existence.
    pub related_atoms: Vec<String>,
    /// Most recent critique text.
    pub critique: String,
    /// Whether the candidate should be created.
    pub approved: bool,
}

impl AtomCandidate {
    /// Create an empty candidate for a concept.
    ///
    /// The id is freshly generated and the title is derived from the concept.
    pub fn new(concept: impl Into<String>) -> Self {
        let concept = concept.into();
        Self {
            id: generate_candidate_id(),
            suggested_title: derive_title(&concept),
            concept,
            explanation: String::new(),
            evidence: String::new(),
            tags: Vec::new(),
            related_atoms: Vec::new(),
            critique: String::new(),
            approved: false,
        }
    }

    /// Set the id. Used by tests and when restoring candidates.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Apply a patch in place.
    pub fn apply(&mut self, patch: &CandidatePatch) {
        *self = patch.apply_to(self);
    }
}

/// Generate a candidate id.
///
/// Format: `atom_<uuid v4 simple>`.
pub fn generate_candidate_id() -> String {
    format!("atom_{}", Uuid::new_v4().simple())
}

/// Derive a note title from a concept.
///
/// Capitalises the first character and truncates to [`TITLE_MAX_LENGTH`]
/// characters, ending in [`TITLE_ELLIPSIS`] when truncated. Whitespace is
/// kept as given; callers trim user input.
pub fn derive_title(concept: &str) -> String {
    let mut chars = concept.chars();
    let capitalised: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };

    if capitalised.chars().count() <= TITLE_MAX_LENGTH {
        return capitalised;
    }

    let keep = TITLE_MAX_LENGTH - TITLE_ELLIPSIS.chars().count();
    let truncated: String = capitalised.chars().take(keep).collect();
    format!("{}{}", truncated, TITLE_ELLIPSIS)
}

/// A partial update to a candidate.
///
/// `None` leaves a field untouched; `Some` replaces it, including with an
/// empty value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_atoms: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critique: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
}

impl CandidatePatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the concept.
    pub fn concept(mut self, concept: impl Into<String>) -> Self {
        self.concept = Some(concept.into());
        self
    }

    /// Replace the explanation.
    pub fn explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Replace the evidence quote.
    pub fn evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }

    /// Replace the suggested title.
    pub fn suggested_title(mut self, title: impl Into<String>) -> Self {
        self.suggested_title = Some(title.into());
        self
    }

    /// Replace the tags.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Replace the related atom titles.
    pub fn related_atoms(mut self, related: Vec<String>) -> Self {
        self.related_atoms = Some(related);
        self
    }

    /// Replace the stored critique.
    pub fn critique(mut self, critique: impl Into<String>) -> Self {
        self.critique = Some(critique.into());
        self
    }

    /// Set or withdraw approval.
    pub fn approved(mut self, approved: bool) -> Self {
        self.approved = Some(approved);
        self
    }

    /// Check if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Return a copy of `candidate` with this patch's fields applied.
    ///
    /// The id is never changed by a patch.
    pub fn apply_to(&self, candidate: &AtomCandidate) -> AtomCandidate {
        let mut updated = candidate.clone();
        if let Some(ref v) = self.concept {
            updated.concept = v.clone();
        }
        if let Some(ref v) = self.explanation {
            updated.explanation = v.clone();
        }
        if let Some(ref v) = self.evidence {
            updated.evidence = v.clone();
        }
        if let Some(ref v) = self.suggested_title {
            updated.suggested_title = v.clone();
        }
        if let Some(ref v) = self.tags {
            updated.tags = v.clone();
        }
        if let Some(ref v) = self.related_atoms {
            updated.related_atoms = v.clone();
        }
        if let Some(ref v) = self.critique {
            updated.critique = v.clone();
        }
        if let Some(v) = self.approved {
            updated.approved = v;
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_candidate_is_empty() {
        let candidate = AtomCandidate::new("testing is important");

        assert!(candidate.id.starts_with("atom_"));
        assert_eq!(candidate.concept, "testing is important");
        assert_eq!(candidate.suggested_title, "Testing is important");
        assert!(candidate.explanation.is_empty());
        assert!(candidate.evidence.is_empty());
        assert!(candidate.tags.is_empty());
        assert!(candidate.related_atoms.is_empty());
        assert!(candidate.critique.is_empty());
        assert!(!candidate.approved);
    }

    #[test]
    fn test_generated_ids_differ() {
        let ids: std::collections::HashSet<String> =
            (0..100).map(|_| generate_candidate_id()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_derive_title_long_concept() {
        let concept = "a".repeat(100);
        let title = derive_title(&concept);

        assert!(title.chars().count() <= TITLE_MAX_LENGTH);
        assert!(title.ends_with(TITLE_ELLIPSIS));
        assert!(title.starts_with('A'));
    }

    #[test]
    fn test_derive_title_exactly_max_is_untouched() {
        let concept = "b".repeat(TITLE_MAX_LENGTH);
        let title = derive_title(&concept);
        assert_eq!(title.chars().count(), TITLE_MAX_LENGTH);
        assert!(!title.ends_with(TITLE_ELLIPSIS));
    }

    #[test]
    fn test_derive_title_unicode() {
        assert_eq!(derive_title("élan vital"), "Élan vital");
        let long = "ü".repeat(120);
        let title = derive_title(&long);
        assert!(title.chars().count() <= TITLE_MAX_LENGTH);
    }

    #[test]
    fn test_derive_title_empty() {
        assert_eq!(derive_title(""), "");
    }

    #[test]
    fn test_derive_title_keeps_whitespace() {
        assert_eq!(derive_title(" spacing"), " spacing");
        assert_eq!(derive_title("spacing "), "Spacing ");

        let concept = format!("{} tail", "c".repeat(76));
        let title = derive_title(&concept);
        assert_eq!(title, format!("C{} ...", "c".repeat(75)));
    }

    #[test]
    fn test_patch_changes_only_supplied_fields() {
        let candidate = AtomCandidate::new("memory decays").with_id("atom_1");
        let patch = CandidatePatch::new().explanation("Unrehearsed memories fade over days.");

        let updated = patch.apply_to(&candidate);

        assert_eq!(updated.explanation, "Unrehearsed memories fade over days.");
        assert_eq!(updated.id, candidate.id);
        assert_eq!(updated.concept, candidate.concept);
        assert_eq!(updated.suggested_title, candidate.suggested_title);
        assert_eq!(updated.evidence, candidate.evidence);
    }

    #[test]
    fn test_patch_with_empty_string_clears_field() {
        let mut candidate = AtomCandidate::new("x");
        candidate.evidence = "quoted".to_string();

        candidate.apply(&CandidatePatch::new().evidence(""));

        assert_eq!(candidate.evidence, "");
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(CandidatePatch::new().is_empty());
        assert!(!CandidatePatch::new().approved(false).is_empty());
    }

    #[test]
    fn test_patch_deserializes_partial_json() {
        let patch: CandidatePatch =
            serde_json::from_str(r#"{"relatedAtoms": ["Spacing effect"], "approved": true}"#)
                .unwrap();
        assert_eq!(patch.related_atoms, Some(vec!["Spacing effect".to_string()]));
        assert_eq!(patch.approved, Some(true));
        assert!(patch.explanation.is_none());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: derived titles never exceed the maximum length
            #[test]
            fn prop_title_within_limit(concept in ".{0,200}") {
                prop_assert!(derive_title(&concept).chars().count() <= TITLE_MAX_LENGTH);
            }

            // Property: a patch touching only the explanation leaves every other field alone
            #[test]
            fn prop_patch_is_field_local(
                concept in "[a-z ]{1,40}",
                explanation in ".{0,80}",
                evidence in ".{0,80}",
            ) {
                let mut original = AtomCandidate::new(concept);
                original.evidence = evidence;
                let updated = CandidatePatch::new().explanation(explanation.clone()).apply_to(&original);

                prop_assert_eq!(&updated.explanation, &explanation);
                let mut expected = original.clone();
                expected.explanation = explanation;
                prop_assert_eq!(updated, expected);
            }
        }
    }
}

//! Core types and logic for Quarry.
//!
//! This module contains the atomisation workflow: phases and session types,
//! the session state machine with its candidate store, and the validation
//! and critique engines.

pub mod atom;
pub mod critique;
pub mod session;
pub mod state;
pub mod validate;

pub use atom::{derive_title, generate_candidate_id, AtomCandidate, CandidatePatch};
pub use critique::{
    build_critique_prompt, critique_candidate, generate_critique, generate_critique_with_provider,
    generate_rule_based_critique, Critique, CritiqueSource, NO_ISSUES_MESSAGE,
};
pub use session::Atomiser;
pub use state::{AtomisationSession, Phase, SourceNote};
pub use validate::{
    validate_candidate, validate_explanation, ValidationGate, ValidationResult, HEDGING_MARKERS,
};

//! Session state machine for Quarry.
//!
//! The [`Atomiser`] owns at most one [`AtomisationSession`] and is the only
//! place phases change and candidates are added, patched or removed. Callers
//! hold the `Atomiser` value explicitly; there is no global session.

use crate::core::atom::{AtomCandidate, CandidatePatch};
use crate::core::state::{AtomisationSession, Phase, SourceNote};
use crate::error::{QuarryError, Result};

/// Owner of the single live atomisation session.
#[derive(Debug, Default, Clone)]
pub struct Atomiser {
    session: Option<AtomisationSession>,
}

impl Atomiser {
    /// Create an atomiser with no session.
    pub fn new() -> Self {
        Self { session: None }
    }

    /// Wrap a previously persisted session (or none).
    pub fn from_session(session: Option<AtomisationSession>) -> Self {
        Self { session }
    }

    /// Give up ownership of the session, e.g. to persist it.
    pub fn into_session(self) -> Option<AtomisationSession> {
        self.session
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Start a new session around `source`, replacing any existing one.
    pub fn start_session(&mut self, source: SourceNote) -> &AtomisationSession {
        if let Some(ref previous) = self.session {
            tracing::debug!(
                previous = %previous.source.path,
                "replacing existing atomisation session"
            );
        }
        tracing::debug!(source = %source.path, "starting atomisation session");
        self.session.insert(AtomisationSession::new(source))
    }

    /// The current session, if any.
    pub fn session(&self) -> Option<&AtomisationSession> {
        self.session.as_ref()
    }

    /// Mutable access to the current session.
    pub fn session_mut(&mut self) -> Result<&mut AtomisationSession> {
        self.session.as_mut().ok_or(QuarryError::NoActiveSession)
    }

    /// Check if a session is live.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Discard the session. Does nothing when no session exists.
    pub fn end_session(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("atomisation session ended");
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Move one step forward. At `Complete` the phase stays `Complete`.
    pub fn advance_phase(&mut self) -> Result<Phase> {
        let session = self.session_mut()?;
        let from = session.phase;
        session.phase = from.next();
        tracing::debug!(from = %from, to = %session.phase, "phase advanced");
        Ok(session.phase)
    }

    /// Jump to any phase.
    ///
    /// Reachability from the current phase is not checked; skipping ahead
    /// (e.g. critique straight to confirmation) is a supported shortcut.
    pub fn set_phase(&mut self, phase: Phase) -> Result<()> {
        let session = self.session_mut()?;
        tracing::debug!(from = %session.phase, to = %phase, "phase set");
        session.phase = phase;
        Ok(())
    }

    /// The current phase.
    pub fn phase(&self) -> Result<Phase> {
        self.session
            .as_ref()
            .map(|s| s.phase)
            .ok_or(QuarryError::NoActiveSession)
    }

    // =========================================================================
    // Candidate store
    // =========================================================================

    /// Append a new candidate for `concept` and return a copy of it.
    pub fn add_candidate(&mut self, concept: impl Into<String>) -> Result<AtomCandidate> {
        let session = self.session_mut()?;
        let mut candidate = AtomCandidate::new(concept);
        while session.candidate(&candidate.id).is_some() {
            candidate = candidate.with_id(crate::core::atom::generate_candidate_id());
        }
        session.candidates.push(candidate.clone());
        Ok(candidate)
    }

    /// Apply `patch` to the candidate with `id`.
    ///
    /// Returns `Ok(None)` when no candidate has that id.
    pub fn update_candidate(
        &mut self,
        id: &str,
        patch: &CandidatePatch,
    ) -> Result<Option<AtomCandidate>> {
        let session = self.session_mut()?;
        let Some(candidate) = session.candidates.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        candidate.apply(patch);
        Ok(Some(candidate.clone()))
    }

    /// Remove the candidate with `id`. Returns whether anything was removed.
    ///
    /// Never fails; with no session nothing is removed.
    pub fn remove_candidate(&mut self, id: &str) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let before = session.candidates.len();
        session.candidates.retain(|c| c.id != id);
        session.candidates.len() < before
    }

    /// Look up a candidate by id.
    pub fn candidate(&self, id: &str) -> Option<&AtomCandidate> {
        self.session.as_ref().and_then(|s| s.candidate(id))
    }

    /// Mark the current session completed.
    pub fn mark_completed(&mut self) -> Result<()> {
        self.session_mut()?.completed = true;
        Ok(())
    }
}

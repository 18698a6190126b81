//! Session commands for Quarry.
//!
//! Start, inspect, move through and end the live atomisation session.

use serde::Serialize;

use crate::cli::{exit_code_for, render, CommandOptions, SessionSummary};
use crate::config::Config;
use crate::core::{Atomiser, Phase, SourceNote};
use crate::error::{exit_codes, QuarryError, Result};
use crate::storage::SessionStore;
use crate::vault::Vault;

/// Output format for the session commands.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutput {
    /// Whether the command succeeded.
    pub success: bool,
    /// Short description of what happened.
    pub message: String,
    /// The session after the command ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSummary>,
    /// Error message if the command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub exit_code: i32,
}

impl SessionOutput {
    /// Create a successful output.
    pub fn success(message: impl Into<String>, session: Option<SessionSummary>) -> Self {
        Self {
            success: true,
            message: message.into(),
            session,
            error: None,
            exit_code: exit_codes::OK,
        }
    }

    /// Create a failed output from an error.
    pub fn failure(err: &QuarryError) -> Self {
        Self {
            success: false,
            message: String::new(),
            session: None,
            error: Some(err.to_string()),
            exit_code: exit_code_for(err),
        }
    }

    fn from_result(result: Result<Self>) -> Self {
        result.unwrap_or_else(|err| Self::failure(&err))
    }

    /// Format output based on options.
    pub fn format(&self, options: &CommandOptions) -> String {
        render(self, options, Self::format_human_readable)
    }

    fn format_human_readable(&self) -> String {
        if !self.success {
            return format!(
                "Session command failed: {}\n",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }
        let mut out = format!("{}\n", self.message);
        if let Some(ref session) = self.session {
            out.push_str(&session.format_human_readable());
        }
        out
    }
}

fn summary_of(atomiser: &Atomiser) -> Option<SessionSummary> {
    atomiser.session().map(SessionSummary::from_session)
}

// =============================================================================
// start
// =============================================================================

/// Start a session on a source note.
pub struct StartCommand<S: SessionStore, V: Vault> {
    store: S,
    vault: V,
    config: Config,
}

impl<S: SessionStore, V: Vault> StartCommand<S, V> {
    /// Create a new start command.
    pub fn new(store: S, vault: V, config: Config) -> Self {
        Self {
            store,
            vault,
            config,
        }
    }

    /// Load `path` and start a session on it, replacing any live session.
    pub fn run(&self, path: &str) -> SessionOutput {
        SessionOutput::from_result(self.start(path))
    }

    fn start(&self, path: &str) -> Result<SessionOutput> {
        let source = SourceNote::load(&self.vault, path, &self.config.discovery)?;
        if source.migration_status.as_deref() != Some(self.config.discovery.quarry_status.as_str())
        {
            tracing::warn!(
                path,
                status = ?source.migration_status,
                "note is not marked as a quarry"
            );
        }

        let mut atomiser = self.store.load_atomiser()?;
        let replaced = atomiser.has_session();
        atomiser.start_session(source);
        self.store.persist(&atomiser)?;

        let message = if replaced {
            format!("Started session on {} (previous session discarded).", path)
        } else {
            format!("Started session on {}.", path)
        };
        Ok(SessionOutput::success(message, summary_of(&atomiser)))
    }
}

// =============================================================================
// status
// =============================================================================

/// Show the live session.
pub struct StatusCommand<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> StatusCommand<S> {
    /// Create a new status command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Report the live session.
    pub fn run(&self) -> SessionOutput {
        SessionOutput::from_result(self.status())
    }

    fn status(&self) -> Result<SessionOutput> {
        let atomiser = self.store.load_atomiser()?;
        let summary = summary_of(&atomiser).ok_or(QuarryError::NoActiveSession)?;
        Ok(SessionOutput::success("Active session.", Some(summary)))
    }
}

// =============================================================================
// advance / phase
// =============================================================================

/// Move the session one phase forward.
pub struct AdvanceCommand<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> AdvanceCommand<S> {
    /// Create a new advance command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Advance the phase and persist.
    pub fn run(&self) -> SessionOutput {
        SessionOutput::from_result(self.advance())
    }

    fn advance(&self) -> Result<SessionOutput> {
        let mut atomiser = self.store.load_atomiser()?;
        let from = atomiser.phase()?;
        let to = atomiser.advance_phase()?;
        self.store.persist(&atomiser)?;

        let message = if from == to {
            format!("Already at {}.", to.display_name())
        } else {
            format!("{} -> {}", from.display_name(), to.display_name())
        };
        Ok(SessionOutput::success(message, summary_of(&atomiser)))
    }
}

/// Jump the session to a named phase.
pub struct PhaseCommand<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> PhaseCommand<S> {
    /// Create a new phase command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Set the phase named `name` and persist.
    pub fn run(&self, name: &str) -> SessionOutput {
        SessionOutput::from_result(self.set(name))
    }

    fn set(&self, name: &str) -> Result<SessionOutput> {
        let phase: Phase = name.parse()?;
        let mut atomiser = self.store.load_atomiser()?;
        atomiser.set_phase(phase)?;
        self.store.persist(&atomiser)?;
        Ok(SessionOutput::success(
            format!("Phase set to {}.", phase.display_name()),
            summary_of(&atomiser),
        ))
    }
}

// =============================================================================
// end
// =============================================================================

/// Discard the live session.
pub struct EndCommand<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> EndCommand<S> {
    /// Create a new end command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// End the session. Succeeds when there is none.
    pub fn run(&self) -> SessionOutput {
        SessionOutput::from_result(self.end())
    }

    fn end(&self) -> Result<SessionOutput> {
        let mut atomiser = self.store.load_atomiser()?;
        let had_session = atomiser.has_session();
        atomiser.end_session();
        self.store.persist(&atomiser)?;

        let message = if had_session {
            "Session ended."
        } else {
            "No active session."
        };
        Ok(SessionOutput::success(message, None))
    }
}

//! Discovery commands for Quarry.
//!
//! `quarries` lists every note marked as a quarry; `pick` chooses one at
//! random and can start a session on it straight away.

use rand::Rng;
use serde::Serialize;

use crate::cli::{exit_code_for, render, CommandOptions, SessionSummary};
use crate::config::Config;
use crate::core::SourceNote;
use crate::discovery::NoteDiscovery;
use crate::error::{exit_codes, QuarryError, Result};
use crate::storage::SessionStore;
use crate::vault::Vault;

/// Options for the pick command.
#[derive(Debug, Clone, Default)]
pub struct PickOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Start a session on the picked note.
    pub start: bool,
}

impl PickOptions {
    /// The rendering options.
    pub fn output_options(&self) -> CommandOptions {
        CommandOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }
}

/// Output format for the discovery commands.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryOutput {
    /// Whether the command succeeded.
    pub success: bool,
    /// Every quarry note found (`quarries` only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    /// The randomly chosen note (`pick` only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picked: Option<String>,
    /// The session started on the picked note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionSummary>,
    /// Error message if the command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub exit_code: i32,
}

impl DiscoveryOutput {
    fn empty() -> Self {
        Self {
            success: true,
            notes: Vec::new(),
            picked: None,
            session: None,
            error: None,
            exit_code: exit_codes::OK,
        }
    }

    /// Create a listing output.
    pub fn listed(notes: Vec<String>) -> Self {
        Self {
            notes,
            ..Self::empty()
        }
    }

    /// Create a pick output.
    pub fn picked(picked: Option<String>, session: Option<SessionSummary>) -> Self {
        Self {
            picked,
            session,
            ..Self::empty()
        }
    }

    /// Create a failed output.
    pub fn failure(err: &QuarryError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            exit_code: exit_code_for(err),
            ..Self::empty()
        }
    }

    /// Format output based on options.
    pub fn format(&self, options: &CommandOptions) -> String {
        render(self, options, Self::format_human_readable)
    }

    fn format_human_readable(&self) -> String {
        if !self.success {
            return format!(
                "Discovery failed: {}\n",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }

        if let Some(ref picked) = self.picked {
            let mut out = format!("Picked: {}\n", picked);
            if let Some(ref session) = self.session {
                out.push_str(&session.format_human_readable());
            }
            return out;
        }

        if self.notes.is_empty() {
            return "No quarry notes found.\n".to_string();
        }
        let mut out = format!("{} quarry note(s):\n", self.notes.len());
        for note in &self.notes {
            out.push_str(&format!("  {}\n", note));
        }
        out
    }
}

// =============================================================================
// quarries
// =============================================================================

/// List quarry notes.
pub struct QuarriesCommand<V: Vault> {
    vault: V,
    discovery: NoteDiscovery,
}

impl<V: Vault> QuarriesCommand<V> {
    /// Create a new quarries command.
    pub fn new(vault: V, config: Config) -> Self {
        Self {
            vault,
            discovery: NoteDiscovery::new(config.discovery),
        }
    }

    /// List every quarry note, sorted.
    pub fn run(&self) -> DiscoveryOutput {
        match self.discovery.find_quarry_notes(&self.vault) {
            Ok(notes) => DiscoveryOutput::listed(notes),
            Err(err) => DiscoveryOutput::failure(&err),
        }
    }
}

// =============================================================================
// pick
// =============================================================================

/// Pick a random quarry note.
pub struct PickCommand<S: SessionStore, V: Vault> {
    store: S,
    vault: V,
    config: Config,
}

impl<S: SessionStore, V: Vault> PickCommand<S, V> {
    /// Create a new pick command.
    pub fn new(store: S, vault: V, config: Config) -> Self {
        Self {
            store,
            vault,
            config,
        }
    }

    /// Pick a note, starting a session on it when `options.start` is set.
    pub fn run(&self, options: &PickOptions) -> DiscoveryOutput {
        self.run_with_rng(options, &mut rand::thread_rng())
    }

    /// [`PickCommand::run`] with a caller-supplied RNG.
    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        options: &PickOptions,
        rng: &mut R,
    ) -> DiscoveryOutput {
        self.pick(options, rng)
            .unwrap_or_else(|err| DiscoveryOutput::failure(&err))
    }

    fn pick<R: Rng + ?Sized>(&self, options: &PickOptions, rng: &mut R) -> Result<DiscoveryOutput> {
        let discovery = NoteDiscovery::new(self.config.discovery.clone());
        let Some(path) = discovery.pick_random_with(&self.vault, rng)? else {
            return Ok(DiscoveryOutput::picked(None, None));
        };

        if !options.start {
            return Ok(DiscoveryOutput::picked(Some(path), None));
        }

        let source = SourceNote::load(&self.vault, &path, &self.config.discovery)?;
        let mut atomiser = self.store.load_atomiser()?;
        atomiser.start_session(source);
        self.store.persist(&atomiser)?;

        let summary = atomiser.session().map(SessionSummary::from_session);
        Ok(DiscoveryOutput::picked(Some(path), summary))
    }
}

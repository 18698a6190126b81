//! Local-bridge provider for Quarry.
//!
//! Runs a local command (by default `claude -p`) with the prompt on stdin
//! and reads the completion from stdout. No network client is involved;
//! authentication is whatever the command itself uses.

use std::env;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{QuarryError, Result};
use crate::providers::traits::{ProviderType, TextGenerator};

/// Provider that shells out to a local command.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    /// Program to run.
    command: String,
    /// Arguments passed before the prompt is written to stdin.
    args: Vec<String>,
    /// Working directory for the command, if any.
    working_dir: Option<PathBuf>,
}

impl CommandProvider {
    /// Create a provider for `command` with `args`.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            working_dir: None,
        }
    }

    /// Run the command from `dir`.
    pub fn with_working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// The configured program.
    pub fn command(&self) -> &str {
        &self.command
    }

    fn invoke(&self, prompt: &str) -> std::result::Result<String, String> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| format!("{} not available: {}", self.command, e))?;

        // A command may exit without reading its input; its exit status decides.
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(prompt.as_bytes()) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(format!("failed to write prompt to {}: {}", self.command, e)),
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| format!("failed to wait for {}: {}", self.command, e))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            ))
        }
    }
}

impl TextGenerator for CommandProvider {
    fn is_available(&self) -> bool {
        resolve_program(&self.command).is_some()
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(command = %self.command, prompt_chars = prompt.len(), "invoking local bridge");
        self.invoke(prompt).map_err(QuarryError::provider)
    }

    fn name(&self) -> &'static str {
        "local-bridge"
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::LocalBridge
    }
}

/// Find `program` on `PATH`, or check it directly when it contains a path
/// separator.
fn resolve_program(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }

    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }

    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

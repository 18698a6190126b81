//! Text-generation provider trait for Quarry.
//!
//! A provider turns a prompt into completion text. Critique generation is
//! the only caller. Implementations report failures as provider errors,
//! which are recoverable and end in the rule-based critique.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which provider implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProviderType {
    /// No provider; critiques are always rule-based.
    #[default]
    #[serde(rename = "none")]
    None,
    /// A local command that reads the prompt on stdin.
    #[serde(rename = "local-bridge")]
    LocalBridge,
    /// Anthropic API.
    #[serde(rename = "anthropic")]
    Anthropic,
    /// OpenAI API.
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderType {
    /// Get the provider name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::LocalBridge => "local-bridge",
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }

    /// Parse a provider name from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "off" | "" => Some(Self::None),
            "local-bridge" | "local_bridge" | "localbridge" | "local" => Some(Self::LocalBridge),
            "anthropic" | "claude" => Some(Self::Anthropic),
            "openai" | "open-ai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for text-generation providers.
///
/// Implementations must be thread-safe.
pub trait TextGenerator: Send + Sync {
    /// Whether the provider can currently be called.
    ///
    /// Must not perform the generation itself.
    fn is_available(&self) -> bool;

    /// Complete `prompt` and return the generated text.
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Provider name for logging and critique attribution.
    fn name(&self) -> &'static str;

    /// The provider's type.
    fn provider_type(&self) -> ProviderType;
}

/// Blanket implementation for boxed trait objects.
impl TextGenerator for Box<dyn TextGenerator> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn provider_type(&self) -> ProviderType {
        (**self).provider_type()
    }
}

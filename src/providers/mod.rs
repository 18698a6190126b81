//! Text-generation providers for Quarry.
//!
//! Available providers:
//! - **none**: Always unavailable; critiques are rule-based (default)
//! - **local-bridge**: Runs a local command with the prompt on stdin
//! - **anthropic** / **openai**: Recognised in config, but no HTTP client is
//!   built in, so they resolve to the disabled provider

pub mod command;
pub mod disabled;
pub mod mock;
pub mod traits;

pub use command::CommandProvider;
pub use disabled::DisabledProvider;
pub use mock::MockGenerator;
pub use traits::{ProviderType, TextGenerator};

use crate::config::ProviderConfig;

/// Build the provider described by `config`.
///
/// Never fails: configurations that cannot be served produce a
/// [`DisabledProvider`] and a warning.
pub fn create_provider(config: &ProviderConfig) -> Box<dyn TextGenerator> {
    match config.provider_type {
        ProviderType::None => Box::new(DisabledProvider),
        ProviderType::LocalBridge => {
            let provider = CommandProvider::new(&config.command, config.args.clone());
            if !provider.is_available() {
                tracing::warn!(
                    command = %config.command,
                    "local-bridge command not found on PATH"
                );
            }
            Box::new(provider)
        }
        ProviderType::Anthropic | ProviderType::OpenAi => {
            tracing::warn!(
                provider = %config.provider_type,
                "direct API providers are not built in; use provider_type = \"local-bridge\""
            );
            Box::new(DisabledProvider)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_none() {
        let provider = create_provider(&ProviderConfig::default());
        assert_eq!(provider.provider_type(), ProviderType::None);
        assert!(!provider.is_available());
    }

    #[test]
    fn test_create_local_bridge() {
        let config = ProviderConfig {
            provider_type: ProviderType::LocalBridge,
            command: "quarry-no-such-program-xyz".to_string(),
            ..ProviderConfig::default()
        };
        let provider = create_provider(&config);
        assert_eq!(provider.provider_type(), ProviderType::LocalBridge);
        assert!(!provider.is_available());
    }

    #[test]
    fn test_create_api_providers_disabled() {
        for provider_type in [ProviderType::Anthropic, ProviderType::OpenAi] {
            let config = ProviderConfig {
                provider_type,
                api_key: Some("sk-test".to_string()),
                ..ProviderConfig::default()
            };
            let provider = create_provider(&config);
            assert_eq!(provider.name(), "none");
            assert!(!provider.is_available());
        }
    }
}

//! Provider that is never available.

use crate::error::{QuarryError, Result};
use crate::providers::traits::{ProviderType, TextGenerator};

/// Stand-in used when no provider is configured, or the configured one
/// cannot be built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisabledProvider;

impl TextGenerator for DisabledProvider {
    fn is_available(&self) -> bool {
        false
    }

    fn complete(&self, _prompt: &str) -> Result<String> {
        Err(QuarryError::provider("no text-generation provider configured"))
    }

    fn name(&self) -> &'static str {
        "none"
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_provider() {
        let provider = DisabledProvider;
        assert!(!provider.is_available());
        assert!(provider.complete("anything").unwrap_err().is_recoverable());
        assert_eq!(provider.provider_type(), ProviderType::None);
    }
}

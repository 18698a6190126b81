//! Scripted provider for tests and dry runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{QuarryError, Result};
use crate::providers::traits::{ProviderType, TextGenerator};

/// Provider that returns a fixed response (or error) and records prompts.
#[derive(Debug)]
pub struct MockGenerator {
    response: std::result::Result<String, String>,
    available: bool,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    /// A mock that always answers `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            available: true,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A mock whose completions always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            ..Self::new("")
        }
    }

    /// Mark the mock unavailable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Number of `complete` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl TextGenerator for MockGenerator {
    fn is_available(&self) -> bool {
        self.available
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.response.clone().map_err(QuarryError::provider)
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::None
    }
}

//! Language model abstraction
//!
//! The analyzer only needs one capability from a model: take a long prompt
//! and return raw text that is expected to parse as JSON. Providers
//! implement that behind [`LanguageModel`] so the pipeline can be exercised
//! against a mock.

use crate::error::AppResult;

pub mod gemini;

pub use gemini::GeminiClient;

/// Sampling options for a structured generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    /// Ask the provider to constrain output to JSON
    pub force_json: bool,
}

impl GenerationOptions {
    /// Temperature 0 with forced JSON output
    pub fn deterministic_json() -> Self {
        Self {
            temperature: 0.0,
            force_json: true,
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::deterministic_json()
    }
}

/// Trait for generative language model providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `prompt`, returning the raw response text
    async fn generate_structured(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

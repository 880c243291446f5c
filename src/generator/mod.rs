//! LLM completion clients used to answer questions and segment transcripts.

use anyhow::Result;

mod anthropic;
mod openai;

pub use anthropic::AnthropicGenerator;
pub use openai::OpenAiGenerator;

/// Single-shot text generation.
pub trait Generator: Send + Sync {
    /// Returns the model's reply to `prompt`.
    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Sampling settings shared by the providers.
#[derive(Debug, Clone, Copy)]
pub struct Sampling {
    /// Sampling temperature; `None` leaves the provider default.
    pub temperature: Option<f32>,
    /// Maximum completion tokens.
    pub max_tokens: usize,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            temperature: None,
            max_tokens: 1200,
        }
    }
}

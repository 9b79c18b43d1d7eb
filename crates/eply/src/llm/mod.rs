//! Text completion capability
//!
//! The drafting pipeline only needs "prompt in, text out". Components take
//! an `Arc<dyn Completion>` at construction so tests can swap in fakes.

mod openai;

pub use openai::OpenAiClient;

use anyhow::Result;

/// A single completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_tokens: 800,
            temperature: 0.7,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Something that turns a prompt into generated text
///
/// Implementations make exactly one attempt per call; quota, network and
/// model failures are returned as errors.
pub trait Completion: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

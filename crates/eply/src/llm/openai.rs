//! OpenAI-compatible chat completions client
//!
//! Uses synchronous HTTP (ureq) like the Gmail client, so the whole
//! pipeline stays executor-agnostic.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Completion, CompletionRequest};
use crate::config::CompletionConfig;

/// Client for `POST {base_url}/chat/completions`
pub struct OpenAiClient {
    agent: ureq::Agent,
    api_key: String,
    model: String,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client from loaded configuration
    pub fn new(config: &CompletionConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();

        Self {
            agent,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: chat_endpoint(&config.base_url),
        }
    }

    /// Model name sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Completion for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = build_chat_request(&self.model, request);

        let mut response = self
            .agent
            .post(self.endpoint.as_str())
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&body)
            .map_err(|e| match e {
                ureq::Error::StatusCode(401 | 403) => {
                    anyhow::anyhow!("Completion provider rejected the API key")
                }
                ureq::Error::StatusCode(429) => {
                    anyhow::anyhow!("Completion provider quota or rate limit exceeded")
                }
                other => anyhow::anyhow!("Failed to send completion request: {}", other),
            })?;

        let chat: ChatResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse completion response")?;

        extract_content(chat)
    }
}

fn chat_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn build_chat_request<'a>(model: &'a str, request: &'a CompletionRequest) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(2);
    if !request.system_prompt.is_empty() {
        messages.push(ChatMessage {
            role: "system",
            content: &request.system_prompt,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: &request.user_prompt,
    });

    ChatRequest {
        model,
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
    }
}

fn extract_content(chat: ChatResponse) -> Result<String> {
    let choice = chat
        .choices
        .into_iter()
        .next()
        .context("Completion response contained no choices")?;
    Ok(choice.message.content.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_endpoint_handles_trailing_slash() {
        assert_eq!(
            chat_endpoint("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            chat_endpoint("http://localhost:11434/v1"),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_build_chat_request_shape() {
        let request = CompletionRequest::new("be brief", "hello")
            .max_tokens(500)
            .temperature(0.2);
        let body = serde_json::to_value(build_chat_request("gpt-4o", &request)).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "be brief");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_build_chat_request_skips_empty_system() {
        let request = CompletionRequest::new("", "hello");
        let body = build_chat_request("m", &request);
        assert_eq!(body.messages.len(), 1);
    }

    #[test]
    fn test_extract_content() {
        let chat: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(chat).unwrap(), "Hi!");
    }

    #[test]
    fn test_extract_content_without_choices_fails() {
        let chat: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(extract_content(chat).is_err());
    }
}

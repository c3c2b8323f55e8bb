// Claude Messages API implementation.
//
// One POST per completion. The API key and version headers are set on each
// request builder, never as client-wide defaults, so concurrent requests
// can't observe each other's headers.
//
// API docs: https://docs.anthropic.com/en/api/messages

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{GenerationError, TextGenerator};

/// Default value for the `anthropic-version` header.
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Default cap on generated tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Connection settings for the Messages endpoint.
#[derive(Debug, Clone)]
pub struct ClaudeSettings {
    /// Full endpoint URL, e.g. `https://api.anthropic.com/v1/messages`.
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub api_version: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Claude Messages API client.
pub struct ClaudeClient {
    client: Client,
    settings: ClaudeSettings,
}

impl ClaudeClient {
    pub fn new(settings: ClaudeSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("sieve/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, settings })
    }
}

#[async_trait]
impl TextGenerator for ClaudeClient {
    async fn complete(
        &self,
        prompt: &str,
        system_message: &str,
    ) -> Result<String, GenerationError> {
        let request = MessagesRequest::new(
            &self.settings.model,
            self.settings.max_tokens,
            prompt,
            system_message,
        );

        let response = self
            .client
            .post(&self.settings.api_url)
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", &self.settings.api_version)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)?;
        let text = parsed.first_text().ok_or(GenerationError::EmptyResponse)?;

        debug!(
            model = %self.settings.model,
            chars = text.chars().count(),
            "Received completion"
        );

        Ok(text.to_string())
    }
}

// --- Messages API request/response types ---

#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub messages: Vec<Message<'a>>,
}

impl<'a> MessagesRequest<'a> {
    pub fn new(
        model: &'a str,
        max_tokens: u32,
        prompt: &'a str,
        system_message: &'a str,
    ) -> Self {
        Self {
            model,
            max_tokens,
            messages: vec![
                Message {
                    role: "system",
                    content: system_message,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// The part of a Messages response this proxy depends on. A body without a
/// `content` array fails to deserialize and surfaces as a parse error.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

impl MessagesResponse {
    /// The first non-blank text segment, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        })
    }
}

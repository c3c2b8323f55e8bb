use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::generation::claude;
use crate::moderation::azure;

/// Default bound on each upstream call, in seconds.
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Variables that must be present (and non-blank) for the proxy to start.
const REQUIRED_VARS: [&str; 5] = [
    "CLAUDE_API_KEY",
    "CLAUDE_API_URL",
    "CLAUDE_MODEL",
    "CONTENT_SAFETY_KEY",
    "CONTENT_SAFETY_ENDPOINT",
];

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy. Once loaded, the struct
/// is read-only and shared by every request.
#[derive(Debug, Clone)]
pub struct Config {
    pub claude_api_key: String,
    /// Full Messages endpoint URL (e.g. https://api.anthropic.com/v1/messages)
    pub claude_api_url: String,
    pub claude_model: String,
    pub claude_max_tokens: u32,
    /// Sent as the `anthropic-version` header
    pub anthropic_version: String,
    pub content_safety_key: String,
    /// Content Safety resource endpoint (e.g. https://x.cognitiveservices.azure.com)
    pub content_safety_endpoint: String,
    pub content_safety_api_version: String,
    /// Upper bound on every moderation and generation call
    pub upstream_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Fails if any required variable is missing. Every missing name is
    /// reported at once so a fresh deployment can be fixed in one pass.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|&name| get(name).is_none())
            .collect();
        if !missing.is_empty() {
            anyhow::bail!(
                "Missing required configuration: {}\n\
                 Add them to your .env file. See .env.example for the required variables.",
                missing.join(", ")
            );
        }
        let required = |name: &str| get(name).unwrap_or_default();

        let claude_max_tokens = match get("CLAUDE_MAX_TOKENS") {
            Some(raw) => raw.parse::<u32>().with_context(|| {
                format!("CLAUDE_MAX_TOKENS must be a positive integer, got {raw:?}")
            })?,
            None => claude::DEFAULT_MAX_TOKENS,
        };
        if claude_max_tokens == 0 {
            anyhow::bail!("CLAUDE_MAX_TOKENS must be greater than zero");
        }

        let timeout_secs = match get("SIEVE_UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().with_context(|| {
                format!(
                    "SIEVE_UPSTREAM_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                )
            })?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            anyhow::bail!("SIEVE_UPSTREAM_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            claude_api_key: required("CLAUDE_API_KEY"),
            claude_api_url: required("CLAUDE_API_URL"),
            claude_model: required("CLAUDE_MODEL"),
            claude_max_tokens,
            anthropic_version: get("ANTHROPIC_VERSION")
                .unwrap_or_else(|| claude::DEFAULT_API_VERSION.to_string()),
            content_safety_key: required("CONTENT_SAFETY_KEY"),
            content_safety_endpoint: required("CONTENT_SAFETY_ENDPOINT"),
            content_safety_api_version: get("CONTENT_SAFETY_API_VERSION")
                .unwrap_or_else(|| azure::DEFAULT_API_VERSION.to_string()),
            upstream_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Settings for the Claude client.
    pub fn claude_settings(&self) -> claude::ClaudeSettings {
        claude::ClaudeSettings {
            api_url: self.claude_api_url.clone(),
            api_key: self.claude_api_key.clone(),
            model: self.claude_model.clone(),
            api_version: self.anthropic_version.clone(),
            max_tokens: self.claude_max_tokens,
            timeout: self.upstream_timeout,
        }
    }

    /// Key/value pairs safe to print: API keys are masked.
    pub fn redacted_summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("CLAUDE_API_URL", self.claude_api_url.clone()),
            ("CLAUDE_API_KEY", mask_secret(&self.claude_api_key)),
            ("CLAUDE_MODEL", self.claude_model.clone()),
            ("CLAUDE_MAX_TOKENS", self.claude_max_tokens.to_string()),
            ("ANTHROPIC_VERSION", self.anthropic_version.clone()),
            ("CONTENT_SAFETY_ENDPOINT", self.content_safety_endpoint.clone()),
            ("CONTENT_SAFETY_KEY", mask_secret(&self.content_safety_key)),
            (
                "CONTENT_SAFETY_API_VERSION",
                self.content_safety_api_version.clone(),
            ),
            (
                "SIEVE_UPSTREAM_TIMEOUT_SECS",
                self.upstream_timeout.as_secs().to_string(),
            ),
        ]
    }
}

/// Show only the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(count - 4))
}

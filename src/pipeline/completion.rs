// Moderated completion: validate → moderate input → generate → moderate output.
//
// Each stage gates the next. A request that fails a stage never reaches the
// ones after it, so a flagged prompt is never sent to Claude and a flagged
// completion is never returned to the caller.
//
// Moderation is fail-closed: a moderation error or timeout blocks exactly
// like a positive result. Upstream error detail goes to the log, never into
// the CompletionResult.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::generation::claude::ClaudeClient;
use crate::generation::traits::{GenerationError, TextGenerator};
use crate::moderation::azure::AzureContentSafety;
use crate::moderation::traits::{
    ContentModerator, ModerationError, ModerationVerdict, SEVERITY_THRESHOLD,
};
use crate::output::truncate_chars;

pub const MSG_VALIDATION_FAILED: &str = "Prompt is required.";
pub const MSG_INPUT_REJECTED: &str = "Input content violates content safety guidelines.";
pub const MSG_GENERATION_FAILED: &str = "Failed to get response from Claude API.";
pub const MSG_OUTPUT_REJECTED: &str = "LLM response violates content safety guidelines.";
pub const MSG_SUCCEEDED: &str = "Content processed successfully.";

/// A prompt to run through the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    /// May be empty.
    pub system_message: String,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, system_message: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_message: system_message.into(),
        }
    }

    /// A prompt is valid when it has at least one non-whitespace character.
    pub fn is_valid(&self) -> bool {
        !self.prompt.trim().is_empty()
    }
}

/// Terminal state of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    ValidationFailed,
    InputRejected(ModerationVerdict),
    GenerationFailed,
    OutputRejected(ModerationVerdict),
    Succeeded(String),
}

impl Outcome {
    /// Caller-facing status message.
    pub fn message(&self) -> &'static str {
        match self {
            Outcome::ValidationFailed => MSG_VALIDATION_FAILED,
            Outcome::InputRejected(_) => MSG_INPUT_REJECTED,
            Outcome::GenerationFailed => MSG_GENERATION_FAILED,
            Outcome::OutputRejected(_) => MSG_OUTPUT_REJECTED,
            Outcome::Succeeded(_) => MSG_SUCCEEDED,
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::ValidationFailed => "validation_failed",
            Outcome::InputRejected(_) => "input_rejected",
            Outcome::GenerationFailed => "generation_failed",
            Outcome::OutputRejected(_) => "output_rejected",
            Outcome::Succeeded(_) => "succeeded",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }
}

/// The result returned to callers. Serializes to
/// `{isSuccess, message, llmResponse}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionResult {
    #[serde(rename = "isSuccess")]
    pub success: bool,
    pub message: String,
    #[serde(rename = "llmResponse")]
    pub generated_text: Option<String>,
}

impl From<&Outcome> for CompletionResult {
    fn from(outcome: &Outcome) -> Self {
        let generated_text = match outcome {
            Outcome::Succeeded(text) => Some(text.clone()),
            _ => None,
        };
        Self {
            success: outcome.is_success(),
            message: outcome.message().to_string(),
            generated_text,
        }
    }
}

impl From<Outcome> for CompletionResult {
    fn from(outcome: Outcome) -> Self {
        Self::from(&outcome)
    }
}

/// Tunables for the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Per-category severity at or above which content is blocked
    pub severity_threshold: u8,
    /// Upper bound on each external call
    pub call_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            severity_threshold: SEVERITY_THRESHOLD,
            call_timeout: Duration::from_secs(crate::config::DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

/// Which side of the generation call a moderation check screens.
#[derive(Debug, Clone, Copy)]
enum Stage {
    Input,
    Output,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Input => "input",
            Stage::Output => "output",
        }
    }
}

/// The moderation-gated completion pipeline.
///
/// Holds only shared, read-only collaborators, so one instance serves every
/// concurrent request.
#[derive(Clone)]
pub struct ModeratedCompletion {
    moderator: Arc<dyn ContentModerator>,
    generator: Arc<dyn TextGenerator>,
    options: PipelineOptions,
}

impl ModeratedCompletion {
    pub fn new(
        moderator: Arc<dyn ContentModerator>,
        generator: Arc<dyn TextGenerator>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            moderator,
            generator,
            options,
        }
    }

    /// Wire the production clients from a loaded config.
    pub fn from_config(config: &Config) -> Result<Self> {
        let moderator = AzureContentSafety::new(
            &config.content_safety_endpoint,
            config.content_safety_key.clone(),
            config.content_safety_api_version.clone(),
            config.upstream_timeout,
        )?;
        let generator = ClaudeClient::new(config.claude_settings())?;
        let options = PipelineOptions {
            call_timeout: config.upstream_timeout,
            ..PipelineOptions::default()
        };

        Ok(Self::new(Arc::new(moderator), Arc::new(generator), options))
    }

    /// Run one request to a terminal outcome. Never returns an error:
    /// every upstream failure is folded into the outcome.
    pub async fn execute(&self, request: &CompletionRequest) -> Outcome {
        if !request.is_valid() {
            debug!("Rejecting request with empty prompt");
            return Outcome::ValidationFailed;
        }

        let verdict = self.moderate(&request.prompt, Stage::Input).await;
        if !verdict.allowed {
            return Outcome::InputRejected(verdict);
        }

        let text = match self.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Generation failed");
                return Outcome::GenerationFailed;
            }
        };

        let verdict = self.moderate(&text, Stage::Output).await;
        if !verdict.allowed {
            // The completion is dropped here and never reaches the caller.
            return Outcome::OutputRejected(verdict);
        }

        Outcome::Succeeded(text)
    }

    /// Screen `text` and reduce the provider's scores to a verdict.
    async fn moderate(&self, text: &str, stage: Stage) -> ModerationVerdict {
        info!(stage = stage.as_str(), "Requesting moderation");
        debug!(
            stage = stage.as_str(),
            text_preview = %truncate_chars(text, 50),
            "Moderation payload"
        );

        let timeout = self.options.call_timeout;
        let result = bounded(timeout, self.moderator.analyze(text))
            .await
            .unwrap_or_else(|| Err(ModerationError::Timeout(timeout)));

        match result {
            Ok(categories) => {
                let verdict =
                    ModerationVerdict::evaluate(&categories, self.options.severity_threshold);
                if verdict.allowed {
                    info!(stage = stage.as_str(), "Content passed moderation");
                } else {
                    warn!(
                        stage = stage.as_str(),
                        category = verdict.violated_category.as_deref().unwrap_or(""),
                        severity = verdict.severity.unwrap_or_default(),
                        "Content flagged by moderation"
                    );
                }
                verdict
            }
            Err(e) => {
                warn!(
                    stage = stage.as_str(),
                    error = %e,
                    "Moderation call failed, blocking content"
                );
                ModerationVerdict::unavailable()
            }
        }
    }

    async fn generate(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        info!("Requesting completion");

        let timeout = self.options.call_timeout;
        let text = bounded(
            timeout,
            self.generator
                .complete(&request.prompt, &request.system_message),
        )
        .await
        .unwrap_or_else(|| Err(GenerationError::Timeout(timeout)))?;

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        info!(chars = text.chars().count(), "Completion received");
        Ok(text)
    }
}

/// Await `fut` for at most `timeout`. `None` means the deadline passed and
/// the future was dropped.
async fn bounded<F: Future>(timeout: Duration, fut: F) -> Option<F::Output> {
    tokio::time::timeout(timeout, fut).await.ok()
}

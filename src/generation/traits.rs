// Text generator trait.
//
// Mirrors the moderation side: the pipeline holds an Arc<dyn TextGenerator>
// and never knows which provider sits behind it.

use async_trait::async_trait;
use thiserror::Error;

/// Errors a generation provider can report. Every variant maps to the
/// "generation failed" outcome.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse generation response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("generation response contained no text")]
    EmptyResponse,

    #[error("generation call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply to `prompt` under `system_message`. An empty
    /// completion is an error, never `Ok("")`.
    async fn complete(&self, prompt: &str, system_message: &str)
        -> Result<String, GenerationError>;
}

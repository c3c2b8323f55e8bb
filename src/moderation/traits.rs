// Moderation trait and the severity decision rule.
//
// Providers return one severity per harm category. Whether that adds up to
// "allowed" is decided here, by the proxy, against SEVERITY_THRESHOLD, not
// by the provider.

use async_trait::async_trait;
use thiserror::Error;

/// Minimum per-category severity at which content counts as a violation.
///
/// Azure AI Content Safety reports severities on a 0–7 scale (0, 2, 4, 6 in
/// its default four-level output). Anything at or above 4 (medium) blocks.
pub const SEVERITY_THRESHOLD: u8 = 4;

/// One category score from a moderation analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySeverity {
    pub category: String,
    pub severity: u8,
}

impl CategorySeverity {
    pub fn new(category: impl Into<String>, severity: u8) -> Self {
        Self {
            category: category.into(),
            severity,
        }
    }
}

/// Errors a moderation provider can report. Every variant is treated as
/// "not allowed" by the pipeline.
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("moderation request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("moderation service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse moderation response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("moderation call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// The decision reached for one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationVerdict {
    pub allowed: bool,
    /// The highest-severity category at or above the threshold, if any.
    pub violated_category: Option<String>,
    pub severity: Option<u8>,
}

impl ModerationVerdict {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            violated_category: None,
            severity: None,
        }
    }

    pub fn violation(category: impl Into<String>, severity: u8) -> Self {
        Self {
            allowed: false,
            violated_category: Some(category.into()),
            severity: Some(severity),
        }
    }

    /// Verdict for a moderation call that failed. Fail-closed: blocks
    /// without naming a category.
    pub fn unavailable() -> Self {
        Self {
            allowed: false,
            violated_category: None,
            severity: None,
        }
    }

    /// Apply the threshold rule: allowed iff every category is strictly
    /// below `threshold`. An empty analysis is allowed.
    ///
    /// When several categories violate, the most severe one is reported
    /// (first one wins on ties).
    pub fn evaluate(categories: &[CategorySeverity], threshold: u8) -> Self {
        let worst = categories
            .iter()
            .filter(|c| c.severity >= threshold)
            .fold(None::<&CategorySeverity>, |worst, c| match worst {
                Some(w) if w.severity >= c.severity => Some(w),
                _ => Some(c),
            });

        match worst {
            Some(c) => Self::violation(c.category.clone(), c.severity),
            None => Self::allowed(),
        }
    }
}

/// Trait for screening text against harm categories. Implementations are
/// async because every real provider is a network call.
#[async_trait]
pub trait ContentModerator: Send + Sync {
    /// Score `text` and return one severity per category the provider
    /// reported.
    async fn analyze(&self, text: &str) -> Result<Vec<CategorySeverity>, ModerationError>;
}

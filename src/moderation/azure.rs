// Azure AI Content Safety implementation.
//
// The text:analyze operation scores text against four harm categories
// (Hate, SelfHarm, Sexual, Violence) and returns one severity per category.
// With the default FourSeverityLevels output the severities are 0, 2, 4 or 6.
//
// API docs: https://learn.microsoft.com/azure/ai-services/content-safety/

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{CategorySeverity, ContentModerator, ModerationError};
use crate::output::truncate_chars;

/// Default `api-version` query parameter for text:analyze.
pub const DEFAULT_API_VERSION: &str = "2023-10-01";

/// Header carrying the resource key.
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Azure AI Content Safety moderator.
pub struct AzureContentSafety {
    client: Client,
    endpoint: String,
    api_key: String,
    api_version: String,
}

impl AzureContentSafety {
    /// Create a client for the Content Safety resource at `endpoint`
    /// (e.g. `https://my-resource.cognitiveservices.azure.com`).
    pub fn new(
        endpoint: &str,
        api_key: String,
        api_version: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("sieve/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            api_version,
        })
    }

    fn analyze_url(&self) -> String {
        format!("{}/contentsafety/text:analyze", self.endpoint)
    }
}

#[async_trait]
impl ContentModerator for AzureContentSafety {
    async fn analyze(&self, text: &str) -> Result<Vec<CategorySeverity>, ModerationError> {
        let request = AnalyzeTextRequest {
            text,
            output_type: "FourSeverityLevels",
        };

        // The key goes on this request only; the pooled client carries no auth state.
        let response = self
            .client
            .post(self.analyze_url())
            .query(&[("api-version", self.api_version.as_str())])
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ModerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AnalyzeTextResponse = serde_json::from_str(&body)?;

        debug!(
            categories = parsed.categories_analysis.len(),
            text_preview = %truncate_chars(text, 50),
            "Analyzed text"
        );

        Ok(parsed
            .categories_analysis
            .into_iter()
            .map(|c| CategorySeverity::new(c.category, c.severity))
            .collect())
    }
}

// --- Content Safety request/response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeTextRequest<'a> {
    text: &'a str,
    output_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeTextResponse {
    #[serde(default)]
    pub categories_analysis: Vec<CategoryAnalysis>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryAnalysis {
    pub category: String,
    pub severity: u8,
}

// Hugging Face Inference API implementation of NeuralScorer.
//
// Toxicity comes from a Jigsaw-style multi-label classifier
// (default unitary/toxic-bert), sentiment from a 3-class classifier
// (default cardiffnlp/twitter-xlm-roberta-base-sentiment, which handles
// Kannada and Hindi as well as English).
//
// API docs: https://huggingface.co/docs/api-inference/tasks/text-classification

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::traits::{NeuralScorer, SentimentDistribution, ToxicityLabel, ToxicityLabelSet};
use crate::output::truncate_chars;

pub const DEFAULT_API_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_TOXICITY_MODEL: &str = "unitary/toxic-bert";
pub const DEFAULT_SENTIMENT_MODEL: &str = "cardiffnlp/twitter-xlm-roberta-base-sentiment";

/// Settings for the Hugging Face scorer.
#[derive(Debug, Clone)]
pub struct HuggingFaceSettings {
    pub api_url: String,
    pub api_token: String,
    pub toxicity_model: String,
    pub sentiment_model: String,
    /// Transport-level timeout. The adapter applies its own bound on top.
    pub request_timeout: Duration,
    pub requests_per_second: Option<f64>,
}

pub struct HuggingFaceScorer {
    client: Client,
    settings: HuggingFaceSettings,
    rate_limiter: Option<RateLimiter>,
}

impl HuggingFaceScorer {
    pub fn new(settings: HuggingFaceSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let rate_limiter = settings
            .requests_per_second
            .map(RateLimiter::new)
            .transpose()?;
        Ok(Self {
            client,
            settings,
            rate_limiter,
        })
    }

    /// Run a text-classification model and return its (label, score) pairs.
    async fn classify(&self, model: &str, text: &str, top_k: usize) -> Result<Vec<LabelScore>> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let url = format!(
            "{}/models/{}",
            self.settings.api_url.trim_end_matches('/'),
            model
        );

        let request = ClassificationRequest {
            inputs: text,
            parameters: Parameters { top_k },
            options: Options {
                wait_for_model: true,
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_token)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to call inference API for {model}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Inference API returned {} for {}: {}", status, model, body);
        }

        let parsed: ClassificationResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse inference response for {model}"))?;

        Ok(parsed.into_scores())
    }
}

#[async_trait]
impl NeuralScorer for HuggingFaceScorer {
    async fn score_toxicity(&self, text: &str) -> Result<ToxicityLabelSet> {
        let scores = self
            .classify(&self.settings.toxicity_model, text, ToxicityLabel::ALL.len())
            .await?;
        let labels = toxicity_from_scores(&scores)?;

        debug!(
            toxicity = ?labels.max(),
            threat = ?labels.get(ToxicityLabel::Threat),
            text_preview = %truncate_chars(text, 50),
            "Neural toxicity scored"
        );

        Ok(labels)
    }

    async fn score_sentiment(&self, text: &str) -> Result<SentimentDistribution> {
        let scores = self
            .classify(&self.settings.sentiment_model, text, 3)
            .await?;
        sentiment_from_scores(&scores)
    }
}

/// Map classifier output onto the Jigsaw label set, ignoring labels we don't model.
pub fn toxicity_from_scores(scores: &[LabelScore]) -> Result<ToxicityLabelSet> {
    let mut labels = ToxicityLabelSet::new();
    for score in scores {
        if let Some(label) = ToxicityLabel::from_model_label(&score.label) {
            labels.set(label, score.score);
        }
    }
    if labels.is_empty() {
        anyhow::bail!("Toxicity model returned no recognizable labels");
    }
    Ok(labels)
}

/// Map classifier output onto negative/neutral/positive.
///
/// Accepts named labels and the positional `LABEL_0..LABEL_2` form.
/// A binary model simply leaves `neutral` at zero.
pub fn sentiment_from_scores(scores: &[LabelScore]) -> Result<SentimentDistribution> {
    let mut distribution = SentimentDistribution::default();
    let mut recognized = false;
    for score in scores {
        let slot = match score.label.trim().to_lowercase().as_str() {
            "negative" | "label_0" => &mut distribution.negative,
            "neutral" | "label_1" => &mut distribution.neutral,
            "positive" | "label_2" => &mut distribution.positive,
            _ => continue,
        };
        *slot = score.score.clamp(0.0, 1.0);
        recognized = true;
    }
    if !recognized {
        anyhow::bail!("Sentiment model returned no recognizable labels");
    }
    Ok(distribution)
}

// --- Inference API request/response types ---

#[derive(Serialize)]
struct ClassificationRequest<'a> {
    inputs: &'a str,
    parameters: Parameters,
    options: Options,
}

#[derive(Serialize)]
struct Parameters {
    top_k: usize,
}

#[derive(Serialize)]
struct Options {
    wait_for_model: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Single-input requests come back either nested (`[[...]]`) or flat (`[...]`)
/// depending on the pipeline version.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            ClassificationResponse::Nested(mut batches) => {
                if batches.is_empty() {
                    Vec::new()
                } else {
                    batches.swap_remove(0)
                }
            }
            ClassificationResponse::Flat(scores) => scores,
        }
    }
}

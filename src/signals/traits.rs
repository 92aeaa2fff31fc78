// Neural scorer trait: the seam to external model providers.
//
// A provider scores text for multi-label toxicity and 3-class sentiment.
// Implementations return errors freely; the adapter in `adapter.rs` turns
// every failure into `Signal::Unavailable` so nothing past it has to care.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The six Jigsaw toxicity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToxicityLabel {
    Toxic,
    SevereToxic,
    Obscene,
    Threat,
    Insult,
    IdentityHate,
}

impl ToxicityLabel {
    pub const ALL: [ToxicityLabel; 6] = [
        ToxicityLabel::Toxic,
        ToxicityLabel::SevereToxic,
        ToxicityLabel::Obscene,
        ToxicityLabel::Threat,
        ToxicityLabel::Insult,
        ToxicityLabel::IdentityHate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToxicityLabel::Toxic => "toxic",
            ToxicityLabel::SevereToxic => "severe_toxic",
            ToxicityLabel::Obscene => "obscene",
            ToxicityLabel::Threat => "threat",
            ToxicityLabel::Insult => "insult",
            ToxicityLabel::IdentityHate => "identity_hate",
        }
    }

    /// Parse a model label name. Accepts the Jigsaw names plus the aliases
    /// used by the Detoxify/Perspective family of models.
    pub fn from_model_label(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "toxic" | "toxicity" => Some(ToxicityLabel::Toxic),
            "severe_toxic" | "severe_toxicity" => Some(ToxicityLabel::SevereToxic),
            "obscene" | "profanity" => Some(ToxicityLabel::Obscene),
            "threat" => Some(ToxicityLabel::Threat),
            "insult" => Some(ToxicityLabel::Insult),
            "identity_hate" | "identity_attack" => Some(ToxicityLabel::IdentityHate),
            _ => None,
        }
    }
}

/// Independent per-label probabilities. Multi-label, so values need not sum to 1.
/// A provider may leave labels out; `get` then returns `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToxicityLabelSet(BTreeMap<ToxicityLabel, f64>);

impl ToxicityLabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, label: ToxicityLabel, probability: f64) -> Self {
        self.set(label, probability);
        self
    }

    /// Store a probability, clamped to [0, 1].
    pub fn set(&mut self, label: ToxicityLabel, probability: f64) {
        self.0.insert(label, probability.clamp(0.0, 1.0));
    }

    pub fn get(&self, label: ToxicityLabel) -> Option<f64> {
        self.0.get(&label).copied()
    }

    /// Highest probability across all supplied labels.
    pub fn max(&self) -> Option<f64> {
        self.0.values().copied().reduce(f64::max)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ToxicityLabel, f64)> + '_ {
        self.0.iter().map(|(label, p)| (*label, *p))
    }
}

/// 3-class sentiment probabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentDistribution {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

impl SentimentDistribution {
    /// Polarity in [-1, 1]: positive minus negative.
    pub fn polarity(&self) -> f64 {
        (self.positive - self.negative).clamp(-1.0, 1.0)
    }
}

/// Trait for neural text scoring. Implementations are async because
/// providers are network services.
#[async_trait]
pub trait NeuralScorer: Send + Sync {
    /// Multi-label toxicity probabilities for a single text.
    async fn score_toxicity(&self, text: &str) -> Result<ToxicityLabelSet>;

    /// Sentiment distribution for a single text.
    async fn score_sentiment(&self, text: &str) -> Result<SentimentDistribution>;
}

// Analyzer: orchestrates scoring for a single text.
//
// Given a text, this module:
// 1. Identifies its language (or language mix)
// 2. Scores it against the lexicon
// 3. Asks the neural provider for toxicity and sentiment, concurrently
// 4. Fuses the signals with language-conditioned weights
// 5. Runs threat detection and severity classification
// 6. Returns a complete AnalysisResult with the audit trail in `details`

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::language::{LanguageIdentifier, LanguageInfo};
use crate::output::truncate_chars;
use crate::scoring::fusion::{self, FusionWeights};
use crate::scoring::severity::Severity;
use crate::scoring::threat::{ThreatReason, ThreatRules};
use crate::signals::{Lexicon, NeuralSignalAdapter, ToxicityLabelSet};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("text to analyze is empty")]
    EmptyInput,
}

/// Coarse toxicity level shown in the breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToxicityLevel {
    Low,
    Medium,
    High,
}

impl ToxicityLevel {
    pub fn from_score(score: f64) -> Self {
        if score > 0.6 {
            ToxicityLevel::High
        } else if score > 0.3 {
            ToxicityLevel::Medium
        } else {
            ToxicityLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub fn from_score(score: f64) -> Self {
        if score > 0.2 {
            SentimentLabel::Positive
        } else if score < -0.2 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToxicityBreakdown {
    pub score: f64,
    pub level: ToxicityLevel,
    pub labels: ToxicityLabelSet,
    pub matched_terms: Vec<String>,
    pub keyword_score: f64,
    pub neural_available: bool,
    /// `None` when fusion fell back to the lexical score alone.
    pub fusion_weights: Option<FusionWeights>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentBreakdown {
    pub score: f64,
    pub label: SentimentLabel,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreatAnalysis {
    pub detected: bool,
    pub threat_probability: f64,
    pub model_probability: Option<f64>,
    pub reason: ThreatReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityReasoning {
    pub severity: Severity,
    pub toxicity_score: f64,
    pub sentiment_score: f64,
    pub is_threat: bool,
}

/// Factor trace for auditability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisDetails {
    pub language_detection: LanguageInfo,
    pub toxicity_breakdown: ToxicityBreakdown,
    pub sentiment_breakdown: SentimentBreakdown,
    pub threat_analysis: ThreatAnalysis,
    pub severity_reasoning: SeverityReasoning,
}

/// The analysis of one text. Field names are the response schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub toxicity_score: f64,
    pub sentiment_score: f64,
    pub severity: Severity,
    pub is_threat: bool,
    pub confidence: f64,
    pub detected_language: String,
    pub details: AnalysisDetails,
}

impl AnalysisResult {
    pub fn label_breakdown(&self) -> &ToxicityLabelSet {
        &self.details.toxicity_breakdown.labels
    }

    pub fn language(&self) -> &LanguageInfo {
        &self.details.language_detection
    }
}

/// Text analyzer. Holds only immutable state, so one instance can serve
/// any number of concurrent analyses.
pub struct Analyzer {
    identifier: LanguageIdentifier,
    lexicon: Lexicon,
    neural: NeuralSignalAdapter,
    threat_rules: ThreatRules,
}

impl Analyzer {
    pub fn new(identifier: LanguageIdentifier, lexicon: Lexicon, neural: NeuralSignalAdapter) -> Self {
        Self {
            identifier,
            lexicon,
            neural,
            threat_rules: ThreatRules::default(),
        }
    }

    /// Built-in lexicon, statistical language detection, no neural provider.
    pub fn keyword_only() -> Self {
        Self::new(
            LanguageIdentifier::default(),
            Lexicon::builtin(),
            NeuralSignalAdapter::null(),
        )
    }

    pub fn with_threat_rules(mut self, threat_rules: ThreatRules) -> Self {
        self.threat_rules = threat_rules;
        self
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn is_neural(&self) -> bool {
        self.neural.is_neural()
    }

    /// Analyze one text. Fails only on empty or whitespace-only input;
    /// provider trouble degrades the result instead.
    pub async fn analyze(&self, text: &str, platform: &str) -> Result<AnalysisResult, AnalysisError> {
        if text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let language = self.identifier.identify(text);
        let keywords = self.lexicon.score(text);

        let (neural_toxicity, neural_sentiment) =
            tokio::join!(self.neural.toxicity(text), self.neural.sentiment(text));

        let fused = fusion::fuse(language.language, &keywords, &neural_toxicity, &neural_sentiment);

        let (is_threat, reason) =
            self.threat_rules
                .detect(fused.threat_probability, keywords.has_match(), fused.toxicity_score);
        let severity = Severity::classify(fused.toxicity_score, is_threat);
        let confidence = fused
            .toxicity_score
            .max(fused.sentiment_score.abs())
            .clamp(0.0, 1.0);

        debug!(
            platform,
            language = %language.language,
            toxicity = format!("{:.2}", fused.toxicity_score),
            sentiment = format!("{:.2}", fused.sentiment_score),
            severity = %severity,
            is_threat,
            matches = keywords.matches(),
            neural = fused.neural_available(),
            text_preview = %truncate_chars(text, 50),
            "Analyzed text"
        );

        let details = AnalysisDetails {
            toxicity_breakdown: ToxicityBreakdown {
                score: fused.toxicity_score,
                level: ToxicityLevel::from_score(fused.toxicity_score),
                labels: fused.labels.clone(),
                keyword_score: keywords.toxicity,
                neural_available: fused.neural_available(),
                fusion_weights: fused.weights,
                matched_terms: keywords.matched_terms,
            },
            sentiment_breakdown: SentimentBreakdown {
                score: fused.sentiment_score,
                label: SentimentLabel::from_score(fused.sentiment_score),
                available: fused.sentiment_available,
            },
            threat_analysis: ThreatAnalysis {
                detected: is_threat,
                threat_probability: fused.threat_probability,
                model_probability: fused.neural_threat,
                reason,
            },
            severity_reasoning: SeverityReasoning {
                severity,
                toxicity_score: fused.toxicity_score,
                sentiment_score: fused.sentiment_score,
                is_threat,
            },
            language_detection: language,
        };

        Ok(AnalysisResult {
            toxicity_score: fused.toxicity_score,
            sentiment_score: fused.sentiment_score,
            severity,
            is_threat,
            confidence,
            detected_language: details.language_detection.language.to_string(),
            details,
        })
    }
}

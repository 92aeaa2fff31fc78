// Signal fusion: combines lexical and neural signals into one score set.
//
// Neural toxicity is weighted against lexical toxicity by language. For
// Kannada and Hindi the lexicon carries more weight, since the neural model is
// weaker on regional-language text. When the neural signal is unavailable the
// lexical score is used as-is.

use serde::Serialize;

use crate::language::Language;
use crate::signals::{KeywordSignals, SentimentDistribution, Signal, ToxicityLabel, ToxicityLabelSet};

/// Weights applied to the neural and lexical toxicity scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FusionWeights {
    pub neural: f64,
    pub lexical: f64,
}

impl FusionWeights {
    pub fn for_language(language: Language) -> Self {
        if language.is_regional() {
            Self {
                neural: 0.4,
                lexical: 0.6,
            }
        } else {
            Self {
                neural: 0.7,
                lexical: 0.3,
            }
        }
    }

    pub fn combine(&self, neural: f64, lexical: f64) -> f64 {
        self.neural * neural + self.lexical * lexical
    }
}

/// Output of fusion: everything threat and severity decisions need.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedSignals {
    /// Language-weighted toxicity before derived labels are folded in.
    pub fused_toxicity: f64,
    /// Final toxicity score in [0, 1].
    pub toxicity_score: f64,
    /// Per-label breakdown; `toxic` is the fused value, `threat` the threat probability.
    pub labels: ToxicityLabelSet,
    pub threat_probability: f64,
    /// Threat probability reported by the neural model, if it ran.
    pub neural_threat: Option<f64>,
    /// Polarity in [-1, 1]; 0.0 when sentiment was unavailable.
    pub sentiment_score: f64,
    /// Weights used, or `None` for keyword-only fusion.
    pub weights: Option<FusionWeights>,
    pub sentiment_available: bool,
}

impl FusedSignals {
    pub fn neural_available(&self) -> bool {
        self.weights.is_some()
    }
}

/// Derived label from the fused scalar: `fused * factor` above `floor`, else 0.
fn derived(fused: f64, floor: f64, factor: f64) -> f64 {
    if fused > floor {
        fused * factor
    } else {
        0.0
    }
}

const DERIVED_LABELS: [(ToxicityLabel, f64, f64); 4] = [
    (ToxicityLabel::SevereToxic, 0.7, 0.8),
    (ToxicityLabel::Obscene, 0.5, 0.6),
    (ToxicityLabel::Insult, 0.4, 0.7),
    (ToxicityLabel::IdentityHate, 0.6, 0.5),
];

pub fn fuse(
    language: Language,
    keywords: &KeywordSignals,
    neural_toxicity: &Signal<ToxicityLabelSet>,
    neural_sentiment: &Signal<SentimentDistribution>,
) -> FusedSignals {
    let neural_labels = neural_toxicity.as_ref();

    // The neural scalar is the strongest label the model reported.
    let (fused_toxicity, weights) = match neural_labels.and_then(ToxicityLabelSet::max) {
        Some(neural) => {
            let weights = FusionWeights::for_language(language);
            (weights.combine(neural, keywords.toxicity), Some(weights))
        }
        None => (keywords.toxicity, None),
    };

    let mut labels = ToxicityLabelSet::new().with(ToxicityLabel::Toxic, fused_toxicity);
    let mut strongest_derived: f64 = 0.0;
    for (label, floor, factor) in DERIVED_LABELS {
        let from_fused = derived(fused_toxicity, floor, factor);
        let from_model = neural_labels.and_then(|l| l.get(label)).unwrap_or(0.0);
        let value = from_fused.max(from_model);
        labels.set(label, value);
        strongest_derived = strongest_derived.max(value);
    }

    let neural_threat = neural_labels.and_then(|l| l.get(ToxicityLabel::Threat));
    let threat_probability = keywords.threat.max(neural_threat.unwrap_or(0.0));
    labels.set(ToxicityLabel::Threat, threat_probability);

    // With a model, the overall score is the strongest final label, threat
    // included. Keyword-only scoring leaves threat to the threat detector.
    let strongest_label = if weights.is_some() {
        strongest_derived.max(threat_probability)
    } else {
        strongest_derived
    };
    let toxicity_score = fused_toxicity.max(strongest_label).clamp(0.0, 1.0);

    let sentiment_score = neural_sentiment
        .as_ref()
        .map_or(0.0, SentimentDistribution::polarity);

    FusedSignals {
        fused_toxicity,
        toxicity_score,
        labels,
        threat_probability,
        neural_threat,
        sentiment_score,
        weights,
        sentiment_available: neural_sentiment.is_available(),
    }
}

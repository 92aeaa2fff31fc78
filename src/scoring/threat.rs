// Threat detector.
//
// A text is a threat when any one of three rules fires:
// - the fused threat probability is above 0.5
// - a lexicon term matched and toxicity is above 0.3
// - toxicity alone is above 0.8
//
// Rules are checked in that order and the first one that fires is reported
// as the reason, so the audit trail names the strongest evidence.

use serde::{Deserialize, Serialize};

/// Thresholds for the threat rules. All comparisons are strict.
#[derive(Debug, Clone, Copy)]
pub struct ThreatRules {
    pub probability_threshold: f64,
    pub keyword_toxicity_threshold: f64,
    pub toxicity_threshold: f64,
}

impl Default for ThreatRules {
    fn default() -> Self {
        Self {
            probability_threshold: 0.5,
            keyword_toxicity_threshold: 0.3,
            toxicity_threshold: 0.8,
        }
    }
}

/// Which rule flagged the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatReason {
    ThreatProbability,
    KeywordMatch,
    HighToxicity,
    None,
}

impl ThreatRules {
    /// Returns whether the text is a threat and which rule decided it.
    pub fn detect(
        &self,
        threat_probability: f64,
        keyword_match: bool,
        toxicity_score: f64,
    ) -> (bool, ThreatReason) {
        if threat_probability > self.probability_threshold {
            (true, ThreatReason::ThreatProbability)
        } else if keyword_match && toxicity_score > self.keyword_toxicity_threshold {
            (true, ThreatReason::KeywordMatch)
        } else if toxicity_score > self.toxicity_threshold {
            (true, ThreatReason::HighToxicity)
        } else {
            (false, ThreatReason::None)
        }
    }
}

/// Threat detection with the default rules.
pub fn detect_threat(threat_probability: f64, keyword_match: bool, toxicity_score: f64) -> bool {
    ThreatRules::default()
        .detect(threat_probability, keyword_match, toxicity_score)
        .0
}

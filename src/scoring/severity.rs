// Severity classifier: ordinal moderation urgency.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Classify from the fused toxicity score. A threat is always critical.
    ///
    /// Bands include their lower edge: 0.8 is critical, 0.6 high, 0.4 medium.
    /// Everything below 0.4 (including NaN) is low.
    pub fn classify(toxicity_score: f64, is_threat: bool) -> Self {
        if is_threat {
            return Severity::Critical;
        }
        Self::from_score(toxicity_score)
    }

    /// Band a toxicity score without the threat override.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.8 => Severity::Critical,
            s if s >= 0.6 => Severity::High,
            s if s >= 0.4 => Severity::Medium,
            _ => Severity::Low,
        }
    }

    /// Fixed ordinal used for threshold comparison: low=1 .. critical=4.
    pub fn ordinal(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => anyhow::bail!(
                "Unknown severity '{other}' (expected low, medium, high or critical)"
            ),
        }
    }
}

// Language identification: which language (or mix of languages) a message is in.
//
// Detection runs in two stages: a statistical detector first, then Unicode
// script ranges when the detector can't decide. The result feeds the fusion
// weights (regional languages lean on the lexicon, English leans on the model).

pub mod identify;
pub mod script;

pub use identify::{LanguageIdentifier, StatisticalDetector, WhatlangDetector};

use serde::{Deserialize, Serialize};

/// A language tag as understood by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Kn,
    Hi,
    Mixed,
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Kn => "kn",
            Language::Hi => "hi",
            Language::Mixed => "mixed",
            Language::Unknown => "unknown",
        }
    }

    /// Kannada and Hindi, where the keyword lexicon is trusted over the model.
    pub fn is_regional(&self) -> bool {
        matches!(self, Language::Kn | Language::Hi)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "kn" => Ok(Language::Kn),
            "hi" => Ok(Language::Hi),
            "mixed" => Ok(Language::Mixed),
            "unknown" => Ok(Language::Unknown),
            other => anyhow::bail!("Unknown language tag: {other}"),
        }
    }
}

/// Result of language identification for a single text.
///
/// `mixed_languages` lists every language tag with a signal in the text.
/// When it holds more than one entry, `language` is always `Mixed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub language: Language,
    /// Heuristic constant per detection path, not a calibrated probability.
    pub confidence: f64,
    pub primary_language: Language,
    pub mixed_languages: Vec<Language>,
}

impl LanguageInfo {
    pub fn is_mixed(&self) -> bool {
        self.language == Language::Mixed
    }
}

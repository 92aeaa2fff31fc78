// Two-stage language identifier.
//
// Stage 1 asks a statistical detector for the primary language. Stage 2
// (always run) scans script ranges to find code-mixing. When the detector
// returns nothing, or the text has no letters to detect from, the script
// scan alone decides. Identification never fails: the worst case is
// `unknown` at half confidence.

use tracing::debug;

use super::script::ScriptSignals;
use super::{Language, LanguageInfo};

/// Confidence reported when the statistical detector produced a result.
pub const STATISTICAL_CONFIDENCE: f64 = 0.8;
/// Confidence reported when script ranges recognized a supported language.
pub const SCRIPT_CONFIDENCE: f64 = 0.7;
/// Confidence reported when the text has letters but no supported script.
pub const UNRECOGNIZED_CONFIDENCE: f64 = 0.5;

/// A statistical language detector.
///
/// Returns `None` when detection is indeterminate or fails. A detected
/// language outside en/kn/hi is reported as `Some(Language::Unknown)`.
pub trait StatisticalDetector: Send + Sync {
    fn detect(&self, text: &str) -> Option<Language>;
}

/// Trigram-based detection via the `whatlang` crate.
pub struct WhatlangDetector;

impl StatisticalDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Option<Language> {
        let info = whatlang::detect(text)?;
        let language = match info.lang() {
            whatlang::Lang::Eng => Language::En,
            whatlang::Lang::Kan => Language::Kn,
            whatlang::Lang::Hin => Language::Hi,
            _ => Language::Unknown,
        };
        Some(language)
    }
}

pub struct LanguageIdentifier {
    detector: Box<dyn StatisticalDetector>,
}

impl Default for LanguageIdentifier {
    fn default() -> Self {
        Self::new(Box::new(WhatlangDetector))
    }
}

impl LanguageIdentifier {
    pub fn new(detector: Box<dyn StatisticalDetector>) -> Self {
        Self { detector }
    }

    /// Identify the language of `text`.
    pub fn identify(&self, text: &str) -> LanguageInfo {
        let scripts = ScriptSignals::scan(text);
        if !scripts.any_letter {
            debug!("No letters to detect from, using script ranges");
            return from_scripts(&scripts);
        }

        match self.detector.detect(text) {
            Some(primary) => from_statistical(primary, &scripts),
            None => {
                debug!("Statistical language detection indeterminate, using script ranges");
                from_scripts(&scripts)
            }
        }
    }
}

fn from_statistical(primary: Language, scripts: &ScriptSignals) -> LanguageInfo {
    let present = scripts.languages();
    if present.len() > 1 {
        return LanguageInfo {
            language: Language::Mixed,
            confidence: STATISTICAL_CONFIDENCE,
            primary_language: primary,
            mixed_languages: present,
        };
    }

    // An unsupported detection (e.g. Dutch for Latin text) still carries a
    // script signal we can use.
    let language = if primary != Language::Unknown {
        primary
    } else {
        present.first().copied().unwrap_or(Language::Unknown)
    };

    LanguageInfo {
        language,
        confidence: STATISTICAL_CONFIDENCE,
        primary_language: primary,
        mixed_languages: vec![language],
    }
}

fn from_scripts(scripts: &ScriptSignals) -> LanguageInfo {
    let present = scripts.languages();
    match present.as_slice() {
        [] => LanguageInfo {
            language: Language::Unknown,
            confidence: UNRECOGNIZED_CONFIDENCE,
            primary_language: Language::Unknown,
            mixed_languages: Vec::new(),
        },
        [only] => LanguageInfo {
            language: *only,
            confidence: SCRIPT_CONFIDENCE,
            primary_language: *only,
            mixed_languages: vec![*only],
        },
        _ => {
            // The regional script is the more specific signal in a mix.
            let primary = present
                .iter()
                .copied()
                .find(|l| l.is_regional())
                .unwrap_or(Language::En);
            LanguageInfo {
                language: Language::Mixed,
                confidence: SCRIPT_CONFIDENCE,
                primary_language: primary,
                mixed_languages: present,
            }
        }
    }
}

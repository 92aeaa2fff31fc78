// Keyword signal engine: per-language lexicons of toxic and threat terms.
//
// Matching is case-insensitive substring containment against the combined
// lexicon of every language, whatever language was detected: code-mixed text
// can carry terms from any of them. The threat score is computed from the
// same combined lexicon as the toxicity score.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::language::Language;

const ENGLISH_TERMS: &[&str] = &[
    "kill", "murder", "die", "death", "hurt", "harm", "attack", "destroy", "bomb", "shoot",
    "stab", "rape", "suicide", "threat", "threaten", "violence", "beat up", "beat you",
    "end you", "ruin you", "destroy you", "get you", "revenge",
];

const KANNADA_TERMS: &[&str] = &[
    // Transliterated
    "kollu", "kol", "sathisu", "sathi", "mare", "chakke", "chakka", "nayi", "huli", "puli",
    "thika muchkond", "thika muchko",
    // Kannada script
    "ಕೊಲ್ಲು", "ಕೊಲೆ", "ಸಾಯು", "ಸಾಯಿಸು", "ಮಾರು", "ಚಕ್ಕೆ", "ಚಕ್ಕಾ", "ನಾಯಿ", "ಹುಲಿ", "ಪುಲಿ",
    "ತಿಕ ಮುಚ್ಕೊಂಡ್", "ತಿಕ ಮುಚ್ಕೊ",
];

const HINDI_TERMS: &[&str] = &[
    // Transliterated
    "maar", "maarunga", "mar", "marunga", "mar ja", "mar dunga", "maar dunga", "khatam",
    "khatam kar", "khatam kar dunga", "teri", "tujhe", "tu", "teri maa", "behen", "behenchod",
    "madarchod", "chutiya", "bhosdike", "lund", "gaand", "gaandu",
    // Devanagari
    "मार", "मारूंगा", "मार दूंगा", "मर", "मर जा", "खत्म", "खत्म कर", "तेरी", "तुझे", "तू",
    "तेरी माँ", "बहन", "बहनचोद", "मादरचोद", "चूतिया", "भोसड़ीके", "लुंड", "गांड", "गांडू",
];

/// Lexical toxicity: 0.5 for the first match plus 0.1 per match, capped at 0.9.
pub fn lexical_toxicity(matches: usize) -> f64 {
    if matches == 0 {
        return 0.0;
    }
    (0.5 + 0.1 * matches as f64).min(0.9)
}

/// Lexical threat: 0.6 plus 0.15 per match, capped at 1.0.
pub fn lexical_threat(matches: usize) -> f64 {
    if matches == 0 {
        return 0.0;
    }
    (0.6 + 0.15 * matches as f64).min(1.0)
}

/// Keyword-derived signals for one text. Never fails; no match means all zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeywordSignals {
    pub matched_terms: Vec<String>,
    pub toxicity: f64,
    pub threat: f64,
}

impl KeywordSignals {
    pub fn matches(&self) -> usize {
        self.matched_terms.len()
    }

    pub fn has_match(&self) -> bool {
        !self.matched_terms.is_empty()
    }
}

/// Immutable per-language term tables, built once at startup.
#[derive(Debug, Clone)]
pub struct Lexicon {
    tables: BTreeMap<Language, BTreeSet<String>>,
    combined: BTreeSet<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Lexicon {
    /// The built-in English, Kannada and Hindi term lists.
    pub fn builtin() -> Self {
        Self::from_tables([
            (Language::En, ENGLISH_TERMS.iter().map(|t| t.to_string()).collect()),
            (Language::Kn, KANNADA_TERMS.iter().map(|t| t.to_string()).collect()),
            (Language::Hi, HINDI_TERMS.iter().map(|t| t.to_string()).collect()),
        ])
    }

    /// Build from arbitrary tables. Terms are lowercased, trimmed and deduplicated;
    /// blank terms are dropped since they would match every text.
    pub fn from_tables(tables: impl IntoIterator<Item = (Language, Vec<String>)>) -> Self {
        let mut lexicon = Self {
            tables: BTreeMap::new(),
            combined: BTreeSet::new(),
        };
        for (language, terms) in tables {
            lexicon.extend(language, terms);
        }
        lexicon
    }

    /// Built-in lexicon extended with the tables in a JSON file shaped like
    /// `{"en": ["..."], "kn": ["..."], "hi": ["..."]}`.
    pub fn builtin_with_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon file {}", path.display()))?;
        let extra: BTreeMap<String, Vec<String>> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse lexicon file {}", path.display()))?;

        let mut lexicon = Self::builtin();
        for (tag, terms) in extra {
            let language: Language = tag.parse()?;
            if !matches!(language, Language::En | Language::Kn | Language::Hi) {
                anyhow::bail!(
                    "Lexicon file {} has a '{}' table; only en, kn and hi are supported",
                    path.display(),
                    language
                );
            }
            lexicon.extend(language, terms);
        }

        info!(
            path = %path.display(),
            terms = lexicon.len(),
            "Loaded lexicon extensions"
        );
        Ok(lexicon)
    }

    fn extend(&mut self, language: Language, terms: Vec<String>) {
        let table = self.tables.entry(language).or_default();
        for term in terms {
            let term = term.trim().to_lowercase();
            if term.is_empty() {
                continue;
            }
            self.combined.insert(term.clone());
            table.insert(term);
        }
    }

    /// Number of distinct terms across all languages.
    pub fn len(&self) -> usize {
        self.combined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combined.is_empty()
    }

    /// Number of terms in one language's table.
    pub fn language_len(&self, language: Language) -> usize {
        self.tables.get(&language).map_or(0, BTreeSet::len)
    }

    /// Every distinct lexicon term contained in `text`, in lexicon order.
    pub fn find_matches(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.combined
            .iter()
            .filter(|term| lowered.contains(term.as_str()))
            .cloned()
            .collect()
    }

    /// Score a text against the combined lexicon.
    pub fn score(&self, text: &str) -> KeywordSignals {
        let matched_terms = self.find_matches(text);
        let matches = matched_terms.len();
        KeywordSignals {
            toxicity: lexical_toxicity(matches),
            threat: lexical_threat(matches),
            matched_terms,
        }
    }
}

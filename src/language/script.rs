// Unicode script-range scan.
//
// Basic Latin letters count as an English signal, the Kannada block
// (U+0C80..U+0CFF) as Kannada, and the Devanagari block (U+0900..U+097F)
// as Hindi.

use super::Language;

/// Which supported scripts appear in a text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptSignals {
    pub latin: bool,
    pub kannada: bool,
    pub devanagari: bool,
    /// Any alphabetic character at all, including unsupported scripts.
    pub any_letter: bool,
}

impl ScriptSignals {
    pub fn scan(text: &str) -> Self {
        let mut signals = Self::default();
        for c in text.chars() {
            match c {
                'a'..='z' | 'A'..='Z' => signals.latin = true,
                '\u{0C80}'..='\u{0CFF}' => signals.kannada = true,
                '\u{0900}'..='\u{097F}' => signals.devanagari = true,
                _ => {}
            }
            if c.is_alphabetic() {
                signals.any_letter = true;
            }
        }
        signals.any_letter |= signals.latin || signals.kannada || signals.devanagari;
        signals
    }

    /// Language tags with a script signal, always in en, kn, hi order.
    pub fn languages(&self) -> Vec<Language> {
        let mut present = Vec::with_capacity(3);
        if self.latin {
            present.push(Language::En);
        }
        if self.kannada {
            present.push(Language::Kn);
        }
        if self.devanagari {
            present.push(Language::Hi);
        }
        present
    }
}

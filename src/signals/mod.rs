// Scoring signals: the independent inputs to fusion.
//
// The lexicon is always available. Neural scores come from a swappable
// provider behind the NeuralScorer trait, reached only through the adapter
// so that provider failure is an ordinary `Unavailable` value.

pub mod adapter;
pub mod huggingface;
pub mod lexicon;
pub mod rate_limiter;
pub mod traits;

pub use adapter::{NeuralSignalAdapter, ScoreProvider, Signal};
pub use lexicon::{KeywordSignals, Lexicon};
pub use traits::{NeuralScorer, SentimentDistribution, ToxicityLabel, ToxicityLabelSet};

// Neural signal adapter: bounded, failure-absorbing access to a provider.
//
// The provider is chosen once at construction: `ScoreProvider::Neural` wraps a
// real scorer, `ScoreProvider::Null` answers `Unavailable` without doing any
// work. Every call is bounded by a timeout; timeouts, transport errors and
// provider-reported failures all come back as `Signal::Unavailable`.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::time::Duration;
use tracing::warn;

use super::traits::{NeuralScorer, SentimentDistribution, ToxicityLabelSet};

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// A provider signal that may be missing.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal<T> {
    Available(T),
    Unavailable,
}

impl<T> Signal<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Signal::Available(_))
    }

    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Signal::Available(value) => Some(value),
            Signal::Unavailable => None,
        }
    }
}

impl<T> From<Option<T>> for Signal<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Signal::Available(v),
            None => Signal::Unavailable,
        }
    }
}

/// The neural capability, selected by configuration.
#[derive(Clone)]
pub enum ScoreProvider {
    Neural(Arc<dyn NeuralScorer>),
    Null,
}

pub struct NeuralSignalAdapter {
    provider: ScoreProvider,
    timeout: Duration,
}

impl NeuralSignalAdapter {
    pub fn new(provider: ScoreProvider, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Adapter with no neural provider: keyword-only analysis.
    pub fn null() -> Self {
        Self::new(ScoreProvider::Null, DEFAULT_PROVIDER_TIMEOUT)
    }

    pub fn is_neural(&self) -> bool {
        matches!(self.provider, ScoreProvider::Neural(_))
    }

    pub async fn toxicity(&self, text: &str) -> Signal<ToxicityLabelSet> {
        match &self.provider {
            ScoreProvider::Neural(scorer) => {
                bounded("toxicity", self.timeout, scorer.score_toxicity(text)).await
            }
            ScoreProvider::Null => Signal::Unavailable,
        }
    }

    pub async fn sentiment(&self, text: &str) -> Signal<SentimentDistribution> {
        match &self.provider {
            ScoreProvider::Neural(scorer) => {
                bounded("sentiment", self.timeout, scorer.score_sentiment(text)).await
            }
            ScoreProvider::Null => Signal::Unavailable,
        }
    }
}

async fn bounded<T>(
    signal: &'static str,
    timeout: Duration,
    call: impl Future<Output = Result<T>>,
) -> Signal<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Signal::Available(value),
        Ok(Err(e)) => {
            warn!(signal, error = %e, "Neural provider failed, continuing without it");
            Signal::Unavailable
        }
        Err(_) => {
            warn!(
                signal,
                timeout_ms = timeout.as_millis() as u64,
                "Neural provider timed out, continuing without it"
            );
            Signal::Unavailable
        }
    }
}

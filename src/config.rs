use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::time::Duration;

use crate::moderation::ModerationThresholds;
use crate::scoring::Severity;
use crate::signals::huggingface::{
    HuggingFaceSettings, DEFAULT_API_URL, DEFAULT_SENTIMENT_MODEL, DEFAULT_TOXICITY_MODEL,
};

/// Which neural scoring provider to use.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderBackend {
    /// Hugging Face Inference API, requires HUGGINGFACE_API_TOKEN
    HuggingFace,
    /// No neural provider (default), keyword signals only
    None,
}

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider_backend: ProviderBackend,
    pub huggingface_api_token: String,
    pub huggingface_api_url: String,
    pub toxicity_model: String,
    pub sentiment_model: String,
    /// Bounded wait for each provider call
    pub provider_timeout: Duration,
    /// Optional client-side rate limit for the provider
    pub provider_qps: Option<f64>,
    /// JSON file extending the built-in lexicons
    pub lexicon_path: Option<PathBuf>,
    pub db_path: String,
    pub thresholds: ModerationThresholds,
    /// How long the "message removed" notice stays up
    pub warning_ttl: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup. Invalid values are errors,
    /// not silent defaults.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let provider_backend = match var("SAFEGUARD_PROVIDER").as_deref().map(str::trim) {
            None | Some("none") => ProviderBackend::None,
            Some("huggingface") => ProviderBackend::HuggingFace,
            Some(other) => anyhow::bail!(
                "Invalid SAFEGUARD_PROVIDER '{other}' (expected 'huggingface' or 'none')"
            ),
        };

        let provider_timeout = match var("SAFEGUARD_PROVIDER_TIMEOUT_SECS") {
            Some(v) => parse_seconds("SAFEGUARD_PROVIDER_TIMEOUT_SECS", &v)?,
            None => crate::signals::adapter::DEFAULT_PROVIDER_TIMEOUT,
        };

        let provider_qps = var("SAFEGUARD_PROVIDER_QPS")
            .map(|v| parse_qps("SAFEGUARD_PROVIDER_QPS", &v))
            .transpose()?;

        let warning_ttl = match var("SAFEGUARD_WARNING_TTL_SECS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse::<u64>()
                    .with_context(|| format!("Invalid SAFEGUARD_WARNING_TTL_SECS '{v}'"))?,
            ),
            None => crate::moderation::actions::DEFAULT_WARNING_TTL,
        };

        let defaults = ModerationThresholds::default();
        let thresholds = ModerationThresholds {
            min_severity_to_save: parse_or(
                "MIN_SEVERITY_TO_SAVE",
                var("MIN_SEVERITY_TO_SAVE"),
                defaults.min_severity_to_save,
                parse_severity,
            )?,
            min_severity_to_delete: parse_or(
                "MIN_SEVERITY_TO_DELETE",
                var("MIN_SEVERITY_TO_DELETE"),
                defaults.min_severity_to_delete,
                parse_severity,
            )?,
            delete_enabled: parse_or(
                "DELETE_MESSAGES",
                var("DELETE_MESSAGES"),
                defaults.delete_enabled,
                parse_bool,
            )?,
            warn_enabled: parse_or("WARN_USERS", var("WARN_USERS"), defaults.warn_enabled, parse_bool)?,
            // Alerts default on whenever an alert channel is configured
            alert_enabled: parse_or(
                "ALERT_ENABLED",
                var("ALERT_ENABLED"),
                var("ALERT_CHANNEL_ID").is_some(),
                parse_bool,
            )?,
        };

        Ok(Self {
            provider_backend,
            huggingface_api_token: var("HUGGINGFACE_API_TOKEN").unwrap_or_default(),
            huggingface_api_url: var("HUGGINGFACE_API_URL")
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            toxicity_model: var("SAFEGUARD_TOXICITY_MODEL")
                .unwrap_or_else(|| DEFAULT_TOXICITY_MODEL.to_string()),
            sentiment_model: var("SAFEGUARD_SENTIMENT_MODEL")
                .unwrap_or_else(|| DEFAULT_SENTIMENT_MODEL.to_string()),
            provider_timeout,
            provider_qps,
            lexicon_path: var("SAFEGUARD_LEXICON_PATH").map(PathBuf::from),
            db_path: var("SAFEGUARD_DB_PATH").unwrap_or_else(|| "./safeguard.db".to_string()),
            thresholds,
            warning_ttl,
        })
    }

    /// Validate that the chosen provider has what it needs.
    pub fn require_provider(&self) -> Result<()> {
        match self.provider_backend {
            ProviderBackend::None => Ok(()),
            ProviderBackend::HuggingFace => {
                if self.huggingface_api_token.is_empty() {
                    anyhow::bail!(
                        "HUGGINGFACE_API_TOKEN not set. Add it to your .env file.\n\
                         Or set SAFEGUARD_PROVIDER=none to run on keyword signals only."
                    );
                }
                Ok(())
            }
        }
    }

    /// Settings for the Hugging Face scorer.
    pub fn huggingface_settings(&self) -> HuggingFaceSettings {
        HuggingFaceSettings {
            api_url: self.huggingface_api_url.clone(),
            api_token: self.huggingface_api_token.clone(),
            toxicity_model: self.toxicity_model.clone(),
            sentiment_model: self.sentiment_model.clone(),
            request_timeout: self.provider_timeout,
            requests_per_second: self.provider_qps,
        }
    }
}

fn parse_or<T>(
    key: &str,
    value: Option<String>,
    default: T,
    parse: fn(&str) -> Option<T>,
) -> Result<T> {
    match value {
        None => Ok(default),
        Some(v) => parse(&v).with_context(|| format!("Invalid value for {key}: '{v}'")),
    }
}

/// Accepts true/false, 1/0, yes/no in any case.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_severity(value: &str) -> Option<Severity> {
    value.parse().ok()
}

fn parse_seconds(key: &str, value: &str) -> Result<Duration> {
    let secs: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {key}: '{value}'"))?;
    if !secs.is_finite() || secs <= 0.0 {
        anyhow::bail!("{key} must be a positive number of seconds, got '{value}'");
    }
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("{key} is out of range, got '{value}'"))
}

/// A positive request rate whose spacing interval fits in a `Duration`.
fn parse_qps(key: &str, value: &str) -> Result<f64> {
    let qps: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {key}: '{value}'"))?;
    if !qps.is_finite() || qps <= 0.0 {
        anyhow::bail!("{key} must be a positive request rate, got '{value}'");
    }
    Duration::try_from_secs_f64(1.0 / qps)
        .with_context(|| format!("{key} is too low to schedule, got '{value}'"))?;
    Ok(qps)
}

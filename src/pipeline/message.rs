// Per-message moderation pipeline.
//
// For each incoming chat message:
// 1. Skip bot-authored and empty messages
// 2. Analyze the text
// 3. Decide on actions from the configured thresholds
// 4. Persist an incident when the decision says to save
// 5. Alert, delete and warn through the platform gateway, if one is attached
//
// Storage and platform failures are logged and never undo the decision.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::time::Duration;
use tracing::{error, info, warn};

use crate::db::models::BotStatus;
use crate::db::IncidentStore;
use crate::moderation::actions::{self, DEFAULT_WARNING_TTL};
use crate::moderation::{
    decide, ActionReport, ChatMessage, IncidentRecord, ModerationDecision, ModerationMetrics,
    ModerationThresholds, PlatformGateway,
};
use crate::output::truncate_chars;
use crate::scoring::{AnalysisError, AnalysisResult, Analyzer};

/// Why a message was not analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    BotAuthor,
    Empty,
}

/// Everything that happened to one analyzed message.
#[derive(Debug, Clone)]
pub struct ModerationOutcome {
    pub analysis: AnalysisResult,
    pub decision: ModerationDecision,
    /// Set when the incident was persisted.
    pub incident_id: Option<i64>,
    pub actions: ActionReport,
}

#[derive(Debug, Clone)]
pub enum MessageOutcome {
    Skipped(SkipReason),
    Moderated(Box<ModerationOutcome>),
}

impl MessageOutcome {
    pub fn moderated(&self) -> Option<&ModerationOutcome> {
        match self {
            MessageOutcome::Moderated(outcome) => Some(&**outcome),
            MessageOutcome::Skipped(_) => None,
        }
    }
}

pub struct Moderator {
    analyzer: Arc<Analyzer>,
    thresholds: ModerationThresholds,
    metrics: Arc<ModerationMetrics>,
    store: Option<Arc<dyn IncidentStore>>,
    gateway: Option<Arc<dyn PlatformGateway>>,
    warning_ttl: Duration,
}

impl Moderator {
    pub fn new(analyzer: Arc<Analyzer>, thresholds: ModerationThresholds) -> Self {
        Self {
            analyzer,
            thresholds,
            metrics: Arc::new(ModerationMetrics::new()),
            store: None,
            gateway: None,
            warning_ttl: DEFAULT_WARNING_TTL,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn IncidentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn PlatformGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<ModerationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_warning_ttl(mut self, warning_ttl: Duration) -> Self {
        self.warning_ttl = warning_ttl;
        self
    }

    pub fn metrics(&self) -> &Arc<ModerationMetrics> {
        &self.metrics
    }

    pub fn thresholds(&self) -> &ModerationThresholds {
        &self.thresholds
    }

    pub async fn handle_message(&self, message: &ChatMessage) -> MessageOutcome {
        if message.author_is_bot {
            return MessageOutcome::Skipped(SkipReason::BotAuthor);
        }

        let analysis = match self.analyzer.analyze(&message.content, &message.platform).await {
            Ok(analysis) => analysis,
            Err(AnalysisError::EmptyInput) => return MessageOutcome::Skipped(SkipReason::Empty),
        };
        self.metrics.record_analyzed();

        let decision = decide(analysis.severity, analysis.is_threat, &self.thresholds);

        let mut incident_id = None;
        if decision.should_save {
            self.metrics.record_incident();
            warn!(
                severity = %analysis.severity,
                language = %analysis.detected_language,
                toxicity = format!("{:.3}", analysis.toxicity_score),
                sentiment = format!("{:.3}", analysis.sentiment_score),
                is_threat = analysis.is_threat,
                author = %message.author_name,
                channel = %message.channel_id,
                text_preview = %truncate_chars(&message.content, 100),
                "Incident detected"
            );
            incident_id = self.persist(message, &analysis).await;
        }

        let actions = match &self.gateway {
            Some(gateway) => {
                actions::execute(
                    gateway,
                    message,
                    &analysis,
                    &decision,
                    incident_id,
                    self.warning_ttl,
                )
                .await
            }
            None => ActionReport::default(),
        };
        if actions.deleted {
            self.metrics.record_deleted();
        }

        MessageOutcome::Moderated(Box::new(ModerationOutcome {
            analysis,
            decision,
            incident_id,
            actions,
        }))
    }

    async fn persist(&self, message: &ChatMessage, analysis: &AnalysisResult) -> Option<i64> {
        let store = self.store.as_ref()?;
        let record = IncidentRecord::new(message, analysis);
        match store.save_incident(&record).await {
            Ok(id) => {
                info!(incident_id = id, "Incident saved");
                Some(id)
            }
            Err(e) => {
                error!(error = %e, message_id = %message.message_id, "Failed to save incident");
                None
            }
        }
    }

    /// Write the current counters to the store's status row for `platform`.
    pub async fn report_status(&self, platform: &str, status: &str) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let snapshot = self.metrics.snapshot();
        let row = BotStatus {
            platform: platform.to_string(),
            status: status.to_string(),
            last_ping: Utc::now().to_rfc3339(),
            message_count: snapshot.messages_analyzed as i64,
            incidents_detected: snapshot.incidents_detected as i64,
            messages_deleted: snapshot.messages_deleted as i64,
            uptime_seconds: snapshot.uptime_seconds,
        };
        store.upsert_bot_status(&row).await
    }
}

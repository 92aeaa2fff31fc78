// Platform actions: carrying out a moderation decision through a gateway.
//
// The gateway is the chat platform's side of the seam: it deletes messages,
// posts and removes notices, and renders alerts. Nothing here touches platform
// objects directly. Action failures are logged and reported back, never
// raised: the decision stands whatever the platform does with it.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tokio::time::Duration;
use tracing::{debug, error, info};

use super::incident::ChatMessage;
use super::policy::ModerationDecision;
use crate::output::truncate_chars;
use crate::scoring::{AnalysisResult, Severity};

pub const DEFAULT_WARNING_TTL: Duration = Duration::from_secs(10);

/// Longest message excerpt carried in an alert.
const ALERT_EXCERPT_CHARS: usize = 1000;

/// A notice posted by the gateway, kept so it can be removed later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeHandle {
    pub channel_id: String,
    pub notice_id: String,
}

/// What moderators are told about an incident.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeratorAlert {
    pub severity: Severity,
    pub is_threat: bool,
    pub detected_language: String,
    pub excerpt: String,
    pub author_id: String,
    pub author_name: String,
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub toxicity_score: f64,
    pub sentiment_score: f64,
    pub message_url: Option<String>,
    pub incident_id: Option<i64>,
}

impl ModeratorAlert {
    pub fn new(message: &ChatMessage, analysis: &AnalysisResult, incident_id: Option<i64>) -> Self {
        Self {
            severity: analysis.severity,
            is_threat: analysis.is_threat,
            detected_language: analysis.detected_language.clone(),
            excerpt: truncate_chars(&message.content, ALERT_EXCERPT_CHARS),
            author_id: message.author_id.clone(),
            author_name: message.author_name.clone(),
            channel_id: message.channel_id.clone(),
            channel_name: message.channel_name.clone(),
            toxicity_score: analysis.toxicity_score,
            sentiment_score: analysis.sentiment_score,
            message_url: message.url.clone(),
            incident_id,
        }
    }
}

/// Text of the notice posted after a message is removed.
pub fn warning_notice(message: &ChatMessage, severity: Severity) -> String {
    format!(
        "{}, your message was removed due to policy violations. Severity: {}",
        message.author_label(),
        severity.as_str().to_uppercase()
    )
}

/// The chat platform's side of moderation.
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    async fn send_alert(&self, alert: &ModeratorAlert) -> Result<()>;

    async fn delete_message(&self, message: &ChatMessage) -> Result<()>;

    /// Post a notice in the message's channel.
    async fn post_notice(&self, message: &ChatMessage, text: &str) -> Result<NoticeHandle>;

    async fn remove_notice(&self, notice: &NoticeHandle) -> Result<()>;
}

/// What actually happened on the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub alerted: bool,
    pub deleted: bool,
    pub warned: bool,
}

/// Carry out a decision: alert, then delete, then warn.
///
/// The author is warned only once the delete has gone through. The warning
/// notice is removed after `warning_ttl` by a detached task.
pub async fn execute(
    gateway: &Arc<dyn PlatformGateway>,
    message: &ChatMessage,
    analysis: &AnalysisResult,
    decision: &ModerationDecision,
    incident_id: Option<i64>,
    warning_ttl: Duration,
) -> ActionReport {
    let mut report = ActionReport::default();

    if decision.should_alert {
        let alert = ModeratorAlert::new(message, analysis, incident_id);
        match gateway.send_alert(&alert).await {
            Ok(()) => report.alerted = true,
            Err(e) => error!(message_id = %message.message_id, error = %e, "Failed to send alert"),
        }
    }

    if decision.should_delete {
        match gateway.delete_message(message).await {
            Ok(()) => {
                report.deleted = true;
                info!(message_id = %message.message_id, "Message deleted");
            }
            Err(e) => {
                error!(message_id = %message.message_id, error = %e, "Failed to delete message")
            }
        }
    }

    if decision.should_warn && report.deleted {
        let text = warning_notice(message, analysis.severity);
        match gateway.post_notice(message, &text).await {
            Ok(notice) => {
                report.warned = true;
                schedule_notice_removal(Arc::clone(gateway), notice, warning_ttl);
            }
            Err(e) => error!(message_id = %message.message_id, error = %e, "Failed to warn author"),
        }
    }

    report
}

/// Remove a notice after `ttl`. Fire-and-forget: a notice that is already
/// gone is not an error worth reporting.
pub fn schedule_notice_removal(
    gateway: Arc<dyn PlatformGateway>,
    notice: NoticeHandle,
    ttl: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(ttl).await;
        if let Err(e) = gateway.remove_notice(&notice).await {
            debug!(notice_id = %notice.notice_id, error = %e, "Notice removal failed, ignoring");
        }
    })
}

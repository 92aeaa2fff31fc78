// Chat messages and the normalized incident record handed to the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::language::LanguageInfo;
use crate::scoring::analyzer::AnalysisDetails;
use crate::scoring::{AnalysisResult, Severity};

/// Status every new incident starts in; moderators move it on from there.
pub const STATUS_PENDING: &str = "pending";

/// A chat message as delivered by a platform gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub platform: String,
    pub message_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_display_name: Option<String>,
    pub author_is_bot: bool,
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub guild_id: Option<String>,
    pub guild_name: Option<String>,
    pub url: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// A minimal message, mostly for the CLI and tests. Optional fields are empty.
    pub fn new(
        platform: impl Into<String>,
        message_id: impl Into<String>,
        author_name: impl Into<String>,
        channel_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let author_name = author_name.into();
        Self {
            platform: platform.into(),
            message_id: message_id.into(),
            author_id: author_name.clone(),
            author_name,
            author_display_name: None,
            author_is_bot: false,
            channel_id: channel_id.into(),
            channel_name: None,
            guild_id: None,
            guild_name: None,
            url: None,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Name to address the author by in notices.
    pub fn author_label(&self) -> &str {
        self.author_display_name.as_deref().unwrap_or(&self.author_name)
    }
}

/// Where the message was posted, plus the full analysis trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentContext {
    pub message_id: String,
    pub message_url: Option<String>,
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub guild_id: Option<String>,
    pub guild_name: Option<String>,
    pub author_display_name: Option<String>,
    pub detected_language: String,
    pub language_detection: LanguageInfo,
    pub analysis_details: AnalysisDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentRecord {
    pub platform: String,
    pub severity: Severity,
    pub status: String,
    pub content: String,
    pub context: IncidentContext,
    pub author_id: String,
    pub author_name: String,
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub message_url: Option<String>,
    pub toxicity_score: f64,
    pub sentiment_score: f64,
    pub is_threat: bool,
    pub detected_language: String,
    /// When the message was posted.
    pub detected_at: DateTime<Utc>,
}

impl IncidentRecord {
    pub fn new(message: &ChatMessage, analysis: &AnalysisResult) -> Self {
        Self {
            platform: message.platform.clone(),
            severity: analysis.severity,
            status: STATUS_PENDING.to_string(),
            content: message.content.clone(),
            context: IncidentContext {
                message_id: message.message_id.clone(),
                message_url: message.url.clone(),
                channel_id: message.channel_id.clone(),
                channel_name: message.channel_name.clone(),
                guild_id: message.guild_id.clone(),
                guild_name: message.guild_name.clone(),
                author_display_name: message.author_display_name.clone(),
                detected_language: analysis.detected_language.clone(),
                language_detection: analysis.language().clone(),
                analysis_details: analysis.details.clone(),
            },
            author_id: message.author_id.clone(),
            author_name: message.author_name.clone(),
            channel_id: message.channel_id.clone(),
            channel_name: message.channel_name.clone(),
            message_url: message.url.clone(),
            toxicity_score: analysis.toxicity_score,
            sentiment_score: analysis.sentiment_score,
            is_threat: analysis.is_threat,
            detected_language: analysis.detected_language.clone(),
            detected_at: message.created_at,
        }
    }

    /// The context block as JSON, for storage.
    pub fn context_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Analyzer;

    #[tokio::test]
    async fn test_record_from_message_and_analysis() {
        let mut message = ChatMessage::new("discord", "m1", "alice", "c1", "I will hurt and attack");
        message.guild_name = Some("Guild".to_string());
        let analysis = Analyzer::keyword_only()
            .analyze(&message.content, &message.platform)
            .await
            .unwrap();

        let record = IncidentRecord::new(&message, &analysis);
        assert_eq!(record.platform, "discord");
        assert_eq!(record.status, STATUS_PENDING);
        assert_eq!(record.severity, analysis.severity);
        assert_eq!(record.detected_at, message.created_at);
        assert_eq!(record.context.guild_name.as_deref(), Some("Guild"));

        let context: serde_json::Value = serde_json::from_str(&record.context_json().unwrap()).unwrap();
        assert_eq!(context["message_id"], "m1");
        assert!(context["analysis_details"]["toxicity_breakdown"]["matched_terms"].is_array());
    }

    #[test]
    fn test_author_label_prefers_display_name() {
        let mut message = ChatMessage::new("discord", "m1", "alice", "c1", "hi");
        assert_eq!(message.author_label(), "alice");
        message.author_display_name = Some("Alice A.".to_string());
        assert_eq!(message.author_label(), "Alice A.");
    }
}

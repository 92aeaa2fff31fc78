// Data models: Rust structs that map to database rows.
//
// Kept apart from the queries so the rest of the crate can use them without
// depending on rusqlite directly.

use serde::{Deserialize, Serialize};

use crate::scoring::Severity;

/// An incident as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredIncident {
    pub id: i64,
    pub platform: String,
    pub severity: Severity,
    pub status: String,
    pub content: String,
    /// Message location and the full analysis trail (JSON in the DB)
    pub context: serde_json::Value,
    pub author_id: String,
    pub author_name: String,
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub message_url: Option<String>,
    pub toxicity_score: f64,
    pub sentiment_score: f64,
    pub is_threat: bool,
    pub detected_language: String,
    pub detected_at: String,
    pub created_at: String,
}

/// One row per platform: what the moderation loop has been doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStatus {
    pub platform: String,
    /// e.g. "online", "offline"
    pub status: String,
    pub last_ping: String,
    pub message_count: i64,
    pub incidents_detected: i64,
    pub messages_deleted: i64,
    pub uptime_seconds: i64,
}

/// Incident counts keyed by severity, lowest first.
pub type SeverityCounts = Vec<(Severity, i64)>;

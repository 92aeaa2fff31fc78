// Database queries: CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::{Context, Result};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{BotStatus, SeverityCounts, StoredIncident};
use crate::moderation::IncidentRecord;
use crate::scoring::Severity;

// --- Incidents ---

/// Insert a new incident and return its ID.
pub fn insert_incident(conn: &Connection, record: &IncidentRecord) -> Result<i64> {
    let context = record
        .context_json()
        .context("Failed to serialize incident context")?;
    conn.execute(
        "INSERT INTO incidents
            (platform, severity, status, content, context, author_id, author_name,
             channel_id, channel_name, message_url, toxicity_score, sentiment_score,
             is_threat, detected_language, detected_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            record.platform,
            record.severity.as_str(),
            record.status,
            record.content,
            context,
            record.author_id,
            record.author_name,
            record.channel_id,
            record.channel_name,
            record.message_url,
            record.toxicity_score,
            record.sentiment_score,
            record.is_threat,
            record.detected_language,
            record.detected_at.to_rfc3339(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent incidents first, optionally only those at or above `min_severity`.
pub fn get_recent_incidents(
    conn: &Connection,
    limit: u32,
    min_severity: Option<Severity>,
) -> Result<Vec<StoredIncident>> {
    let mut stmt = conn.prepare(
        "SELECT id, platform, severity, status, content, context, author_id, author_name,
                channel_id, channel_name, message_url, toxicity_score, sentiment_score,
                is_threat, detected_language, detected_at, created_at
         FROM incidents
         WHERE CASE severity
                   WHEN 'low' THEN 1
                   WHEN 'medium' THEN 2
                   WHEN 'high' THEN 3
                   WHEN 'critical' THEN 4
                   ELSE 0
               END >= ?1
         ORDER BY id DESC
         LIMIT ?2",
    )?;

    let floor = min_severity.unwrap_or(Severity::Low).ordinal();
    let incidents = stmt
        .query_map(params![floor, limit], incident_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(incidents)
}

fn incident_from_row(row: &Row<'_>) -> rusqlite::Result<StoredIncident> {
    let severity: String = row.get(2)?;
    let severity = severity
        .parse::<Severity>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into()))?;
    let context: String = row.get(5)?;
    let context = serde_json::from_str(&context)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(StoredIncident {
        id: row.get(0)?,
        platform: row.get(1)?,
        severity,
        status: row.get(3)?,
        content: row.get(4)?,
        context,
        author_id: row.get(6)?,
        author_name: row.get(7)?,
        channel_id: row.get(8)?,
        channel_name: row.get(9)?,
        message_url: row.get(10)?,
        toxicity_score: row.get(11)?,
        sentiment_score: row.get(12)?,
        is_threat: row.get(13)?,
        detected_language: row.get(14)?,
        detected_at: row.get(15)?,
        created_at: row.get(16)?,
    })
}

/// Incident counts for every severity, including those with none.
pub fn count_by_severity(conn: &Connection) -> Result<SeverityCounts> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM incidents WHERE severity = ?1")?;
    let mut counts = Vec::with_capacity(4);
    for severity in [Severity::Low, Severity::Medium, Severity::High, Severity::Critical] {
        let count: i64 = stmt.query_row(params![severity.as_str()], |row| row.get(0))?;
        counts.push((severity, count));
    }
    Ok(counts)
}

// --- Bot status ---

/// Save or update the status row for a platform.
pub fn upsert_bot_status(conn: &Connection, status: &BotStatus) -> Result<()> {
    conn.execute(
        "INSERT INTO bot_status
            (platform, status, last_ping, message_count, incidents_detected,
             messages_deleted, uptime_seconds)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(platform) DO UPDATE SET
            status = ?2,
            last_ping = ?3,
            message_count = ?4,
            incidents_detected = ?5,
            messages_deleted = ?6,
            uptime_seconds = ?7",
        params![
            status.platform,
            status.status,
            status.last_ping,
            status.message_count,
            status.incidents_detected,
            status.messages_deleted,
            status.uptime_seconds,
        ],
    )?;
    Ok(())
}

pub fn get_bot_status(conn: &Connection, platform: &str) -> Result<Option<BotStatus>> {
    let mut stmt = conn.prepare(
        "SELECT platform, status, last_ping, message_count, incidents_detected,
                messages_deleted, uptime_seconds
         FROM bot_status WHERE platform = ?1",
    )?;
    let result = stmt.query_row(params![platform], bot_status_from_row).optional()?;
    Ok(result)
}

/// All platform status rows, most recently pinged first.
pub fn get_all_bot_status(conn: &Connection) -> Result<Vec<BotStatus>> {
    let mut stmt = conn.prepare(
        "SELECT platform, status, last_ping, message_count, incidents_detected,
                messages_deleted, uptime_seconds
         FROM bot_status ORDER BY last_ping DESC",
    )?;
    let rows = stmt.query_map([], bot_status_from_row)?;
    let mut statuses = Vec::new();
    for row in rows {
        statuses.push(row?);
    }
    Ok(statuses)
}

fn bot_status_from_row(row: &Row<'_>) -> rusqlite::Result<BotStatus> {
    Ok(BotStatus {
        platform: row.get(0)?,
        status: row.get(1)?,
        last_ping: row.get(2)?,
        message_count: row.get(3)?,
        incidents_detected: row.get(4)?,
        messages_deleted: row.get(5)?,
        uptime_seconds: row.get(6)?,
    })
}

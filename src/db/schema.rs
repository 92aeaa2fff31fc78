// Database schema: table creation and migrations.
//
// A `schema_version` table tracks which migrations have run, and each
// migration is a function that executes SQL statements.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent, safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Messages the moderation policy chose to keep a record of
        CREATE TABLE IF NOT EXISTS incidents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            platform TEXT NOT NULL,
            severity TEXT NOT NULL,            -- low / medium / high / critical
            status TEXT NOT NULL DEFAULT 'pending',
            content TEXT NOT NULL,
            context TEXT NOT NULL,             -- JSON: message location + analysis details
            author_id TEXT NOT NULL,
            author_name TEXT NOT NULL,
            channel_id TEXT NOT NULL,
            channel_name TEXT,
            message_url TEXT,
            toxicity_score REAL NOT NULL,      -- 0.0 to 1.0
            sentiment_score REAL NOT NULL,     -- -1.0 to 1.0
            is_threat INTEGER NOT NULL DEFAULT 0,
            detected_language TEXT NOT NULL,
            detected_at TEXT NOT NULL,         -- when the message was posted (RFC 3339)
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Per-platform liveness and counters
        CREATE TABLE IF NOT EXISTS bot_status (
            platform TEXT PRIMARY KEY,
            status TEXT NOT NULL,
            last_ping TEXT NOT NULL,
            message_count INTEGER NOT NULL DEFAULT 0,
            incidents_detected INTEGER NOT NULL DEFAULT 0,
            uptime_seconds INTEGER NOT NULL DEFAULT 0
        );

        -- Index for the severity summary
        CREATE INDEX IF NOT EXISTS idx_incidents_severity
            ON incidents(severity);

        -- Index for listing recent incidents
        CREATE INDEX IF NOT EXISTS idx_incidents_created
            ON incidents(created_at);
        ",
    )
    .context("Failed to create database tables")?;

    // Record initial schema version if not already set
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    // Migration v2: track deletions alongside the other bot counters.
    run_migration(conn, 2, |c| {
        c.execute_batch(
            "ALTER TABLE bot_status ADD COLUMN messages_deleted INTEGER NOT NULL DEFAULT 0;",
        )
    })?;

    Ok(())
}

/// Run a migration if it hasn't been applied yet.
fn run_migration<F>(conn: &Connection, version: i64, migrate: F) -> Result<()>
where
    F: FnOnce(&Connection) -> rusqlite::Result<()>,
{
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM schema_version WHERE version = ?1",
        [version],
        |row| row.get(0),
    )?;

    if !already_applied {
        migrate(conn).with_context(|| format!("Migration v{version} failed"))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
    }

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        // schema_version, incidents, bot_status
        assert_eq!(table_count(&conn).unwrap(), 3i64);
    }

    #[test]
    fn test_migration_v2_adds_messages_deleted_column() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn.execute(
            "INSERT INTO bot_status (platform, status, last_ping, messages_deleted)
             VALUES ('discord', 'online', '2026-01-01T00:00:00Z', 4)",
            [],
        )
        .unwrap();
        let deleted: i64 = conn
            .query_row(
                "SELECT messages_deleted FROM bot_status WHERE platform = 'discord'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(deleted, 4);
    }
}

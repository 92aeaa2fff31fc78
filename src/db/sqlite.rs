// SqliteStore: rusqlite backend implementing the IncidentStore trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
//
// The free functions in queries.rs stay usable against a Connection directly.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{BotStatus, SeverityCounts, StoredIncident};
use super::traits::IncidentStore;
use crate::moderation::IncidentRecord;
use crate::scoring::Severity;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl IncidentStore for SqliteStore {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn save_incident(&self, record: &IncidentRecord) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_incident(&conn, record)
    }

    async fn get_recent_incidents(
        &self,
        limit: u32,
        min_severity: Option<Severity>,
    ) -> Result<Vec<StoredIncident>> {
        let conn = self.conn.lock().await;
        super::queries::get_recent_incidents(&conn, limit, min_severity)
    }

    async fn count_by_severity(&self) -> Result<SeverityCounts> {
        let conn = self.conn.lock().await;
        super::queries::count_by_severity(&conn)
    }

    async fn upsert_bot_status(&self, status: &BotStatus) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::upsert_bot_status(&conn, status)
    }

    async fn get_bot_status(&self, platform: &str) -> Result<Option<BotStatus>> {
        let conn = self.conn.lock().await;
        super::queries::get_bot_status(&conn, platform)
    }

    async fn get_all_bot_status(&self) -> Result<Vec<BotStatus>> {
        let conn = self.conn.lock().await;
        super::queries::get_all_bot_status(&conn)
    }
}

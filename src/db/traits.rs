// Incident store trait: backend-agnostic async interface for persistence.
//
// All methods are async so a sync backend (rusqlite behind a Mutex) and any
// native async backend fit behind the same interface. The moderation loop
// only ever sees `Arc<dyn IncidentStore>`.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{BotStatus, SeverityCounts, StoredIncident};
use crate::moderation::IncidentRecord;
use crate::scoring::Severity;

#[async_trait]
pub trait IncidentStore: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the store.
    async fn table_count(&self) -> Result<i64>;

    // --- Incidents ---

    /// Persist an incident and return its ID.
    async fn save_incident(&self, record: &IncidentRecord) -> Result<i64>;

    /// Most recent incidents first, optionally filtered by minimum severity.
    async fn get_recent_incidents(
        &self,
        limit: u32,
        min_severity: Option<Severity>,
    ) -> Result<Vec<StoredIncident>>;

    /// Incident counts for every severity.
    async fn count_by_severity(&self) -> Result<SeverityCounts>;

    // --- Bot status ---

    /// Save or update the status row for a platform.
    async fn upsert_bot_status(&self, status: &BotStatus) -> Result<()>;

    async fn get_bot_status(&self, platform: &str) -> Result<Option<BotStatus>>;

    /// All platform status rows, most recently pinged first.
    async fn get_all_bot_status(&self) -> Result<Vec<BotStatus>>;
}

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use scenario::{PlanRecord, PredictionRecord, ReportRecord, ScenarioRecord};

/// Create-only persistence for the four record kinds.
///
/// Records are immutable once written; there is no update or delete.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_scenario(&self, record: &ScenarioRecord) -> Result<()>;
    async fn insert_prediction(&self, record: &PredictionRecord) -> Result<()>;
    async fn insert_plan(&self, record: &PlanRecord) -> Result<()>;
    async fn insert_report(&self, record: &ReportRecord) -> Result<()>;

    async fn get_scenario(&self, id: Uuid) -> Result<Option<ScenarioRecord>>;
    async fn get_prediction(&self, id: Uuid) -> Result<Option<PredictionRecord>>;
    async fn get_plan(&self, id: Uuid) -> Result<Option<PlanRecord>>;
    async fn get_report(&self, id: Uuid) -> Result<Option<ReportRecord>>;

    /// All scenarios, newest first.
    async fn list_scenarios(&self) -> Result<Vec<ScenarioRecord>>;

    async fn counts(&self) -> Result<StoreCounts>;

    /// Backend name for logs and stats.
    fn backend(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub scenarios: usize,
    pub predictions: usize,
    pub plans: usize,
    pub reports: usize,
}

use anyhow::Result;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use scenario::{PlanRecord, PredictionRecord, ReportRecord, ScenarioRecord};

use crate::{Store, StoreCounts};

/// In-process store. Enforces the same foreign keys as the relational schema.
#[derive(Clone, Default)]
pub struct MemoryStore {
    scenarios: Arc<DashMap<Uuid, ScenarioRecord>>,
    predictions: Arc<DashMap<Uuid, PredictionRecord>>,
    plans: Arc<DashMap<Uuid, PlanRecord>>,
    reports: Arc<DashMap<Uuid, ReportRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn require_scenario(&self, id: Uuid) -> Result<()> {
        if !self.scenarios.contains_key(&id) {
            anyhow::bail!("foreign key violation: scenario {} does not exist", id);
        }
        Ok(())
    }
}

fn insert_new<T: Clone>(map: &DashMap<Uuid, T>, id: Uuid, record: &T, table: &str) -> Result<()> {
    match map.entry(id) {
        Entry::Occupied(_) => anyhow::bail!("duplicate key: {} {} already exists", table, id),
        Entry::Vacant(slot) => {
            slot.insert(record.clone());
        }
    }
    debug!(table, %id, "Inserted record");
    Ok(())
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_scenario(&self, record: &ScenarioRecord) -> Result<()> {
        insert_new(&self.scenarios, record.id, record, "scenarios")
    }

    async fn insert_prediction(&self, record: &PredictionRecord) -> Result<()> {
        self.require_scenario(record.scenario_id)?;
        insert_new(&self.predictions, record.id, record, "predictions")
    }

    async fn insert_plan(&self, record: &PlanRecord) -> Result<()> {
        self.require_scenario(record.scenario_id)?;
        insert_new(&self.plans, record.id, record, "plans")
    }

    async fn insert_report(&self, record: &ReportRecord) -> Result<()> {
        self.require_scenario(record.scenario_id)?;
        if !self.predictions.contains_key(&record.prediction_id) {
            anyhow::bail!(
                "foreign key violation: prediction {} does not exist",
                record.prediction_id
            );
        }
        if !self.plans.contains_key(&record.plan_id) {
            anyhow::bail!("foreign key violation: plan {} does not exist", record.plan_id);
        }
        insert_new(&self.reports, record.id, record, "reports")
    }

    async fn get_scenario(&self, id: Uuid) -> Result<Option<ScenarioRecord>> {
        Ok(self.scenarios.get(&id).map(|r| r.value().clone()))
    }

    async fn get_prediction(&self, id: Uuid) -> Result<Option<PredictionRecord>> {
        Ok(self.predictions.get(&id).map(|r| r.value().clone()))
    }

    async fn get_plan(&self, id: Uuid) -> Result<Option<PlanRecord>> {
        Ok(self.plans.get(&id).map(|r| r.value().clone()))
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<ReportRecord>> {
        Ok(self.reports.get(&id).map(|r| r.value().clone()))
    }

    async fn list_scenarios(&self) -> Result<Vec<ScenarioRecord>> {
        let mut all: Vec<ScenarioRecord> = self.scenarios
            .iter()
            .map(|r| r.value().clone())
            .collect();
        // Newest first; id breaks ties so equal timestamps list stably.
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(all)
    }

    async fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            scenarios: self.scenarios.len(),
            predictions: self.predictions.len(),
            plans: self.plans.len(),
            reports: self.reports.len(),
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use predict::PredictionService;
use report::ReportBuilder;
use scenario::{
    PlanRecord, PredictionRecord, ReportRecord, ResourcePrediction, ScenarioInput, ScenarioRecord,
    ScenarioSummary,
};
use store::{Store, StoreCounts};

use crate::error::{Error, Result};
use crate::pipeline::{Pipeline, RunOutcome, WorkflowSummary};
use crate::steps::Services;

/// Request-level operations over the pipeline and the store.
#[derive(Clone)]
pub struct Planner {
    services: Services,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub prediction_id: Uuid,
    pub scenario_id: Uuid,
    #[serde(flatten)]
    pub prediction: ResourcePrediction,
    pub generated_at: DateTime<Utc>,
}

impl From<&PredictionRecord> for PredictionSummary {
    fn from(record: &PredictionRecord) -> Self {
        Self {
            prediction_id: record.id,
            scenario_id: record.scenario_id,
            prediction: record.prediction.clone(),
            generated_at: record.created_at,
        }
    }
}

impl PredictionSummary {
    pub fn from_outcome(outcome: &RunOutcome) -> Result<Self> {
        Ok(Self::from(outcome.context.require_prediction()?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOutcome {
    pub scenario_id: Uuid,
    pub prediction: PredictionRecord,
    pub allocation: PlanRecord,
}

impl PlanOutcome {
    pub fn from_outcome(outcome: RunOutcome) -> Result<Self> {
        let ctx = outcome.context;
        Ok(Self {
            scenario_id: ctx.require_scenario_id()?,
            prediction: ctx.require_prediction()?.clone(),
            allocation: ctx.require_plan()?.clone(),
        })
    }
}

/// A rendered document ready to send.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannerStats {
    pub backend: &'static str,
    pub model: String,
    pub counts: StoreCounts,
}

impl Planner {
    pub fn new(store: Arc<dyn Store>, predictor: PredictionService, reports: ReportBuilder) -> Self {
        Self {
            services: Services {
                store,
                predictor,
                reports,
            },
        }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Run an arbitrary pipeline; the coordinator operations below use the presets.
    pub async fn run(&self, pipeline: &Pipeline, input: ScenarioInput) -> Result<RunOutcome> {
        pipeline.run(&self.services, input).await
    }

    pub async fn predict(&self, input: ScenarioInput) -> Result<PredictionSummary> {
        let outcome = self.run(&Pipeline::prediction(), input).await?;
        PredictionSummary::from_outcome(&outcome)
    }

    pub async fn plan(&self, input: ScenarioInput) -> Result<PlanOutcome> {
        let outcome = self.run(&Pipeline::planning(), input).await?;
        PlanOutcome::from_outcome(outcome)
    }

    pub async fn report(&self, input: ScenarioInput) -> Result<WorkflowSummary> {
        let outcome = self.run(&Pipeline::full(), input).await?;
        Ok(outcome.summary())
    }

    pub async fn get_scenario(&self, id: Uuid) -> Result<ScenarioRecord> {
        self.services
            .store
            .get_scenario(id)
            .await
            .map_err(Error::Persistence)?
            .ok_or_else(|| Error::not_found("scenario", id))
    }

    pub async fn get_prediction(&self, id: Uuid) -> Result<PredictionRecord> {
        self.services
            .store
            .get_prediction(id)
            .await
            .map_err(Error::Persistence)?
            .ok_or_else(|| Error::not_found("prediction", id))
    }

    pub async fn get_plan(&self, id: Uuid) -> Result<PlanRecord> {
        self.services
            .store
            .get_plan(id)
            .await
            .map_err(Error::Persistence)?
            .ok_or_else(|| Error::not_found("plan", id))
    }

    pub async fn get_report(&self, id: Uuid) -> Result<ReportRecord> {
        self.services
            .store
            .get_report(id)
            .await
            .map_err(Error::Persistence)?
            .ok_or_else(|| Error::not_found("report", id))
    }

    pub async fn list_scenarios(&self) -> Result<Vec<ScenarioSummary>> {
        let all = self
            .services
            .store
            .list_scenarios()
            .await
            .map_err(Error::Persistence)?;
        Ok(all.iter().map(ScenarioSummary::from).collect())
    }

    /// Read the stored document of a report.
    pub async fn download_report(&self, id: Uuid) -> Result<ReportDocument> {
        let report = self.get_report(id).await?;

        let bytes = match tokio::fs::read(&report.pdf_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(report_id = %id, pdf_path = %report.pdf_path, "Report document missing");
                return Err(Error::not_found("report document", &report.pdf_path));
            }
            Err(e) => {
                return Err(Error::Persistence(anyhow::Error::new(e).context(format!(
                    "Failed to read report document {}",
                    report.pdf_path
                ))));
            }
        };

        info!(report_id = %id, size = bytes.len(), "Report document read");
        Ok(ReportDocument {
            file_name: format!("disaster_response_report_{}.pdf", id),
            bytes,
        })
    }

    pub async fn stats(&self) -> Result<PlannerStats> {
        let counts = self
            .services
            .store
            .counts()
            .await
            .map_err(Error::Persistence)?;
        Ok(PlannerStats {
            backend: self.services.store.backend(),
            model: self.services.predictor.model().to_string(),
            counts,
        })
    }
}

use serde::Serialize;
use uuid::Uuid;

use scenario::{PlanRecord, PredictionRecord, ReportRecord, ScenarioInput, ScenarioRecord};

use crate::error::{Error, Result};

/// State threaded through one pipeline run. Each step reads what earlier steps
/// wrote and adds its own fields through a [`ContextPatch`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunContext {
    pub scenario_data: Option<ScenarioInput>,
    pub scenario: Option<ScenarioRecord>,
    pub prediction: Option<PredictionRecord>,
    pub plan: Option<PlanRecord>,
    pub report: Option<ReportRecord>,
    pub narrative: Option<String>,
    pub status: Option<&'static str>,
}

/// What a step produced. Fields left as `None` keep their current value on merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ScenarioRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}

impl RunContext {
    pub fn new(scenario_data: ScenarioInput) -> Self {
        Self {
            scenario_data: Some(scenario_data),
            ..Self::default()
        }
    }

    pub fn merge(&mut self, patch: ContextPatch) {
        if patch.scenario.is_some() {
            self.scenario = patch.scenario;
        }
        if patch.prediction.is_some() {
            self.prediction = patch.prediction;
        }
        if patch.plan.is_some() {
            self.plan = patch.plan;
        }
        if patch.report.is_some() {
            self.report = patch.report;
        }
        if patch.narrative.is_some() {
            self.narrative = patch.narrative;
        }
        if patch.status.is_some() {
            self.status = patch.status;
        }
    }

    pub fn require_scenario_data(&self) -> Result<&ScenarioInput> {
        self.scenario_data.as_ref().ok_or(Error::MissingInput {
            key: "scenario_data",
        })
    }

    pub fn require_scenario_id(&self) -> Result<Uuid> {
        self.scenario
            .as_ref()
            .map(|s| s.id)
            .ok_or(Error::MissingInput { key: "scenario_id" })
    }

    pub fn require_prediction(&self) -> Result<&PredictionRecord> {
        self.prediction
            .as_ref()
            .ok_or(Error::MissingInput { key: "prediction" })
    }

    pub fn require_plan(&self) -> Result<&PlanRecord> {
        self.plan.as_ref().ok_or(Error::MissingInput { key: "plan" })
    }
}

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, Instrument};
use uuid::Uuid;

use scenario::ScenarioInput;

use crate::context::{ContextPatch, RunContext};
use crate::error::{Error, Result};
use crate::steps::{self, Services};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    Ingest,
    Predict,
    Allocate,
    PersistConfirm,
    Report,
}

impl StepName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Ingest => "ingest",
            StepName::Predict => "predict",
            StepName::Allocate => "allocate",
            StepName::PersistConfirm => "persist_confirm",
            StepName::Report => "report",
        }
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub name: StepName,
    pub status: StepStatus,
    pub duration_us: u64,
}

impl StepRecord {
    pub fn duration_ms(&self) -> f64 {
        self.duration_us as f64 / 1000.0
    }
}

/// Ordered list of steps run against one shared context.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<StepName>,
}

impl Pipeline {
    pub fn new(steps: Vec<StepName>) -> Self {
        Self { steps }
    }

    /// ingest, predict, allocate, persist_confirm, report
    pub fn full() -> Self {
        Self::new(vec![
            StepName::Ingest,
            StepName::Predict,
            StepName::Allocate,
            StepName::PersistConfirm,
            StepName::Report,
        ])
    }

    pub fn planning() -> Self {
        Self::new(vec![StepName::Ingest, StepName::Predict, StepName::Allocate])
    }

    pub fn prediction() -> Self {
        Self::new(vec![StepName::Ingest, StepName::Predict])
    }

    pub fn steps(&self) -> &[StepName] {
        &self.steps
    }

    /// Validate the payload, then run every step in order. The first failing
    /// step ends the run; records already written by earlier steps are kept.
    pub async fn run(&self, services: &Services, input: ScenarioInput) -> Result<RunOutcome> {
        input.validate().map_err(Error::Validation)?;

        let workflow_id = Uuid::new_v4();
        let span = tracing::info_span!("workflow", %workflow_id);

        async move {
            info!(steps = self.steps.len(), "Starting workflow");
            let started = Instant::now();

            let mut context = RunContext::new(input);
            let mut results = BTreeMap::new();
            let mut records: Vec<StepRecord> = self
                .steps
                .iter()
                .map(|&name| StepRecord {
                    name,
                    status: StepStatus::Pending,
                    duration_us: 0,
                })
                .collect();

            for i in 0..records.len() {
                let step = records[i].name;
                records[i].status = StepStatus::Running;
                info!(%step, "Step started");
                let step_started = Instant::now();

                let outcome = run_step(step, services, &context).await;
                let record = &mut records[i];
                record.duration_us = step_started.elapsed().as_micros() as u64;

                match outcome {
                    Ok(patch) => {
                        record.status = StepStatus::Completed;
                        info!(%step, duration_ms = record.duration_ms(), "Step completed");
                        results.insert(step, patch.clone());
                        context.merge(patch);
                    }
                    Err(e) => {
                        record.status = StepStatus::Failed;
                        error!(%step, duration_ms = record.duration_ms(), error = %e, "Step failed");
                        return Err(Error::StepFailed {
                            step,
                            source: Box::new(e),
                            steps: records,
                        });
                    }
                }
            }

            info!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Workflow completed"
            );

            Ok(RunOutcome {
                workflow_id,
                context,
                results,
                steps: records,
            })
        }
        .instrument(span)
        .await
    }
}

async fn run_step(step: StepName, services: &Services, ctx: &RunContext) -> Result<ContextPatch> {
    match step {
        StepName::Ingest => steps::ingest(services, ctx).await,
        StepName::Predict => steps::predict(services, ctx).await,
        StepName::Allocate => steps::allocate(services, ctx).await,
        StepName::PersistConfirm => steps::persist_confirm(ctx),
        StepName::Report => steps::report(services, ctx).await,
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub workflow_id: Uuid,
    pub context: RunContext,
    pub results: BTreeMap<StepName, ContextPatch>,
    pub steps: Vec<StepRecord>,
}

impl RunOutcome {
    pub fn summary(&self) -> WorkflowSummary {
        let ctx = &self.context;
        WorkflowSummary {
            workflow_id: self.workflow_id,
            status: "completed",
            scenario_id: ctx.scenario.as_ref().map(|s| s.id),
            prediction_id: ctx.prediction.as_ref().map(|p| p.id),
            plan_id: ctx.plan.as_ref().map(|p| p.id),
            report_id: ctx.report.as_ref().map(|r| r.id),
            pdf_path: ctx.report.as_ref().map(|r| PathBuf::from(&r.pdf_path)),
            summary: KeyMetrics {
                confidence_score: ctx.prediction.as_ref().map(|p| p.prediction.confidence_score),
                efficiency_score: ctx.plan.as_ref().map(|p| p.plan.efficiency_score),
                total_cost: ctx.plan.as_ref().map(|p| p.plan.total_cost),
                timeline_hours: ctx.plan.as_ref().map(|p| p.plan.timeline_hours),
            },
        }
    }

    pub fn total_duration_ms(&self) -> f64 {
        self.steps.iter().map(StepRecord::duration_ms).sum()
    }
}

/// Terminal summary of a run. Ids of steps that were not part of the pipeline are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowSummary {
    pub workflow_id: Uuid,
    pub status: &'static str,
    pub scenario_id: Option<Uuid>,
    pub prediction_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    pub report_id: Option<Uuid>,
    pub pdf_path: Option<PathBuf>,
    pub summary: KeyMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMetrics {
    pub confidence_score: Option<f64>,
    pub efficiency_score: Option<f64>,
    pub total_cost: Option<f64>,
    pub timeline_hours: Option<u32>,
}

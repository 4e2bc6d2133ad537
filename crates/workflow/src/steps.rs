use std::sync::Arc;
use tracing::{info, warn};

use predict::PredictionService;
use report::ReportBuilder;
use scenario::{PlanRecord, PredictionRecord, ReportRecord, ScenarioRecord};
use store::Store;

use crate::context::{ContextPatch, RunContext};
use crate::error::{Error, Result};

/// Collaborators every step may call.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn Store>,
    pub predictor: PredictionService,
    pub reports: ReportBuilder,
}

pub async fn ingest(services: &Services, ctx: &RunContext) -> Result<ContextPatch> {
    let input = ctx.require_scenario_data()?;
    input.validate().map_err(Error::Validation)?;

    let record = ScenarioRecord::new(input.clone());
    services
        .store
        .insert_scenario(&record)
        .await
        .map_err(Error::Persistence)?;
    info!(scenario_id = %record.id, disaster_type = %input.disaster_type, "Scenario stored");

    Ok(ContextPatch {
        scenario: Some(record),
        status: Some("ingested"),
        ..Default::default()
    })
}

pub async fn predict(services: &Services, ctx: &RunContext) -> Result<ContextPatch> {
    let input = ctx.require_scenario_data()?;
    let scenario_id = ctx.require_scenario_id()?;

    let prediction = services
        .predictor
        .predict_resources(input)
        .await
        .map_err(|e| Error::upstream("prediction_service", e))?;

    let record = PredictionRecord::new(scenario_id, prediction);
    services
        .store
        .insert_prediction(&record)
        .await
        .map_err(Error::Persistence)?;
    info!(
        prediction_id = %record.id,
        needs = record.prediction.predicted_needs.len(),
        confidence = record.prediction.confidence_score,
        "Prediction stored"
    );

    Ok(ContextPatch {
        prediction: Some(record),
        status: Some("predicted"),
        ..Default::default()
    })
}

pub async fn allocate(services: &Services, ctx: &RunContext) -> Result<ContextPatch> {
    let input = ctx.require_scenario_data()?;
    let scenario_id = ctx.require_scenario_id()?;
    let needs = &ctx.require_prediction()?.prediction.predicted_needs;
    if needs.is_empty() {
        return Err(Error::MissingInput {
            key: "predicted_needs",
        });
    }

    let plan = services
        .predictor
        .generate_allocation(input, needs)
        .await
        .map_err(|e| Error::upstream("prediction_service", e))?;

    let record = PlanRecord::new(scenario_id, plan);
    services
        .store
        .insert_plan(&record)
        .await
        .map_err(Error::Persistence)?;
    info!(
        plan_id = %record.id,
        efficiency = record.plan.efficiency_score,
        total_cost = record.plan.total_cost,
        "Allocation plan stored"
    );

    Ok(ContextPatch {
        plan: Some(record),
        status: Some("allocated"),
        ..Default::default()
    })
}

/// Bookkeeping only: everything was written by the earlier steps.
pub fn persist_confirm(ctx: &RunContext) -> Result<ContextPatch> {
    let scenario_id = ctx.scenario.as_ref().map(|s| s.id.to_string());
    let prediction_id = ctx.prediction.as_ref().map(|p| p.id.to_string());
    let plan_id = ctx.plan.as_ref().map(|p| p.id.to_string());
    if scenario_id.is_none() || prediction_id.is_none() || plan_id.is_none() {
        warn!("Confirming a partially persisted run");
    }
    info!(?scenario_id, ?prediction_id, ?plan_id, "Records persisted");

    Ok(ContextPatch {
        status: Some("saved"),
        ..Default::default()
    })
}

pub async fn report(services: &Services, ctx: &RunContext) -> Result<ContextPatch> {
    let input = ctx.require_scenario_data()?;
    let prediction = ctx.require_prediction()?;
    let plan = ctx.require_plan()?;

    let narrative = services
        .predictor
        .generate_narrative(input, &prediction.prediction, &plan.plan)
        .await
        .map_err(|e| Error::upstream("prediction_service", e))?;

    // Rendering is blocking work: layout plus std::fs writes.
    let builder = services.reports.clone();
    let (scenario, predicted, allocation, text) = (
        input.clone(),
        prediction.prediction.clone(),
        plan.plan.clone(),
        narrative.clone(),
    );
    let path = tokio::task::spawn_blocking(move || {
        builder.render(&scenario, &predicted, &allocation, &text)
    })
    .await
    .map_err(|e| {
        Error::upstream(
            "report_builder",
            anyhow::Error::new(e).context("Report render task failed"),
        )
    })?
    .map_err(|e| Error::upstream("report_builder", e))?;

    let record = ReportRecord::new(
        prediction,
        plan,
        narrative.clone(),
        path.to_string_lossy().into_owned(),
    );
    services
        .store
        .insert_report(&record)
        .await
        .map_err(Error::Persistence)?;
    info!(report_id = %record.id, pdf_path = %record.pdf_path, "Report stored");

    Ok(ContextPatch {
        report: Some(record),
        narrative: Some(narrative),
        status: Some("reported"),
        ..Default::default()
    })
}

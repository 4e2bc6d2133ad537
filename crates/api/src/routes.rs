use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use scenario::{DisasterType, ScenarioInput, Severity};
use workflow::{PlanOutcome, Pipeline, PredictionSummary, RunOutcome, WorkflowSummary};

use crate::error::ApiError;
use crate::metrics::TimedOperation;
use crate::response::ApiResponse;
use crate::AppState;

type ApiResult<T = Value> = Result<Json<ApiResponse<T>>, ApiError>;

const FEATURES: [&str; 5] = [
    "Resource Prediction",
    "Allocation Planning",
    "Narrative Generation",
    "PDF Report Generation",
    "Scenario History",
];

pub async fn root() -> Json<ApiResponse<Value>> {
    ApiResponse::ok(
        "RapidRelief API - AI-Powered Disaster Response Planning",
        json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "status": "operational",
            "features": FEATURES,
        }),
    )
}

pub async fn health() -> Json<ApiResponse<Value>> {
    ApiResponse::ok(
        "Service is healthy",
        json!({ "status": "healthy", "timestamp": chrono::Utc::now() }),
    )
}

fn scenario_body(payload: Result<Json<ScenarioInput>, JsonRejection>) -> Result<ScenarioInput, ApiError> {
    payload
        .map(|Json(input)| input)
        .map_err(|rejection| ApiError::InvalidBody {
            message: rejection.body_text(),
        })
}

fn parse_id(kind: &'static str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::UnknownId {
        kind,
        id: raw.to_string(),
    })
}

/// Run a pipeline for one request, feeding the run into the metrics.
async fn run_pipeline(
    state: &AppState,
    pipeline: Pipeline,
    input: ScenarioInput,
) -> Result<RunOutcome, ApiError> {
    info!(
        disaster_type = %input.disaster_type,
        severity = %input.severity,
        steps = pipeline.steps().len(),
        "Pipeline request received"
    );
    let timer = TimedOperation::start();
    match state.planner.run(&pipeline, input).await {
        Ok(outcome) => {
            state.metrics.record_run(&outcome, timer.elapsed());
            Ok(outcome)
        }
        Err(e) => {
            state.metrics.record_failed_run(&e, timer.elapsed());
            Err(e.into())
        }
    }
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScenarioInput>, JsonRejection>,
) -> ApiResult<PredictionSummary> {
    let input = scenario_body(payload)?;
    let outcome = run_pipeline(&state, Pipeline::prediction(), input).await?;
    let summary = PredictionSummary::from_outcome(&outcome)?;
    Ok(ApiResponse::ok(
        "Resource prediction completed successfully",
        summary,
    ))
}

pub async fn plan(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScenarioInput>, JsonRejection>,
) -> ApiResult<PlanOutcome> {
    let input = scenario_body(payload)?;
    let outcome = run_pipeline(&state, Pipeline::planning(), input).await?;
    let plan = PlanOutcome::from_outcome(outcome)?;
    Ok(ApiResponse::ok(
        "Allocation plan generated successfully",
        plan,
    ))
}

pub async fn report(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ScenarioInput>, JsonRejection>,
) -> ApiResult<WorkflowSummary> {
    let input = scenario_body(payload)?;
    let outcome = run_pipeline(&state, Pipeline::full(), input).await?;
    Ok(ApiResponse::ok(
        "Comprehensive report generated successfully",
        outcome.summary(),
    ))
}

pub async fn list_scenarios(State(state): State<Arc<AppState>>) -> ApiResult {
    let scenarios = state.planner.list_scenarios().await?;
    Ok(ApiResponse::ok(
        format!("Retrieved {} scenarios", scenarios.len()),
        json!({ "scenarios": scenarios }),
    ))
}

pub async fn get_scenario(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let scenario = state.planner.get_scenario(parse_id("scenario", &id)?).await?;
    Ok(ApiResponse::ok(
        "Scenario retrieved successfully",
        json!({ "scenario": scenario }),
    ))
}

pub async fn get_prediction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let prediction = state
        .planner
        .get_prediction(parse_id("prediction", &id)?)
        .await?;
    Ok(ApiResponse::ok(
        "Prediction retrieved successfully",
        json!({ "prediction": prediction }),
    ))
}

pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let plan = state.planner.get_plan(parse_id("plan", &id)?).await?;
    Ok(ApiResponse::ok(
        "Plan retrieved successfully",
        json!({ "plan": plan }),
    ))
}

pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let report = state.planner.get_report(parse_id("report", &id)?).await?;
    Ok(ApiResponse::ok(
        "Report retrieved successfully",
        json!({ "report": report }),
    ))
}

pub async fn download_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let document = state
        .planner
        .download_report(parse_id("report", &id)?)
        .await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.file_name),
        ),
    ];
    Ok((headers, document.bytes).into_response())
}

pub async fn disaster_types() -> Json<ApiResponse<Value>> {
    let types: Vec<&str> = DisasterType::ALL.iter().map(|t| t.as_str()).collect();
    ApiResponse::ok(
        "Disaster types retrieved successfully",
        json!({ "disaster_types": types }),
    )
}

pub async fn severity_levels() -> Json<ApiResponse<Value>> {
    let levels: Vec<&str> = Severity::ALL.iter().map(|s| s.as_str()).collect();
    ApiResponse::ok(
        "Severity levels retrieved successfully",
        json!({ "severity_levels": levels }),
    )
}

pub async fn not_found() -> (StatusCode, Json<ApiResponse<Value>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse {
            success: false,
            message: "Resource not found".to_string(),
            data: None,
            error: Some("The requested resource was not found".to_string()),
        }),
    )
}

pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult {
    let store = state.planner.stats().await?;
    Ok(ApiResponse::ok(
        "Statistics retrieved successfully",
        json!({
            "metrics": state.metrics.snapshot(),
            "store": store,
        }),
    ))
}

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use predict::{MockGenerator, PredictionService, TextGenerator};
use report::ReportBuilder;
use scenario::{PlanRecord, PredictionRecord, ReportRecord, ScenarioInput, ScenarioRecord};
use store::{MemoryStore, Store, StoreCounts};
use workflow::{ErrorKind, Pipeline, Planner, StepName, StepStatus};

/// Answers like the mock, except for the prompt kinds that are overridden.
struct Scripted {
    prediction: Option<&'static str>,
    narrative_fails: bool,
}

#[async_trait]
impl TextGenerator for Scripted {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let lower = prompt.to_lowercase();
        if lower.contains("narrative report") && self.narrative_fails {
            anyhow::bail!("model endpoint returned 503");
        }
        if lower.contains("predict resource needs") {
            if let Some(text) = self.prediction {
                return Ok(text.to_string());
            }
        }
        MockGenerator::new().generate(prompt).await
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Memory store whose plan writes always fail.
struct FailingPlans(MemoryStore);

#[async_trait]
impl Store for FailingPlans {
    async fn insert_scenario(&self, record: &ScenarioRecord) -> Result<()> {
        self.0.insert_scenario(record).await
    }

    async fn insert_prediction(&self, record: &PredictionRecord) -> Result<()> {
        self.0.insert_prediction(record).await
    }

    async fn insert_plan(&self, _record: &PlanRecord) -> Result<()> {
        anyhow::bail!("disk full")
    }

    async fn insert_report(&self, record: &ReportRecord) -> Result<()> {
        self.0.insert_report(record).await
    }

    async fn get_scenario(&self, id: Uuid) -> Result<Option<ScenarioRecord>> {
        self.0.get_scenario(id).await
    }

    async fn get_prediction(&self, id: Uuid) -> Result<Option<PredictionRecord>> {
        self.0.get_prediction(id).await
    }

    async fn get_plan(&self, id: Uuid) -> Result<Option<PlanRecord>> {
        self.0.get_plan(id).await
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<ReportRecord>> {
        self.0.get_report(id).await
    }

    async fn list_scenarios(&self) -> Result<Vec<ScenarioRecord>> {
        self.0.list_scenarios().await
    }

    async fn counts(&self) -> Result<StoreCounts> {
        self.0.counts().await
    }

    fn backend(&self) -> &'static str {
        "failing-plans"
    }
}

fn los_angeles() -> ScenarioInput {
    serde_json::from_value(serde_json::json!({
        "disaster_type": "earthquake",
        "severity": "high",
        "location": {
            "latitude": 34.0522,
            "longitude": -118.2437,
            "city": "Los Angeles",
            "state": "California",
            "country": "United States",
            "population": 3979576
        },
        "affected_area_km2": 150.5,
        "estimated_casualties": 2500,
        "infrastructure_damage": "Major damage to buildings and roads",
        "weather_conditions": "Clear skies, moderate temperatures",
        "available_volunteers": 1500,
        "description": "Major earthquake affecting downtown Los Angeles area"
    }))
    .unwrap()
}

fn planner_with(generator: Arc<dyn TextGenerator>, dir: &Path) -> (Planner, MemoryStore) {
    let store = MemoryStore::new();
    let planner = Planner::new(
        Arc::new(store.clone()),
        PredictionService::new(generator),
        ReportBuilder::new(dir),
    );
    (planner, store)
}

fn mock_planner(dir: &Path) -> (Planner, MemoryStore) {
    planner_with(Arc::new(MockGenerator::new()), dir)
}

#[tokio::test]
async fn test_full_run_links_one_record_of_each_kind() {
    let dir = tempfile::tempdir().unwrap();
    let (planner, store) = mock_planner(dir.path());

    let outcome = planner.run(&Pipeline::full(), los_angeles()).await.unwrap();

    let counts = store.counts().await.unwrap();
    assert_eq!(
        counts,
        StoreCounts {
            scenarios: 1,
            predictions: 1,
            plans: 1,
            reports: 1
        }
    );

    let ctx = &outcome.context;
    let scenario_id = ctx.scenario.as_ref().unwrap().id;
    let prediction = ctx.prediction.as_ref().unwrap();
    let plan = ctx.plan.as_ref().unwrap();
    let report = ctx.report.as_ref().unwrap();
    assert_eq!(prediction.scenario_id, scenario_id);
    assert_eq!(plan.scenario_id, scenario_id);
    assert_eq!(report.scenario_id, scenario_id);
    assert_eq!(report.prediction_id, prediction.id);
    assert_eq!(report.plan_id, plan.id);

    assert_eq!(outcome.results.len(), 5);
    assert_eq!(ctx.status, Some("reported"));
    assert!(outcome
        .steps
        .iter()
        .all(|s| s.status == workflow::StepStatus::Completed));
}

#[tokio::test]
async fn test_report_summary_points_at_existing_document() {
    let dir = tempfile::tempdir().unwrap();
    let (planner, _) = mock_planner(dir.path());

    let summary = planner.report(los_angeles()).await.unwrap();

    assert!(summary.scenario_id.is_some());
    assert!(summary.prediction_id.is_some());
    assert!(summary.plan_id.is_some());
    assert!(summary.report_id.is_some());
    let path = summary.pdf_path.unwrap();
    assert!(path.exists());
    assert_eq!(summary.summary.efficiency_score, Some(0.92));
    assert_eq!(summary.summary.timeline_hours, Some(24));
}

#[tokio::test]
async fn test_each_run_gets_a_fresh_workflow_id() {
    let dir = tempfile::tempdir().unwrap();
    let (planner, _) = mock_planner(dir.path());

    let a = planner.run(&Pipeline::prediction(), los_angeles()).await.unwrap();
    let b = planner.run(&Pipeline::prediction(), los_angeles()).await.unwrap();
    assert_ne!(a.workflow_id, b.workflow_id);
}

#[tokio::test]
async fn test_empty_needs_fail_allocation_without_plan() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Scripted {
        prediction: Some(
            r#"{"predicted_needs": [], "confidence_score": 0.6,
                "estimated_response_time_hours": 10, "risk_factors": []}"#,
        ),
        narrative_fails: false,
    };
    let (planner, store) = planner_with(Arc::new(generator), dir.path());

    let err = planner.plan(los_angeles()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingInput);
    assert_eq!(err.failed_step(), Some(StepName::Allocate));
    let counts = store.counts().await.unwrap();
    assert_eq!(counts.plans, 0);
    // Earlier writes are not rolled back.
    assert_eq!(counts.scenarios, 1);
    assert_eq!(counts.predictions, 1);
}

#[tokio::test]
async fn test_unparseable_prediction_uses_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Scripted {
        prediction: Some("I am not able to produce JSON today."),
        narrative_fails: false,
    };
    let (planner, _) = planner_with(Arc::new(generator), dir.path());

    let summary = planner.predict(los_angeles()).await.unwrap();
    assert_eq!(summary.prediction, predict::fallback::prediction());
}

#[tokio::test]
async fn test_plan_matches_stored_prediction() {
    let dir = tempfile::tempdir().unwrap();
    let (planner, _) = mock_planner(dir.path());

    let outcome = planner.plan(los_angeles()).await.unwrap();

    let fetched = planner.get_prediction(outcome.prediction.id).await.unwrap();
    assert_eq!(fetched, outcome.prediction);
    let plan = planner.get_plan(outcome.allocation.id).await.unwrap();
    assert_eq!(plan, outcome.allocation);
    assert_eq!(plan.scenario_id, outcome.scenario_id);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (planner, _) = mock_planner(dir.path());
    let id = Uuid::new_v4();

    assert_eq!(planner.get_scenario(id).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(planner.get_prediction(id).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(planner.get_plan(id).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(planner.get_report(id).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        planner.download_report(id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_invalid_payloads_rejected_before_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let (planner, store) = mock_planner(dir.path());

    let mut bad_latitude = los_angeles();
    bad_latitude.location.latitude = 999.0;
    let mut bad_population = los_angeles();
    bad_population.location.population = -1;
    let mut bad_area = los_angeles();
    bad_area.affected_area_km2 = -1.0;

    for input in [bad_latitude, bad_population, bad_area] {
        let err = planner.report(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.failed_step(), None);
        assert_eq!(err.field_errors().len(), 1);
    }

    assert_eq!(store.counts().await.unwrap(), StoreCounts::default());
}

#[tokio::test]
async fn test_narrative_failure_names_report_step() {
    let dir = tempfile::tempdir().unwrap();
    let generator = Scripted {
        prediction: None,
        narrative_fails: true,
    };
    let (planner, store) = planner_with(Arc::new(generator), dir.path());

    let err = planner.report(los_angeles()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert_eq!(err.failed_step(), Some(StepName::Report));
    assert!(err.to_string().contains("503"));
    let counts = store.counts().await.unwrap();
    assert_eq!(counts.plans, 1);
    assert_eq!(counts.reports, 0);
}

#[tokio::test]
async fn test_download_returns_rendered_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let (planner, _) = mock_planner(dir.path());

    let summary = planner.report(los_angeles()).await.unwrap();
    let report_id = summary.report_id.unwrap();

    let doc = planner.download_report(report_id).await.unwrap();
    assert!(doc.bytes.starts_with(b"%PDF"));
    assert_eq!(
        doc.file_name,
        format!("disaster_response_report_{}.pdf", report_id)
    );

    std::fs::remove_file(summary.pdf_path.unwrap()).unwrap();
    let err = planner.download_report(report_id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_list_scenarios_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let (planner, _) = mock_planner(dir.path());

    let first = planner.predict(los_angeles()).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = planner.predict(los_angeles()).await.unwrap();

    let listed = planner.list_scenarios().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.scenario_id);
    assert_eq!(listed[1].id, first.scenario_id);

    let stats = planner.stats().await.unwrap();
    assert_eq!(stats.backend, "memory");
    assert_eq!(stats.counts.scenarios, 2);
    assert_eq!(stats.counts.predictions, 2);
}

#[tokio::test]
async fn test_plan_write_failure_is_persistence_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    let planner = Planner::new(
        Arc::new(FailingPlans(store.clone())),
        PredictionService::mock(),
        ReportBuilder::new(dir.path()),
    );

    let err = planner.run(&Pipeline::full(), los_angeles()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert_eq!(err.failed_step(), Some(StepName::Allocate));
    assert!(err.to_string().contains("disk full"));
    assert_eq!(
        store.counts().await.unwrap(),
        StoreCounts {
            scenarios: 1,
            predictions: 1,
            plans: 0,
            reports: 0
        }
    );

    let statuses: Vec<StepStatus> = err.step_records().iter().map(|s| s.status).collect();
    assert_eq!(
        statuses,
        vec![
            StepStatus::Completed,
            StepStatus::Completed,
            StepStatus::Failed,
            StepStatus::Pending,
            StepStatus::Pending,
        ]
    );
}

#[tokio::test]
async fn test_unwritable_report_dir_fails_report_step() {
    let dir = tempfile::tempdir().unwrap();
    let not_a_dir = dir.path().join("reports");
    std::fs::write(&not_a_dir, b"occupied").unwrap();
    let (planner, store) = mock_planner(&not_a_dir);

    let err = planner.report(los_angeles()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Upstream);
    assert_eq!(err.failed_step(), Some(StepName::Report));
    let counts = store.counts().await.unwrap();
    assert_eq!(counts.plans, 1);
    assert_eq!(counts.reports, 0);
}

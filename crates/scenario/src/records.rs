use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::input::{DisasterType, ScenarioInput, Severity};
use crate::resources::{AllocationPlan, ResourcePrediction};

pub const KEY_RECOMMENDATIONS: [&str; 4] = [
    "Immediate medical response deployment",
    "Establish emergency communication channels",
    "Coordinate with local authorities",
    "Monitor weather conditions",
];

pub const RISK_ASSESSMENT: &str =
    "High risk due to infrastructure damage and limited access";

/// Current time at the resolution every backing store can keep (microseconds),
/// so a record reads back equal to the value that was written.
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub input: ScenarioInput,
    pub created_at: DateTime<Utc>,
}

impl ScenarioRecord {
    pub fn new(input: ScenarioInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            input,
            created_at: now_micros(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub scenario_id: Uuid,
    #[serde(flatten)]
    pub prediction: ResourcePrediction,
    pub created_at: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn new(scenario_id: Uuid, prediction: ResourcePrediction) -> Self {
        Self {
            id: Uuid::new_v4(),
            scenario_id,
            prediction,
            created_at: now_micros(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanRecord {
    pub id: Uuid,
    pub scenario_id: Uuid,
    #[serde(flatten)]
    pub plan: AllocationPlan,
    pub created_at: DateTime<Utc>,
}

impl PlanRecord {
    pub fn new(scenario_id: Uuid, plan: AllocationPlan) -> Self {
        Self {
            id: Uuid::new_v4(),
            scenario_id,
            plan,
            created_at: now_micros(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRecord {
    pub id: Uuid,
    pub scenario_id: Uuid,
    pub prediction_id: Uuid,
    pub plan_id: Uuid,
    pub narrative_summary: String,
    pub key_recommendations: Vec<String>,
    pub risk_assessment: String,
    pub cost_breakdown: BTreeMap<String, f64>,
    pub pdf_path: String,
    pub created_at: DateTime<Utc>,
}

impl ReportRecord {
    pub fn new(
        prediction: &PredictionRecord,
        plan: &PlanRecord,
        narrative_summary: String,
        pdf_path: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            scenario_id: prediction.scenario_id,
            prediction_id: prediction.id,
            plan_id: plan.id,
            narrative_summary,
            key_recommendations: KEY_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
            risk_assessment: RISK_ASSESSMENT.to_string(),
            cost_breakdown: cost_breakdown(&prediction.prediction, &plan.plan),
            pdf_path,
            created_at: now_micros(),
        }
    }
}

/// Split the plan cost into the three categories shown on a report.
pub fn cost_breakdown(
    prediction: &ResourcePrediction,
    plan: &AllocationPlan,
) -> BTreeMap<String, f64> {
    let medical = prediction
        .predicted_needs
        .first()
        .map(|n| n.estimated_cost)
        .unwrap_or(0.0);

    BTreeMap::from([
        ("medical_supplies".to_string(), medical),
        ("logistics".to_string(), plan.total_cost * 0.3),
        ("coordination".to_string(), plan.total_cost * 0.2),
    ])
}

/// List view of a scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioSummary {
    pub id: Uuid,
    pub disaster_type: DisasterType,
    pub severity: Severity,
    pub city: String,
    pub state: String,
    pub country: String,
    pub population: i64,
    pub affected_area_km2: f64,
    pub estimated_casualties: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&ScenarioRecord> for ScenarioSummary {
    fn from(record: &ScenarioRecord) -> Self {
        let input = &record.input;
        Self {
            id: record.id,
            disaster_type: input.disaster_type,
            severity: input.severity,
            city: input.location.city.clone(),
            state: input.location.state.clone(),
            country: input.location.country.clone(),
            population: input.location.population,
            affected_area_km2: input.affected_area_km2,
            estimated_casualties: input.estimated_casualties,
            created_at: record.created_at,
        }
    }
}

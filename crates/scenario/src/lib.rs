pub mod input;
pub mod records;
pub mod resources;

pub use input::{DisasterType, FieldError, Location, ScenarioInput, Severity};
pub use records::{
    PlanRecord, PredictionRecord, ReportRecord, ScenarioRecord, ScenarioSummary,
    cost_breakdown, now_micros, KEY_RECOMMENDATIONS, RISK_ASSESSMENT,
};
pub use resources::{AllocationPlan, ResourceAllocation, ResourceNeed, ResourcePrediction};

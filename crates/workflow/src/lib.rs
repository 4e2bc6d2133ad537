pub mod context;
pub mod error;
pub mod pipeline;
pub mod planner;
pub mod steps;

pub use context::{ContextPatch, RunContext};
pub use error::{Error, ErrorKind, Result};
pub use pipeline::{
    KeyMetrics, Pipeline, RunOutcome, StepName, StepRecord, StepStatus, WorkflowSummary,
};
pub use planner::{PlanOutcome, Planner, PlannerStats, PredictionSummary, ReportDocument};
pub use steps::Services;

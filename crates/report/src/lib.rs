pub mod layout;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

use layout::{money, percent, thousands, title_case, PageWriter};
use scenario::{AllocationPlan, ResourcePrediction, ScenarioInput};

const RECOMMENDATIONS: [&str; 8] = [
    "Immediate medical response deployment to affected areas",
    "Establish emergency communication channels",
    "Coordinate with local authorities and emergency services",
    "Monitor weather conditions and adjust plans accordingly",
    "Deploy volunteer teams according to the allocation plan",
    "Establish supply chain coordination for resource delivery",
    "Implement regular status reporting and progress tracking",
    "Prepare for potential escalation scenarios",
];

/// Renders the disaster response PDF into a fixed output directory.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    output_dir: PathBuf,
}

impl ReportBuilder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write one report document and return its path.
    pub fn render(
        &self,
        scenario: &ScenarioInput,
        prediction: &ResourcePrediction,
        plan: &AllocationPlan,
        narrative: &str,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create report directory {}", self.output_dir.display())
        })?;

        let path = self
            .output_dir
            .join(format!("disaster_response_report_{}.pdf", Uuid::new_v4()));

        let mut doc = PageWriter::new("Disaster Response Report")?;

        title_page(&mut doc, scenario);
        doc.page_break();
        executive_summary(&mut doc, scenario, prediction, plan);
        doc.page_break();
        scenario_details(&mut doc, scenario);
        doc.page_break();
        resource_predictions(&mut doc, prediction);
        doc.page_break();
        allocation_plan(&mut doc, plan);
        doc.page_break();
        doc.heading("Narrative Analysis");
        doc.paragraph(narrative);
        doc.page_break();
        recommendations(&mut doc, prediction);

        doc.save(&path)?;
        info!(path = %path.display(), "Report document written");
        Ok(path)
    }
}

fn title_page(doc: &mut PageWriter, scenario: &ScenarioInput) {
    let loc = &scenario.location;
    doc.title("Disaster Response Report");
    doc.heading(&format!(
        "{} - {} Severity",
        title_case(scenario.disaster_type.as_str()),
        title_case(scenario.severity.as_str())
    ));
    doc.paragraph(&format!("Location: {}, {}, {}", loc.city, loc.state, loc.country));
    doc.paragraph(&format!(
        "Report Generated: {}",
        chrono::Utc::now().format("%B %d, %Y at %H:%M UTC")
    ));
    doc.paragraph(
        "This report was generated by an automated disaster response planning pipeline \
         using AI-assisted resource prediction and allocation.",
    );
}

fn executive_summary(
    doc: &mut PageWriter,
    scenario: &ScenarioInput,
    prediction: &ResourcePrediction,
    plan: &AllocationPlan,
) {
    let loc = &scenario.location;
    doc.heading("Executive Summary");
    doc.field("Disaster Type", &title_case(scenario.disaster_type.as_str()));
    doc.field("Severity Level", &title_case(scenario.severity.as_str()));
    doc.field("Affected Population", &thousands(loc.population));
    doc.field("Affected Area", &format!("{} sq km", scenario.affected_area_km2));
    doc.field("Estimated Casualties", &thousands(scenario.estimated_casualties));
    doc.field("Prediction Confidence", &percent(prediction.confidence_score));
    doc.field(
        "Response Time",
        &format!("{} hours", prediction.estimated_response_time_hours),
    );
    doc.field("Total Cost", &money(plan.total_cost));
    doc.field("Plan Efficiency", &percent(plan.efficiency_score));
    doc.space(6.0);

    doc.paragraph(&format!(
        "This report presents an analysis of the {} affecting {}, {}. The analysis \
         indicates a {} severity event requiring immediate response coordination. \
         Key findings include a predicted response time of {} hours with {} confidence. \
         The allocation plan achieves {} efficiency with a total estimated cost of {}.",
        scenario.disaster_type,
        loc.city,
        loc.country,
        scenario.severity,
        prediction.estimated_response_time_hours,
        percent(prediction.confidence_score),
        percent(plan.efficiency_score),
        money(plan.total_cost),
    ));
}

fn scenario_details(doc: &mut PageWriter, scenario: &ScenarioInput) {
    let loc = &scenario.location;
    doc.heading("Disaster Scenario Details");
    doc.field("Disaster Type", &title_case(scenario.disaster_type.as_str()));
    doc.field("Severity Level", &title_case(scenario.severity.as_str()));
    doc.field("City", &loc.city);
    doc.field("State/Province", &loc.state);
    doc.field("Country", &loc.country);
    doc.field("Coordinates", &format!("{:.4}, {:.4}", loc.latitude, loc.longitude));
    doc.field("Population", &thousands(loc.population));
    doc.field("Affected Area", &format!("{} sq km", scenario.affected_area_km2));
    doc.field("Estimated Casualties", &thousands(scenario.estimated_casualties));
    doc.field("Available Volunteers", &thousands(scenario.available_volunteers));
    doc.field("Infrastructure Damage", &scenario.infrastructure_damage);
    doc.field("Weather Conditions", &scenario.weather_conditions);

    doc.subheading("Scenario Description");
    doc.paragraph(&scenario.description);
}

const RESOURCE_COLUMNS: [(&str, f32); 5] = [
    ("Resource Type", 45.0),
    ("Quantity", 25.0),
    ("Priority", 25.0),
    ("Cost", 35.0),
    ("Delivery", 30.0),
];

fn resource_predictions(doc: &mut PageWriter, prediction: &ResourcePrediction) {
    doc.heading("Resource Predictions");
    doc.field("Prediction Confidence", &percent(prediction.confidence_score));
    doc.field(
        "Estimated Response Time",
        &format!("{} hours", prediction.estimated_response_time_hours),
    );
    doc.field("Key Risk Factors", &prediction.risk_factors.join(", "));

    if !prediction.predicted_needs.is_empty() {
        doc.subheading("Predicted Resource Needs");
        let rows: Vec<Vec<String>> = prediction
            .predicted_needs
            .iter()
            .map(|n| {
                vec![
                    n.resource_type.clone(),
                    n.quantity.to_string(),
                    n.priority.clone(),
                    money(n.estimated_cost),
                    format!("{} hours", n.delivery_time_hours),
                ]
            })
            .collect();
        doc.table(&RESOURCE_COLUMNS, &rows);
    }
}

fn allocation_plan(doc: &mut PageWriter, plan: &AllocationPlan) {
    doc.heading("Resource Allocation Plan");
    doc.field("Plan Efficiency", &percent(plan.efficiency_score));
    doc.field("Total Cost", &money(plan.total_cost));
    doc.field("Timeline", &format!("{} hours", plan.timeline_hours));

    if !plan.resource_allocations.is_empty() {
        doc.subheading("Resource Allocations");
        let rows: Vec<Vec<String>> = plan
            .resource_allocations
            .iter()
            .map(|a| {
                vec![
                    a.resource_type.clone(),
                    a.quantity.to_string(),
                    a.priority.clone(),
                    money(a.estimated_cost),
                    format!("{} hours", a.delivery_time_hours),
                ]
            })
            .collect();
        doc.table(&RESOURCE_COLUMNS, &rows);

        let strategies: Vec<Vec<String>> = plan
            .resource_allocations
            .iter()
            .map(|a| vec![a.resource_type.clone(), title_case(&a.allocation_strategy)])
            .collect();
        doc.table(&[("Resource Type", 45.0), ("Strategy", 115.0)], &strategies);
    }

    if !plan.volunteer_assignments.is_empty() {
        doc.subheading("Volunteer Assignments");
        for (task, teams) in &plan.volunteer_assignments {
            doc.field(&title_case(task), &teams.join(", "));
        }
    }
}

fn recommendations(doc: &mut PageWriter, prediction: &ResourcePrediction) {
    doc.heading("Key Recommendations");
    for (i, rec) in RECOMMENDATIONS.iter().enumerate() {
        doc.paragraph(&format!("{}. {}", i + 1, rec));
    }

    doc.subheading("Risk Assessment");
    if prediction.risk_factors.is_empty() {
        doc.paragraph("No specific risk factors identified in the current analysis.");
    } else {
        doc.paragraph("Key Risk Factors:");
        for factor in &prediction.risk_factors {
            doc.paragraph(&format!("- {}", factor));
        }
    }
}

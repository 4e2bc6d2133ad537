use scenario::{AllocationPlan, ResourceNeed, ResourcePrediction, ScenarioInput};

pub fn build_prediction_prompt(scenario: &ScenarioInput) -> String {
    let loc = &scenario.location;
    format!(
        r#"Analyze the following disaster scenario and predict resource needs.

Disaster Type: {}
Severity: {}
Location: {}, {}
Affected Area: {} km2
Population: {}
Estimated Casualties: {}
Available Volunteers: {}

Respond with ONLY a JSON object using this schema:
{{
  "predicted_needs": [
    {{"resource_type": "string", "quantity": 0, "priority": "low|medium|high|critical", "estimated_cost": 0.0, "delivery_time_hours": 0}}
  ],
  "confidence_score": 0.0,
  "estimated_response_time_hours": 0,
  "risk_factors": ["string"]
}}

RULES:
- confidence_score is between 0 and 1
- Output ONLY the JSON object, no markdown, no explanations

JSON OUTPUT:"#,
        scenario.disaster_type,
        scenario.severity,
        loc.city,
        loc.country,
        scenario.affected_area_km2,
        loc.population,
        scenario.estimated_casualties,
        scenario.available_volunteers,
    )
}

pub fn build_allocation_prompt(scenario: &ScenarioInput, needs: &[ResourceNeed]) -> String {
    let loc = &scenario.location;
    let needs_json = serde_json::to_string_pretty(needs).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"Generate an optimized resource allocation plan for the following disaster scenario.

Disaster Type: {}
Severity: {}
Location: {}, {}
Available Volunteers: {}

Predicted Resource Needs:
{}

Respond with ONLY a JSON object using this schema:
{{
  "resource_allocations": [
    {{"resource_type": "string", "quantity": 0, "priority": "string", "estimated_cost": 0.0, "delivery_time_hours": 0, "allocation_strategy": "string"}}
  ],
  "volunteer_assignments": {{"task_category": ["team name"]}},
  "timeline_hours": 0,
  "total_cost": 0.0,
  "efficiency_score": 0.0
}}

RULES:
- efficiency_score is between 0 and 1
- Output ONLY the JSON object, no markdown, no explanations

JSON OUTPUT:"#,
        scenario.disaster_type,
        scenario.severity,
        loc.city,
        loc.country,
        scenario.available_volunteers,
        needs_json,
    )
}

pub fn build_narrative_prompt(
    scenario: &ScenarioInput,
    prediction: &ResourcePrediction,
    plan: &AllocationPlan,
) -> String {
    let loc = &scenario.location;
    format!(
        r#"Write a narrative report for the disaster response scenario below.

Scenario: {} - {} severity in {}, {}

Prediction Results:
- Confidence: {:.1}%
- Response Time: {} hours
- Risk Factors: {}

Allocation Plan:
- Efficiency: {:.1}%
- Total Cost: ${:.2}
- Timeline: {} hours

Write a professional analysis suitable for decision-makers. Plain text, no markdown.

REPORT:"#,
        scenario.disaster_type,
        scenario.severity,
        loc.city,
        loc.country,
        prediction.confidence_score * 100.0,
        prediction.estimated_response_time_hours,
        prediction.risk_factors.join(", "),
        plan.efficiency_score * 100.0,
        plan.total_cost,
        plan.timeline_hours,
    )
}

pub mod fallback;
pub mod llm;
pub mod prompt;

pub use llm::{GraniteClient, MockGenerator, TextGenerator};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info, warn};

use scenario::{AllocationPlan, ResourceNeed, ResourcePrediction, ScenarioInput};

/// Asks the model for predictions, plans and narratives, and turns its text
/// back into structured results.
#[derive(Clone)]
pub struct PredictionService {
    generator: Arc<dyn TextGenerator>,
}

impl PredictionService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn mock() -> Self {
        Self::new(Arc::new(MockGenerator::new()))
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// Predict resource needs. Unusable model output yields the fallback
    /// prediction; only a failed generator call is an error.
    pub async fn predict_resources(&self, scenario: &ScenarioInput) -> Result<ResourcePrediction> {
        let prompt = prompt::build_prediction_prompt(scenario);
        let text = self.generator
            .generate(&prompt)
            .await
            .context("Resource prediction request failed")?;

        let prediction = match parse_structured::<ResourcePrediction>(&text) {
            Some(p) if p.is_well_formed() => p,
            _ => {
                warn!(
                    operation = "predict_resources",
                    model = self.model(),
                    "Failed to parse model response, using fallback data"
                );
                fallback::prediction()
            }
        };

        info!(
            model = self.model(),
            needs = prediction.predicted_needs.len(),
            confidence = prediction.confidence_score,
            "Resource prediction generated"
        );
        Ok(prediction)
    }

    pub async fn generate_allocation(
        &self,
        scenario: &ScenarioInput,
        needs: &[ResourceNeed],
    ) -> Result<AllocationPlan> {
        let prompt = prompt::build_allocation_prompt(scenario, needs);
        let text = self.generator
            .generate(&prompt)
            .await
            .context("Allocation plan request failed")?;

        let plan = match parse_structured::<AllocationPlan>(&text) {
            Some(p) if p.is_well_formed() => p,
            _ => {
                warn!(
                    operation = "generate_allocation",
                    model = self.model(),
                    "Failed to parse model response, using fallback data"
                );
                fallback::allocation_plan()
            }
        };

        info!(
            model = self.model(),
            allocations = plan.resource_allocations.len(),
            efficiency = plan.efficiency_score,
            total_cost = plan.total_cost,
            "Allocation plan generated"
        );
        Ok(plan)
    }

    /// Free-text narrative; passed through without structural parsing.
    pub async fn generate_narrative(
        &self,
        scenario: &ScenarioInput,
        prediction: &ResourcePrediction,
        plan: &AllocationPlan,
    ) -> Result<String> {
        let prompt = prompt::build_narrative_prompt(scenario, prediction, plan);
        let text = self.generator
            .generate(&prompt)
            .await
            .context("Narrative request failed")?;

        info!(model = self.model(), chars = text.len(), "Narrative generated");
        Ok(text.trim().to_string())
    }
}

/// Parse model text as JSON, tolerating a surrounding markdown code fence.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Option<T> {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix("```") {
        // drop the optional language tag on the opening fence
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        body = rest.strip_suffix("```").unwrap_or(rest).trim();
    }

    if !body.starts_with('{') {
        return None;
    }
    serde_json::from_str(body).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Scripted(&'static str);

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    struct Unreachable;

    #[async_trait]
    impl TextGenerator for Unreachable {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            anyhow::bail!("connection refused")
        }

        fn model(&self) -> &str {
            "unreachable"
        }
    }

    fn scenario() -> ScenarioInput {
        serde_json::from_value(serde_json::json!({
            "disaster_type": "flood",
            "severity": "medium",
            "location": {
                "latitude": 40.7128, "longitude": -74.0060, "city": "New York",
                "state": "New York", "country": "United States", "population": 8336817
            },
            "affected_area_km2": 75.2,
            "estimated_casualties": 1200,
            "infrastructure_damage": "Subway system flooded",
            "weather_conditions": "Heavy rainfall for 48 hours",
            "available_volunteers": 2000,
            "description": "Heavy rainfall has caused severe flooding"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_unparseable_prediction_uses_fallback() {
        let service = PredictionService::new(Arc::new(Scripted("I think you need water.")));
        let prediction = service.predict_resources(&scenario()).await.unwrap();
        assert_eq!(prediction, fallback::prediction());
    }

    #[tokio::test]
    async fn test_out_of_range_prediction_uses_fallback() {
        let service = PredictionService::new(Arc::new(Scripted(
            r#"{"predicted_needs": [], "confidence_score": 1.4,
                "estimated_response_time_hours": 3, "risk_factors": []}"#,
        )));
        let prediction = service.predict_resources(&scenario()).await.unwrap();
        assert_eq!(prediction, fallback::prediction());
    }

    #[tokio::test]
    async fn test_broken_allocation_json_uses_fallback() {
        let service = PredictionService::new(Arc::new(Scripted(r#"{"resource_allocations": ["#)));
        let plan = service.generate_allocation(&scenario(), &[]).await.unwrap();
        assert_eq!(plan, fallback::allocation_plan());
    }

    #[tokio::test]
    async fn test_mock_prediction_is_parsed_not_fallback() {
        let service = PredictionService::mock();
        let prediction = service.predict_resources(&scenario()).await.unwrap();
        assert_eq!(prediction.predicted_needs.len(), 3);

        let plan = service
            .generate_allocation(&scenario(), &prediction.predicted_needs)
            .await
            .unwrap();
        assert_eq!(plan.volunteer_assignments.len(), 3);
        assert_eq!(plan.efficiency_score, 0.92);
    }

    #[tokio::test]
    async fn test_generator_failure_is_an_error() {
        let service = PredictionService::new(Arc::new(Unreachable));
        assert!(service.predict_resources(&scenario()).await.is_err());
    }

    #[tokio::test]
    async fn test_narrative_is_passed_through() {
        let service = PredictionService::new(Arc::new(Scripted("  Plain analysis.\n")));
        let text = service
            .generate_narrative(&scenario(), &fallback::prediction(), &fallback::allocation_plan())
            .await
            .unwrap();
        assert_eq!(text, "Plain analysis.");
    }

    #[test]
    fn test_parse_structured_strips_code_fence() {
        let text = "```json\n{\"predicted_needs\": [], \"confidence_score\": 0.5, \
                    \"estimated_response_time_hours\": 1, \"risk_factors\": []}\n```";
        let parsed: Option<ResourcePrediction> = parse_structured(text);
        assert_eq!(parsed.unwrap().confidence_score, 0.5);
    }
}

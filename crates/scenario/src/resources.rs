use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceNeed {
    pub resource_type: String,
    pub quantity: u64,
    pub priority: String,
    pub estimated_cost: f64,
    pub delivery_time_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceAllocation {
    pub resource_type: String,
    pub quantity: u64,
    pub priority: String,
    pub estimated_cost: f64,
    pub delivery_time_hours: u32,
    pub allocation_strategy: String,
}

/// Structured answer to "what does this scenario need".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourcePrediction {
    pub predicted_needs: Vec<ResourceNeed>,
    pub confidence_score: f64,
    pub estimated_response_time_hours: u32,
    pub risk_factors: Vec<String>,
}

/// Structured answer to "how should the predicted needs be covered".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationPlan {
    pub resource_allocations: Vec<ResourceAllocation>,
    /// Task category -> assigned team names
    pub volunteer_assignments: BTreeMap<String, Vec<String>>,
    pub timeline_hours: u32,
    pub total_cost: f64,
    pub efficiency_score: f64,
}

fn is_unit_score(score: f64) -> bool {
    (0.0..=1.0).contains(&score)
}

fn is_cost(cost: f64) -> bool {
    cost.is_finite() && cost >= 0.0
}

impl ResourcePrediction {
    /// Scores inside [0, 1] and no negative or non-finite costs.
    pub fn is_well_formed(&self) -> bool {
        is_unit_score(self.confidence_score)
            && self.predicted_needs.iter().all(|n| is_cost(n.estimated_cost))
    }
}

impl AllocationPlan {
    pub fn is_well_formed(&self) -> bool {
        is_unit_score(self.efficiency_score)
            && is_cost(self.total_cost)
            && self.resource_allocations.iter().all(|a| is_cost(a.estimated_cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_parses_from_model_json() {
        let text = r#"{
            "predicted_needs": [
                {"resource_type": "water", "quantity": 5000, "priority": "critical",
                 "estimated_cost": 25000.0, "delivery_time_hours": 2}
            ],
            "confidence_score": 0.87,
            "estimated_response_time_hours": 12,
            "risk_factors": ["limited_access"]
        }"#;

        let prediction: ResourcePrediction = serde_json::from_str(text).unwrap();
        assert_eq!(prediction.predicted_needs[0].quantity, 5000);
        assert!(prediction.is_well_formed());
    }

    #[test]
    fn test_out_of_range_scores_are_not_well_formed() {
        let plan = AllocationPlan {
            resource_allocations: Vec::new(),
            volunteer_assignments: BTreeMap::new(),
            timeline_hours: 24,
            total_cost: 1000.0,
            efficiency_score: 1.4,
        };
        assert!(!plan.is_well_formed());

        let plan = AllocationPlan { efficiency_score: 0.5, total_cost: -3.0, ..plan };
        assert!(!plan.is_well_formed());
    }
}

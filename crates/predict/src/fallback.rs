//! Fixed results substituted when the model's answer cannot be used.

use std::collections::BTreeMap;

use scenario::{AllocationPlan, ResourceAllocation, ResourceNeed, ResourcePrediction};

pub fn prediction() -> ResourcePrediction {
    ResourcePrediction {
        predicted_needs: vec![ResourceNeed {
            resource_type: "medical_supplies".to_string(),
            quantity: 1500,
            priority: "high".to_string(),
            estimated_cost: 75000.0,
            delivery_time_hours: 6,
        }],
        confidence_score: 0.87,
        estimated_response_time_hours: 12,
        risk_factors: vec![
            "infrastructure_damage".to_string(),
            "limited_access".to_string(),
        ],
    }
}

pub fn allocation_plan() -> AllocationPlan {
    AllocationPlan {
        resource_allocations: vec![ResourceAllocation {
            resource_type: "medical_supplies".to_string(),
            quantity: 1500,
            priority: "high".to_string(),
            estimated_cost: 75000.0,
            delivery_time_hours: 6,
            allocation_strategy: "distributed_centers".to_string(),
        }],
        volunteer_assignments: BTreeMap::from([
            (
                "medical_response".to_string(),
                vec!["Team Alpha".to_string(), "Team Beta".to_string()],
            ),
            ("logistics".to_string(), vec!["Team Gamma".to_string()]),
        ]),
        timeline_hours: 24,
        total_cost: 200000.0,
        efficiency_score: 0.92,
    }
}

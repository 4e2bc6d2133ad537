use std::collections::BTreeMap;
use std::time::Duration;

use scenario::{
    AllocationPlan, PlanRecord, PredictionRecord, ReportRecord, ResourcePrediction,
    ScenarioInput, ScenarioRecord,
};
use store::{MemoryStore, Store, StoreCounts};
use uuid::Uuid;

fn scenario_input(city: &str) -> ScenarioInput {
    serde_json::from_value(serde_json::json!({
        "disaster_type": "hurricane",
        "severity": "critical",
        "location": {
            "latitude": 25.7617, "longitude": -80.1918, "city": city,
            "state": "Florida", "country": "United States", "population": 454279
        },
        "affected_area_km2": 200.0,
        "estimated_casualties": 5000,
        "infrastructure_damage": "Extensive flooding, destroyed homes",
        "weather_conditions": "Heavy rainfall, strong winds",
        "available_volunteers": 800,
        "description": "Hurricane has made landfall"
    }))
    .unwrap()
}

fn prediction() -> ResourcePrediction {
    ResourcePrediction {
        predicted_needs: vec![],
        confidence_score: 0.5,
        estimated_response_time_hours: 4,
        risk_factors: vec!["storm_surge".to_string()],
    }
}

fn plan() -> AllocationPlan {
    AllocationPlan {
        resource_allocations: vec![],
        volunteer_assignments: BTreeMap::new(),
        timeline_hours: 12,
        total_cost: 1000.0,
        efficiency_score: 0.7,
    }
}

#[tokio::test]
async fn test_round_trip_returns_identical_records() {
    let store = MemoryStore::new();
    let scenario = ScenarioRecord::new(scenario_input("Miami"));
    let prediction = PredictionRecord::new(scenario.id, prediction());

    store.insert_scenario(&scenario).await.unwrap();
    store.insert_prediction(&prediction).await.unwrap();

    assert_eq!(store.get_scenario(scenario.id).await.unwrap(), Some(scenario));
    assert_eq!(store.get_prediction(prediction.id).await.unwrap(), Some(prediction));
}

#[tokio::test]
async fn test_unknown_id_is_none() {
    let store = MemoryStore::new();
    assert!(store.get_scenario(Uuid::new_v4()).await.unwrap().is_none());
    assert!(store.get_report(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_foreign_keys_are_enforced() {
    let store = MemoryStore::new();
    let orphan = PredictionRecord::new(Uuid::new_v4(), prediction());
    assert!(store.insert_prediction(&orphan).await.is_err());

    let scenario = ScenarioRecord::new(scenario_input("Miami"));
    store.insert_scenario(&scenario).await.unwrap();
    let p = PredictionRecord::new(scenario.id, prediction());
    store.insert_prediction(&p).await.unwrap();

    // plan was never stored
    let a = PlanRecord::new(scenario.id, plan());
    let report = ReportRecord::new(&p, &a, "n".to_string(), "r.pdf".to_string());
    assert!(store.insert_report(&report).await.is_err());

    store.insert_plan(&a).await.unwrap();
    store.insert_report(&report).await.unwrap();

    assert_eq!(
        store.counts().await.unwrap(),
        StoreCounts { scenarios: 1, predictions: 1, plans: 1, reports: 1 }
    );
}

#[tokio::test]
async fn test_duplicate_insert_is_rejected() {
    let store = MemoryStore::new();
    let scenario = ScenarioRecord::new(scenario_input("Miami"));
    store.insert_scenario(&scenario).await.unwrap();
    assert!(store.insert_scenario(&scenario).await.is_err());
}

#[tokio::test]
async fn test_list_scenarios_newest_first() {
    let store = MemoryStore::new();
    for city in ["Miami", "Tampa", "Orlando"] {
        store.insert_scenario(&ScenarioRecord::new(scenario_input(city))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let cities: Vec<String> = store
        .list_scenarios()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.input.location.city)
        .collect();
    assert_eq!(cities, vec!["Orlando", "Tampa", "Miami"]);
}

#[tokio::test]
async fn test_list_scenarios_orders_equal_timestamps_by_id() {
    let store = MemoryStore::new();
    let first = ScenarioRecord::new(scenario_input("Miami"));
    let created_at = first.created_at;
    let ids = [
        Uuid::from_u128(1),
        Uuid::from_u128(3),
        Uuid::from_u128(2),
    ];
    for (id, city) in ids.into_iter().zip(["Miami", "Tampa", "Orlando"]) {
        let record = ScenarioRecord {
            id,
            input: scenario_input(city),
            created_at,
        };
        store.insert_scenario(&record).await.unwrap();
    }

    for _ in 0..5 {
        let listed: Vec<Uuid> = store
            .list_scenarios()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(
            listed,
            vec![Uuid::from_u128(3), Uuid::from_u128(2), Uuid::from_u128(1)]
        );
    }
}

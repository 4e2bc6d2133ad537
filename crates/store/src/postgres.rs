use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

use scenario::{
    AllocationPlan, DisasterType, Location, PlanRecord, PredictionRecord, ReportRecord,
    ResourceAllocation, ResourceNeed, ResourcePrediction, ScenarioInput, ScenarioRecord, Severity,
};

use crate::{Store, StoreCounts};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS scenarios (
        id UUID PRIMARY KEY,
        disaster_type TEXT NOT NULL,
        severity TEXT NOT NULL,
        latitude DOUBLE PRECISION NOT NULL,
        longitude DOUBLE PRECISION NOT NULL,
        city TEXT NOT NULL,
        state TEXT NOT NULL,
        country TEXT NOT NULL,
        population BIGINT NOT NULL,
        affected_area_km2 DOUBLE PRECISION NOT NULL,
        estimated_casualties BIGINT NOT NULL,
        infrastructure_damage TEXT NOT NULL,
        weather_conditions TEXT NOT NULL,
        available_volunteers BIGINT NOT NULL,
        description TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS predictions (
        id UUID PRIMARY KEY,
        scenario_id UUID NOT NULL REFERENCES scenarios(id),
        predicted_needs JSONB NOT NULL,
        confidence_score DOUBLE PRECISION NOT NULL,
        estimated_response_time_hours BIGINT NOT NULL,
        risk_factors JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS plans (
        id UUID PRIMARY KEY,
        scenario_id UUID NOT NULL REFERENCES scenarios(id),
        resource_allocations JSONB NOT NULL,
        volunteer_assignments JSONB NOT NULL,
        timeline_hours BIGINT NOT NULL,
        total_cost DOUBLE PRECISION NOT NULL,
        efficiency_score DOUBLE PRECISION NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reports (
        id UUID PRIMARY KEY,
        scenario_id UUID NOT NULL REFERENCES scenarios(id),
        prediction_id UUID NOT NULL REFERENCES predictions(id),
        plan_id UUID NOT NULL REFERENCES plans(id),
        narrative_summary TEXT NOT NULL,
        key_recommendations JSONB NOT NULL,
        risk_assessment TEXT NOT NULL,
        cost_breakdown JSONB NOT NULL,
        pdf_path TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
];

/// PostgreSQL-backed store. Every statement checks a connection out of the
/// pool and returns it on drop.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the tables if they do not exist yet.
    pub async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to create table")?;
        }
        info!("PostgreSQL schema ready");
        Ok(())
    }
}

fn hours(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value).with_context(|| format!("{} out of range: {}", column, value))
}

fn scenario_from_row(row: &PgRow) -> Result<ScenarioRecord> {
    let disaster_type: String = row.try_get("disaster_type")?;
    let severity: String = row.try_get("severity")?;

    Ok(ScenarioRecord {
        id: row.try_get("id")?,
        input: ScenarioInput {
            disaster_type: DisasterType::parse(&disaster_type)
                .with_context(|| format!("Unknown disaster type in row: {}", disaster_type))?,
            severity: Severity::parse(&severity)
                .with_context(|| format!("Unknown severity in row: {}", severity))?,
            location: Location {
                latitude: row.try_get("latitude")?,
                longitude: row.try_get("longitude")?,
                city: row.try_get("city")?,
                state: row.try_get("state")?,
                country: row.try_get("country")?,
                population: row.try_get("population")?,
            },
            affected_area_km2: row.try_get("affected_area_km2")?,
            estimated_casualties: row.try_get("estimated_casualties")?,
            infrastructure_damage: row.try_get("infrastructure_damage")?,
            weather_conditions: row.try_get("weather_conditions")?,
            available_volunteers: row.try_get("available_volunteers")?,
            description: row.try_get("description")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

fn prediction_from_row(row: &PgRow) -> Result<PredictionRecord> {
    let Json(predicted_needs): Json<Vec<ResourceNeed>> = row.try_get("predicted_needs")?;
    let Json(risk_factors): Json<Vec<String>> = row.try_get("risk_factors")?;

    Ok(PredictionRecord {
        id: row.try_get("id")?,
        scenario_id: row.try_get("scenario_id")?,
        prediction: ResourcePrediction {
            predicted_needs,
            confidence_score: row.try_get("confidence_score")?,
            estimated_response_time_hours: hours(
                row.try_get("estimated_response_time_hours")?,
                "estimated_response_time_hours",
            )?,
            risk_factors,
        },
        created_at: row.try_get("created_at")?,
    })
}

fn plan_from_row(row: &PgRow) -> Result<PlanRecord> {
    let Json(resource_allocations): Json<Vec<ResourceAllocation>> =
        row.try_get("resource_allocations")?;
    let Json(volunteer_assignments): Json<BTreeMap<String, Vec<String>>> =
        row.try_get("volunteer_assignments")?;

    Ok(PlanRecord {
        id: row.try_get("id")?,
        scenario_id: row.try_get("scenario_id")?,
        plan: AllocationPlan {
            resource_allocations,
            volunteer_assignments,
            timeline_hours: hours(row.try_get("timeline_hours")?, "timeline_hours")?,
            total_cost: row.try_get("total_cost")?,
            efficiency_score: row.try_get("efficiency_score")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

fn report_from_row(row: &PgRow) -> Result<ReportRecord> {
    let Json(key_recommendations): Json<Vec<String>> = row.try_get("key_recommendations")?;
    let Json(cost_breakdown): Json<BTreeMap<String, f64>> = row.try_get("cost_breakdown")?;

    Ok(ReportRecord {
        id: row.try_get("id")?,
        scenario_id: row.try_get("scenario_id")?,
        prediction_id: row.try_get("prediction_id")?,
        plan_id: row.try_get("plan_id")?,
        narrative_summary: row.try_get("narrative_summary")?,
        key_recommendations,
        risk_assessment: row.try_get("risk_assessment")?,
        cost_breakdown,
        pdf_path: row.try_get("pdf_path")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn insert_scenario(&self, record: &ScenarioRecord) -> Result<()> {
        let input = &record.input;
        sqlx::query(
            r#"
            INSERT INTO scenarios
                (id, disaster_type, severity, latitude, longitude, city, state, country,
                 population, affected_area_km2, estimated_casualties, infrastructure_damage,
                 weather_conditions, available_volunteers, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(record.id)
        .bind(input.disaster_type.as_str())
        .bind(input.severity.as_str())
        .bind(input.location.latitude)
        .bind(input.location.longitude)
        .bind(&input.location.city)
        .bind(&input.location.state)
        .bind(&input.location.country)
        .bind(input.location.population)
        .bind(input.affected_area_km2)
        .bind(input.estimated_casualties)
        .bind(&input.infrastructure_damage)
        .bind(&input.weather_conditions)
        .bind(input.available_volunteers)
        .bind(&input.description)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert scenario")?;

        debug!(table = "scenarios", id = %record.id, "Inserted record");
        Ok(())
    }

    async fn insert_prediction(&self, record: &PredictionRecord) -> Result<()> {
        let p = &record.prediction;
        sqlx::query(
            r#"
            INSERT INTO predictions
                (id, scenario_id, predicted_needs, confidence_score,
                 estimated_response_time_hours, risk_factors, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(record.scenario_id)
        .bind(Json(&p.predicted_needs))
        .bind(p.confidence_score)
        .bind(i64::from(p.estimated_response_time_hours))
        .bind(Json(&p.risk_factors))
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert prediction")?;

        debug!(table = "predictions", id = %record.id, "Inserted record");
        Ok(())
    }

    async fn insert_plan(&self, record: &PlanRecord) -> Result<()> {
        let p = &record.plan;
        sqlx::query(
            r#"
            INSERT INTO plans
                (id, scenario_id, resource_allocations, volunteer_assignments,
                 timeline_hours, total_cost, efficiency_score, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.scenario_id)
        .bind(Json(&p.resource_allocations))
        .bind(Json(&p.volunteer_assignments))
        .bind(i64::from(p.timeline_hours))
        .bind(p.total_cost)
        .bind(p.efficiency_score)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert plan")?;

        debug!(table = "plans", id = %record.id, "Inserted record");
        Ok(())
    }

    async fn insert_report(&self, record: &ReportRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reports
                (id, scenario_id, prediction_id, plan_id, narrative_summary,
                 key_recommendations, risk_assessment, cost_breakdown, pdf_path, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(record.id)
        .bind(record.scenario_id)
        .bind(record.prediction_id)
        .bind(record.plan_id)
        .bind(&record.narrative_summary)
        .bind(Json(&record.key_recommendations))
        .bind(&record.risk_assessment)
        .bind(Json(&record.cost_breakdown))
        .bind(&record.pdf_path)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert report")?;

        debug!(table = "reports", id = %record.id, "Inserted record");
        Ok(())
    }

    async fn get_scenario(&self, id: Uuid) -> Result<Option<ScenarioRecord>> {
        let row = sqlx::query("SELECT * FROM scenarios WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch scenario")?;
        row.as_ref().map(scenario_from_row).transpose()
    }

    async fn get_prediction(&self, id: Uuid) -> Result<Option<PredictionRecord>> {
        let row = sqlx::query("SELECT * FROM predictions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch prediction")?;
        row.as_ref().map(prediction_from_row).transpose()
    }

    async fn get_plan(&self, id: Uuid) -> Result<Option<PlanRecord>> {
        let row = sqlx::query("SELECT * FROM plans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch plan")?;
        row.as_ref().map(plan_from_row).transpose()
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<ReportRecord>> {
        let row = sqlx::query("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch report")?;
        row.as_ref().map(report_from_row).transpose()
    }

    async fn list_scenarios(&self) -> Result<Vec<ScenarioRecord>> {
        let rows = sqlx::query("SELECT * FROM scenarios ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list scenarios")?;
        rows.iter().map(scenario_from_row).collect()
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT count(*) FROM scenarios) AS scenarios,
                (SELECT count(*) FROM predictions) AS predictions,
                (SELECT count(*) FROM plans) AS plans,
                (SELECT count(*) FROM reports) AS reports
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to count records")?;

        let count = |column: &str| -> Result<usize> {
            let n: i64 = row.try_get(column)?;
            Ok(n as usize)
        };

        Ok(StoreCounts {
            scenarios: count("scenarios")?,
            predictions: count("predictions")?,
            plans: count("plans")?,
            reports: count("reports")?,
        })
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

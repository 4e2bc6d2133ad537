pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod telemetry;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use predict::{GraniteClient, PredictionService};
use report::ReportBuilder;
use store::{MemoryStore, PgStore, Store};
use workflow::Planner;

use config::AppConfig;
use metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub planner: Planner,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(planner: Planner) -> Self {
        Self {
            planner,
            metrics: Metrics::new(),
        }
    }
}

/// Wire the generator, store and report builder described by `config`.
pub async fn build_planner(config: &AppConfig) -> Result<Planner> {
    let predictor = match config.llm.usable_api_key() {
        Some(key) => {
            info!(model = %config.llm.model, url = %config.llm.api_url, "Using hosted model");
            let client = GraniteClient::new(
                config.llm.api_url.clone(),
                key.to_string(),
                config.llm.model.clone(),
            )
            .with_sampling(config.llm.max_tokens, config.llm.temperature);
            PredictionService::new(Arc::new(client))
        }
        None => {
            warn!("No model API key configured, using mock generator");
            PredictionService::mock()
        }
    };

    let store: Arc<dyn Store> = match &config.storage.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.storage.max_connections).await?;
            store.init_schema().await?;
            info!("Connected to PostgreSQL");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, records are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let reports = ReportBuilder::new(&config.report.output_dir);
    Ok(Planner::new(store, predictor, reports))
}

pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/predict", post(routes::predict))
        .route("/plan", post(routes::plan))
        .route("/report", post(routes::report))
        .route("/scenarios", get(routes::list_scenarios))
        .route("/scenarios/:id", get(routes::get_scenario))
        .route("/predictions/:id", get(routes::get_prediction))
        .route("/plans/:id", get(routes::get_plan))
        .route("/reports/:id", get(routes::get_report))
        .route("/download/:id", get(routes::download_report))
        .route("/disaster-types", get(routes::disaster_types))
        .route("/severity-levels", get(routes::severity_levels))
        .route("/stats", get(routes::stats))
        .fallback(routes::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_context,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

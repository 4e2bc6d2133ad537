use anyhow::{Context, Result};

use api::config::AppConfig;
use api::{build_planner, telemetry};
use scenario::ScenarioInput;
use workflow::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .context("Usage: run_scenario <scenario.json>")?;

    let mut config = AppConfig::from_env()?;
    // Plain-text logs on stderr, JSON summary on stdout.
    config.logging.json = false;
    telemetry::init(&config.logging)?;

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read scenario file {}", path))?;
    let input: ScenarioInput = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse scenario file {}", path))?;

    let planner = build_planner(&config).await?;
    let outcome = planner.run(&Pipeline::full(), input).await?;

    eprintln!("=== Pipeline steps ===");
    for step in &outcome.steps {
        eprintln!("  {:<16} {:?} {:.3} ms", step.name, step.status, step.duration_ms());
    }
    eprintln!("  total            {:.3} ms", outcome.total_duration_ms());

    println!("{}", serde_json::to_string_pretty(&outcome.summary())?);
    Ok(())
}

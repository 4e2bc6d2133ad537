use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const PLACEHOLDER_API_KEY: &str = "TODO_REPLACE_WITH_ACTUAL_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// PostgreSQL URL; the in-memory store is used when unset.
    pub database_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            llm: LlmConfig {
                api_url: "https://api.watsonx.ai/v1/text/generation".to_string(),
                api_key: None,
                model: "ibm/granite-13b-instruct-v2".to_string(),
                max_tokens: 2048,
                temperature: 0.7,
            },
            storage: StorageConfig {
                database_url: None,
                max_connections: 5,
            },
            report: ReportConfig {
                output_dir: "reports".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: true,
            },
        }
    }
}

impl AppConfig {
    /// Defaults overlaid with the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.server.port = port
                .parse()
                .with_context(|| format!("Invalid PORT value: {}", port))?;
        }
        if let Some(url) = lookup("GRANITE_API_URL") {
            config.llm.api_url = url;
        }
        if let Some(key) = lookup("GRANITE_API_KEY") {
            config.llm.api_key = Some(key);
        }
        if let Some(model) = lookup("GRANITE_MODEL") {
            config.llm.model = model;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            config.storage.database_url = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(dir) = lookup("REPORT_DIR") {
            config.report.output_dir = dir;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            config.logging.level = level.to_lowercase();
        }
        if let Some(json) = lookup("LOG_JSON") {
            config.logging.json = parse_bool(&json)
                .with_context(|| format!("Invalid LOG_JSON value: {}", json))?;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl LlmConfig {
    /// A real key, not missing, blank or the shipped placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != PLACEHOLDER_API_KEY)
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{}'", other),
    }
}

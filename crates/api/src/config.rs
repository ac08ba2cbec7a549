//! Application configuration
//!
//! Layered: embedded defaults, then an optional file named by
//! `SENTINEL_CONFIG`, then `SENTINEL_SECTION__KEY` environment variables.

use alerting::{AlertingConfig, SeverityConfig, TrendConfig};
use fallback::AdviceConfig;
use serde::{Deserialize, Serialize};
use storage::DEFAULT_MAX_PREDICTION_RECORDS;

/// Environment variable naming an override config file
pub const CONFIG_PATH_ENV: &str = "SENTINEL_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// `*` allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            cors_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `memory` or a sqlite URL
    pub url: String,
    /// Retention for the `memory` store
    pub max_memory_records: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://outbreak_sentinel.db".to_string(),
            max_memory_records: DEFAULT_MAX_PREDICTION_RECORDS,
        }
    }
}

impl StorageConfig {
    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case("memory")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub model: ModelConfig,
    pub storage: StorageConfig,
    pub trend: TrendConfig,
    pub severity: SeverityConfig,
    pub advice: AdviceConfig,
}

impl AppConfig {
    /// Load from defaults, optional file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(path.as_deref())
    }

    pub fn load_from(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            include_str!("../config/default.toml"),
            config::FileFormat::Toml,
        ));
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        builder
            .add_source(
                config::Environment::with_prefix("SENTINEL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// In-memory store, no advisor, no model: for tests and demos
    pub fn ephemeral() -> Self {
        Self {
            storage: StorageConfig {
                url: "memory".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn alerting(&self) -> AlertingConfig {
        AlertingConfig {
            trend: self.trend.clone(),
            severity: self.severity.clone(),
        }
    }
}

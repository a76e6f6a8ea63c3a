use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8000;
const CONFIG_DIR: &str = "config";
const DEFAULT_MIN_DATA_POINTS: usize = 12;
const DEFAULT_HORIZON_DAYS: u32 = 365;

/// Parameters of a forecast run
#[derive(Clone, Copy, Debug, Deserialize, Validate, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ForecastSettings {
    /// Reagents with fewer distinct consumption dates than this are skipped
    #[serde(default = "default_min_data_points")]
    #[validate(range(min = 2, max = 10000))]
    pub min_data_points: usize,

    /// Days projected past the last observed date
    #[serde(default = "default_horizon_days")]
    #[validate(range(min = 1, max = 3650))]
    pub horizon_days: u32,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            min_data_points: DEFAULT_MIN_DATA_POINTS,
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Forecast run parameters
    #[serde(default)]
    #[validate]
    pub forecast: ForecastSettings,
}

impl AppConfig {
    /// Creates a new configuration with default pool and forecast settings
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            forecast: ForecastSettings::default(),
        }
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_min_data_points() -> usize {
    DEFAULT_MIN_DATA_POINTS
}

fn default_horizon_days() -> u32 {
    DEFAULT_HORIZON_DAYS
}

fn default_db_max_connections() -> u32 {
    5
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("reagent_forecast={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://reagent_forecast.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!(
        min_data_points = app_config.forecast.min_data_points,
        horizon_days = app_config.forecast.horizon_days,
        "Configuration loaded successfully"
    );
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "127.0.0.1".into(),
            8000,
            "test".into(),
        )
    }

    #[test]
    fn forecast_defaults_are_valid() {
        let settings = ForecastSettings::default();
        assert_eq!(settings.min_data_points, 12);
        assert_eq!(settings.horizon_days, 365);
        assert!(base_config().validate().is_ok());
    }

    #[rstest]
    #[case(0, 365, false)]
    #[case(1, 365, false)]
    #[case(2, 365, true)]
    #[case(12, 0, false)]
    #[case(12, 3650, true)]
    #[case(12, 3651, false)]
    fn forecast_settings_bounds(
        #[case] min_data_points: usize,
        #[case] horizon_days: u32,
        #[case] valid: bool,
    ) {
        let mut cfg = base_config();
        cfg.forecast = ForecastSettings {
            min_data_points,
            horizon_days,
        };
        assert_eq!(cfg.validate().is_ok(), valid);
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut cfg = base_config();
        cfg.log_level = "verbose".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn forecast_section_deserializes_with_defaults() {
        let cfg = Config::builder()
            .set_default("database_url", "sqlite::memory:")
            .unwrap()
            .set_default("host", "0.0.0.0")
            .unwrap()
            .set_default("environment", "test")
            .unwrap()
            .set_override("forecast.min_data_points", 2)
            .unwrap()
            .build()
            .unwrap();

        let app_config: AppConfig = cfg.try_deserialize().unwrap();
        assert_eq!(app_config.forecast.min_data_points, 2);
        assert_eq!(app_config.forecast.horizon_days, 365);
        assert_eq!(app_config.port, 8000);
    }
}

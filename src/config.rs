use serde::Deserialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Application configuration, loaded from defaults, an optional
/// `config/{environment}.toml` file, and `APP__`-prefixed environment
/// variables (highest precedence).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: Option<String>,
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub db_min_connections: u32,
    pub cors_allowed_origins: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

impl AppConfig {
    /// Construct a configuration directly; used by tests.
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: None,
            log_json: false,
            auto_migrate: true,
            db_max_connections: 10,
            db_min_connections: 1,
            cors_allowed_origins: None,
        }
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn is_development(&self) -> bool {
        matches!(self.environment.as_str(), "development" | "dev" | "test")
    }
}

/// Loads configuration for the current environment.
pub fn load_config() -> Result<AppConfig, config::ConfigError> {
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let builder = config::Config::builder()
        .set_default("database_url", "sqlite://orgledger.db?mode=rwc")?
        .set_default("host", "127.0.0.1")?
        .set_default("port", 8080_i64)?
        .set_default("environment", environment.clone())?
        .set_default("auto_migrate", true)?
        .set_default("db_max_connections", 10_i64)?
        .set_default("db_min_connections", 1_i64)?
        .add_source(
            config::File::with_name(&format!("config/{}", environment)).required(false),
        )
        .add_source(config::Environment::with_prefix("APP").separator("__"));

    builder.build()?.try_deserialize()
}

/// Initializes the global tracing subscriber. Safe to call once at startup.
pub fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("orgledger_api={log_level},tower_http=info")));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

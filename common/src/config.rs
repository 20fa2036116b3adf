//! Service configuration.
//!
//! Values are read from environment variables, optionally seeded from a
//! `.env` file in the working directory. The resulting [`AppConfig`] is
//! immutable and passed by value into the components that need it.

use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_SELECT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_RESULT_SET_HARD_LIMIT: u32 = 1000;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" | "plain" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Paging limits applied by the query executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySettings {
    /// `end_row` used when the client does not send one.
    pub default_page_size: u32,
    /// Upper bound for `end_row`, whatever the client asks for.
    pub result_set_hard_limit: u32,
    /// Per-statement execution timeout in seconds.
    pub query_timeout_secs: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_SELECT_PAGE_SIZE,
            result_set_hard_limit: DEFAULT_RESULT_SET_HARD_LIMIT,
            query_timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

impl QuerySettings {
    /// Builds settings, keeping the default page size within the hard limit.
    pub fn new(default_page_size: u32, result_set_hard_limit: u32, query_timeout_secs: u64) -> Self {
        let result_set_hard_limit = result_set_hard_limit.max(1);
        Self {
            default_page_size: default_page_size.clamp(1, result_set_hard_limit),
            result_set_hard_limit,
            query_timeout_secs: query_timeout_secs.max(1),
        }
    }
}

/// Application configuration shared by every component of a service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service_name: String,
    pub host: String,
    pub port: u16,
    /// Root directory for database files and script/macro content.
    pub data_dir: PathBuf,
    /// Connection string of the metadata store.
    pub database_url: String,
    pub acquire_timeout_secs: u64,
    pub query: QuerySettings,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Loads configuration from the environment, tagging it with the service name.
    pub fn load_with_service(service_name: &str) -> Self {
        let data_dir = PathBuf::from(env_or("OWL_DATA_DIR", DEFAULT_DATA_DIR.to_string()));
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| default_database_url(&data_dir));

        let query = QuerySettings::new(
            env_or("DEFAULT_SELECT_PAGE_SIZE", DEFAULT_SELECT_PAGE_SIZE),
            env_or("RESULT_SET_HARD_LIMIT", DEFAULT_RESULT_SET_HARD_LIMIT),
            env_or("OWL_QUERY_TIMEOUT_SECS", DEFAULT_QUERY_TIMEOUT_SECS),
        );

        Self {
            service_name: service_name.to_string(),
            host: env_or("SERVER_HOST", DEFAULT_HOST.to_string()),
            port: env_or("SERVER_PORT", DEFAULT_PORT),
            data_dir,
            database_url,
            acquire_timeout_secs: env_or("OWL_ACQUIRE_TIMEOUT_SECS", DEFAULT_ACQUIRE_TIMEOUT_SECS),
            query,
            log_format: env_or("LOG_FORMAT", LogFormat::default()),
        }
    }

    /// Configuration rooted at `data_dir` with default limits, for embedding and tests.
    pub fn for_data_dir(service_name: &str, data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            service_name: service_name.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: default_database_url(&data_dir),
            data_dir,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            query: QuerySettings::default(),
            log_format: LogFormat::default(),
        }
    }

    /// Address the HTTP listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_database_url(data_dir: &Path) -> String {
    format!("sqlite:{}?mode=rwc", data_dir.join("owl.db").display())
}

/// Reads and parses an environment variable, falling back when missing or invalid.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "ignoring invalid configuration value");
                default
            }
        },
        Err(_) => default,
    }
}

/// Load .env file from the working directory (best-effort, no error if missing).
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    let Ok(content) = std::fs::read_to_string(env_path) else {
        return;
    };
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"');
            // Only set if not already set by the environment
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}

//! Configuration loading and constants.
//!
//! Loads application configuration from a TOML file, applies environment
//! overrides, and validates the result. `AppConfig` is the root configuration
//! struct; every section has defaults so a missing default config file still
//! yields a runnable service.

use serde::Deserialize;
use std::fmt;
use std::path::Path;

// =============================================================================
// HTTP Response Cache Control
// =============================================================================

/// Data API responses; the collection may change across restarts
pub const CACHE_CONTROL_API: &str = "no-cache";

/// Health responses must never be served from a cache
pub const CACHE_CONTROL_HEALTH: &str = "no-store";

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "visualization_server=debug,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Default HTTP listen port
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Database used when neither the config nor the URI names one
pub const DEFAULT_DATABASE_NAME: &str = "visualization";

/// Collection holding the loaded records
pub const DEFAULT_COLLECTION_NAME: &str = "jsondata";

/// Dataset file read at startup
pub const DEFAULT_DATASET_PATH: &str = "jsondata.json";

/// Environment variable overriding `database.uri`
pub const ENV_MONGO_URI: &str = "MONGO_URI";

/// Environment variable overriding `http.port`
pub const ENV_PORT: &str = "PORT";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_HTTP_PORT
    }
}

/// Which document store implementation backs the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Mongodb,
    /// In-process store, contents are lost on exit
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// MongoDB connection string (host, credentials, default database)
    #[serde(default = "DatabaseConfig::default_uri")]
    pub uri: String,
    /// Database name, overrides the connection string's default database
    pub name: Option<String>,
    #[serde(default = "DatabaseConfig::default_collection")]
    pub collection: String,
    /// How long to wait for a reachable server before failing (default: 10)
    #[serde(default = "DatabaseConfig::default_server_selection_timeout")]
    pub server_selection_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            uri: Self::default_uri(),
            name: None,
            collection: Self::default_collection(),
            server_selection_timeout_seconds: Self::default_server_selection_timeout(),
        }
    }
}

impl DatabaseConfig {
    fn default_uri() -> String {
        format!("mongodb://localhost:27017/{}", DEFAULT_DATABASE_NAME)
    }

    fn default_collection() -> String {
        DEFAULT_COLLECTION_NAME.to_string()
    }

    fn default_server_selection_timeout() -> u64 {
        10
    }
}

/// What the bootstrap step does when the collection already holds documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadMode {
    /// Always insert; restarting against a persistent database duplicates every record.
    #[default]
    Append,
    /// Delete the collection's documents, then insert.
    Replace,
    /// Insert only into an empty collection.
    SkipIfPopulated,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadMode::Append => "append",
            LoadMode::Replace => "replace",
            LoadMode::SkipIfPopulated => "skip-if-populated",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "DatasetConfig::default_path")]
    pub path: String,
    #[serde(default)]
    pub load_mode: LoadMode,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            load_mode: LoadMode::default(),
        }
    }
}

impl DatasetConfig {
    fn default_path() -> String {
        DEFAULT_DATASET_PATH.to_string()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

impl AppConfig {
    /// Load configuration from `path`, apply environment overrides and validate.
    ///
    /// A missing file is only tolerated at [`DEFAULT_CONFIG_PATH`], in which case
    /// built-in defaults are used.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents)?,
            Err(e)
                if e.kind() == std::io::ErrorKind::NotFound
                    && path == Path::new(DEFAULT_CONFIG_PATH) =>
            {
                AppConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply `MONGO_URI` and `PORT` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup(ENV_MONGO_URI) {
            self.database.uri = uri;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.http.port = port.trim().parse().map_err(|_| {
                ConfigError::Validation(format!("{} is not a valid port: {:?}", ENV_PORT, port))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.collection.trim().is_empty() {
            return Err(ConfigError::Validation(
                "database.collection must not be empty".to_string(),
            ));
        }
        if self.database.backend == StoreBackend::Mongodb && self.database.uri.trim().is_empty() {
            return Err(ConfigError::Validation(
                "database.uri is required for the mongodb backend".to_string(),
            ));
        }
        if self.dataset.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "dataset.path must not be empty".to_string(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ConfigError::Validation(format!(
                "logging.format must be \"text\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}

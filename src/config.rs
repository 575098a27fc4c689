//! Service configuration.
//!
//! [`Config::default`] is the documented baseline; the binary applies
//! environment overrides on top of it via [`Config::from_env`].

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the export service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host the HTTP server binds to
    pub host: String,

    /// Port the HTTP server binds to
    pub port: u16,

    /// Database connection URL (e.g. `sqlite:data/exports.db`)
    pub database_url: String,

    /// Maximum number of pooled database connections.
    ///
    /// This is also the admission control for concurrent exports: a
    /// download request beyond pool capacity waits for a connection
    /// rather than failing outright.
    pub pool_size: u32,

    /// Seconds to wait for a pooled connection before giving up
    pub acquire_timeout_secs: u64,

    /// Seconds an idle pooled connection is kept open
    pub idle_timeout_secs: u64,

    /// Allowed CORS origins; `"*"` allows any origin
    pub cors_origins: Vec<String>,

    /// Whether to serve Swagger UI at `/swagger-ui`
    pub swagger_ui: bool,

    /// Number of synthetic rows the binary seeds into an empty
    /// `records` table on startup
    pub seed_row_count: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            pool_size: default_pool_size(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            cors_origins: default_cors_origins(),
            swagger_ui: default_swagger_ui(),
            seed_row_count: default_seed_row_count(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "sqlite:data/exports.db".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    30
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_swagger_ui() -> bool {
    true
}

fn default_seed_row_count() -> u64 {
    10_000
}

impl Config {
    /// Build a configuration from defaults plus environment overrides.
    ///
    /// Recognized variables: `HOST`, `PORT`, `DATABASE_URL`,
    /// `DATABASE_POOL_SIZE`, `CORS_ORIGINS` (comma-separated),
    /// `SWAGGER_UI` (`true`/`false`), `SEED_ROW_COUNT`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            config.port = port.parse().map_err(|_| Error::Config {
                message: format!("PORT must be a number between 1 and 65535, got {port:?}"),
                key: Some("port".to_string()),
            })?;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(size) = std::env::var("DATABASE_POOL_SIZE") {
            config.pool_size = size.parse().map_err(|_| Error::Config {
                message: format!("DATABASE_POOL_SIZE must be a positive number, got {size:?}"),
                key: Some("pool_size".to_string()),
            })?;
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Ok(swagger) = std::env::var("SWAGGER_UI") {
            config.swagger_ui = swagger.eq_ignore_ascii_case("true") || swagger == "1";
        }
        if let Ok(count) = std::env::var("SEED_ROW_COUNT") {
            config.seed_row_count = count.parse().map_err(|_| Error::Config {
                message: format!("SEED_ROW_COUNT must be a number, got {count:?}"),
                key: Some("seed_row_count".to_string()),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration ranges
    pub fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(Error::Config {
                message: "pool_size must be at least 1".to_string(),
                key: Some("pool_size".to_string()),
            });
        }
        if self.database_url.is_empty() {
            return Err(Error::Config {
                message: "database_url must not be empty".to_string(),
                key: Some("database_url".to_string()),
            });
        }
        if self.host.is_empty() {
            return Err(Error::Config {
                message: "host must not be empty".to_string(),
                key: Some("host".to_string()),
            });
        }
        Ok(())
    }

    /// The `host:port` string the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

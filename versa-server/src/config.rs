//! Configuration management for the server

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use versa_core::{catalog::DEFAULT_AGENT_TYPES, Catalog};
use versa_storage::DatabaseConfig;

/// Environment variable prefix, e.g. `VERSA__SERVER__PORT=8000`
pub const ENV_PREFIX: &str = "VERSA";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IP literal or host name such as `localhost`
    pub host: String,
    pub port: u16,
}

/// Agent type allow-list. An empty list accepts any agent type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub agent_types: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 7860,
            },
            database: DatabaseConfig::default(),
            catalog: CatalogConfig {
                agent_types: DEFAULT_AGENT_TYPES.iter().map(|s| s.to_string()).collect(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from defaults, config files and the environment
    pub fn load() -> Result<Self> {
        Self::load_layers(None)
    }

    /// Same as [`Config::load`] with an extra required file layered on top
    /// of `config/default` and `config/local`
    pub fn load_from_file(path: &str) -> Result<Self> {
        Self::load_layers(Some(path))
    }

    fn load_layers(path: Option<&str>) -> Result<Self> {
        let defaults = Self::default();

        let mut builder = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("database.url", defaults.database.url)?
            .set_default(
                "database.max_connections",
                i64::from(defaults.database.max_connections.unwrap_or(5)),
            )?
            .set_default(
                "database.migrate_on_startup",
                defaults.database.migrate_on_startup,
            )?
            .set_default("catalog.agent_types", defaults.catalog.agent_types)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.format", defaults.logging.format)?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("catalog.agent_types"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the deserializer cannot
    pub fn validate(&self) -> Result<()> {
        let host = self.server.host.trim();
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(Error::Configuration(format!(
                "invalid server host '{}'",
                self.server.host
            )));
        }
        self.catalog()?;
        if self.database.max_connections == Some(0) {
            return Err(Error::Configuration(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(Error::Configuration(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                other
            ))),
        }
    }

    /// Resolve the listener address, taking the first result for host names
    pub async fn server_addr(&self) -> Result<SocketAddr> {
        let host = self.server.host.trim();
        let unresolved = |reason: String| {
            Error::Configuration(format!(
                "invalid server address {}:{}: {}",
                host, self.server.port, reason
            ))
        };

        tokio::net::lookup_host((host, self.server.port))
            .await
            .map_err(|e| unresolved(e.to_string()))?
            .next()
            .ok_or_else(|| unresolved("host did not resolve".to_string()))
    }

    /// Build the agent type allow-list
    pub fn catalog(&self) -> Result<Catalog> {
        Ok(Catalog::new(&self.catalog.agent_types)?)
    }
}

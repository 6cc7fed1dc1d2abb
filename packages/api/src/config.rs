//! Server configuration read from the environment.

use std::time::Duration;

use db::DbConfig;
use queue_core::{Department, DepartmentId};

/// Error in the server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("Invalid department entry '{0}', expected id:name")]
    Department(String),
}

/// Runtime configuration of the queue server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db: DbConfig,
    /// Capacity of the display event channel.
    pub broadcast_capacity: usize,
    /// Maximum log level, as understood by `tracing`.
    pub log_level: String,
    /// Base URL printed in verification links; the request host when unset.
    pub public_url: Option<String>,
    /// Departments seeded into an empty store.
    pub departments: Vec<Department>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            db: DbConfig::memory(),
            broadcast_capacity: actors::broadcast::DEFAULT_CAPACITY,
            log_level: "info".to_string(),
            public_url: None,
            departments: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Read the configuration from `QUEUE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(host) = get("QUEUE_HOST") {
            config.host = host;
        }
        if let Some(port) = get("QUEUE_PORT") {
            config.port = parse("QUEUE_PORT", port)?;
        }

        if let Some(endpoint) = get("QUEUE_DB_ENDPOINT") {
            config.db = DbConfig::endpoint(endpoint);
        }
        if let Some(namespace) = get("QUEUE_DB_NAMESPACE") {
            config.db = config.db.with_namespace(namespace);
        }
        if let Some(database) = get("QUEUE_DB_DATABASE") {
            config.db = config.db.with_database(database);
        }
        if let (Some(user), Some(pass)) = (get("QUEUE_DB_USER"), get("QUEUE_DB_PASS")) {
            config.db = config.db.with_credentials(user, pass);
        }
        if let Some(secs) = get("QUEUE_STORAGE_TIMEOUT_SECS") {
            let secs: u64 = parse("QUEUE_STORAGE_TIMEOUT_SECS", secs)?;
            config.db = config.db.with_timeout(Duration::from_secs(secs));
        }

        if let Some(capacity) = get("QUEUE_BROADCAST_CAPACITY") {
            config.broadcast_capacity = parse("QUEUE_BROADCAST_CAPACITY", capacity)?;
        }
        if let Some(level) = get("QUEUE_LOG_LEVEL") {
            config.log_level = level;
        }
        config.public_url = get("QUEUE_PUBLIC_URL");
        if let Some(departments) = get("QUEUE_DEPARTMENTS") {
            config.departments = parse_departments(&departments)?;
        }

        Ok(config)
    }

    /// Address to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

/// Parse a department seed list such as `1:General Medicine,2:Cardiology`.
pub fn parse_departments(raw: &str) -> Result<Vec<Department>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, name) = entry
                .split_once(':')
                .ok_or_else(|| ConfigError::Department(entry.to_string()))?;
            let id = DepartmentId::parse(id).map_err(|_| ConfigError::Department(entry.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::Department(entry.to_string()));
            }
            Ok(Department::new(id, name))
        })
        .collect()
}

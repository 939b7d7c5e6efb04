//! Connection configuration.
//!
//! Connections are described by [`ConnectionConfig`] values, either built in
//! code or loaded from a TOML document through [`DatabaseConfig`]:
//!
//! ```toml
//! default = "clickhouse"
//!
//! [connections.clickhouse]
//! driver = "clickhouse-ext"
//! host = "localhost"
//! port = 8123
//! username = "default"
//! database = "analytics"
//!
//! [connections.clickhouse.settings]
//! max_execution_time = "30"
//! ```

use crate::error::{OrmError, OrmResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default HTTP interface port.
pub const DEFAULT_PORT: u16 = 8123;

/// Default number of statements in flight for async selects.
pub const DEFAULT_ASYNC_CONCURRENCY: usize = 5;

/// Configuration for one named ClickHouse connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Connection name; filled from the configuration key on resolution.
    pub name: String,
    /// Driver that should build this connection.
    pub driver: String,
    /// Server host.
    pub host: String,
    /// HTTP interface port.
    pub port: u16,
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
    /// Default database.
    pub database: String,
    /// Use `https` instead of `http`.
    pub https: bool,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Max statements in flight for async selects.
    pub async_concurrency: usize,
    /// Server settings sent as query parameters (e.g. `max_execution_time`).
    pub settings: BTreeMap<String, String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            driver: crate::manager::DRIVER_NAME.to_string(),
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            username: "default".to_string(),
            password: String::new(),
            database: "default".to_string(),
            https: false,
            timeout_secs: None,
            async_concurrency: DEFAULT_ASYNC_CONCURRENCY,
            settings: BTreeMap::new(),
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set user name and password.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set default database.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Use https.
    pub fn https(mut self, enabled: bool) -> Self {
        self.https = enabled;
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout_secs = Some(duration.as_secs());
        self
    }

    /// Set how many async statements may run at once.
    pub fn async_concurrency(mut self, n: usize) -> Self {
        self.async_concurrency = n;
        self
    }

    /// Add a server setting.
    pub fn setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Base URL of the HTTP interface.
    pub fn base_url(&self) -> OrmResult<Url> {
        let scheme = if self.https { "https" } else { "http" };
        let url = Url::parse(&format!("{scheme}://{}:{}/", self.host, self.port))?;
        Ok(url)
    }

    /// Check the configuration before a connection is built.
    pub fn validate(&self) -> OrmResult<()> {
        if self.host.trim().is_empty() {
            return Err(OrmError::config(format!(
                "connection '{}': host must not be empty",
                self.name
            )));
        }
        if self.async_concurrency == 0 {
            return Err(OrmError::config(format!(
                "connection '{}': async_concurrency must be at least 1",
                self.name
            )));
        }
        Ok(())
    }
}

/// A set of named connections plus the default name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Name of the connection used when none is given.
    #[serde(default = "default_connection_name")]
    pub default: String,
    /// Named connection configurations.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

fn default_connection_name() -> String {
    "clickhouse".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            default: default_connection_name(),
            connections: HashMap::new(),
        }
    }
}

impl DatabaseConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named connection.
    pub fn with_connection(mut self, name: impl Into<String>, config: ConnectionConfig) -> Self {
        self.connections.insert(name.into(), config);
        self
    }

    /// Set the default connection name.
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default = name.into();
        self
    }

    /// Parse from a TOML document.
    pub fn from_toml_str(s: &str) -> OrmResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> OrmResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::new();
        assert_eq!(config.port, 8123);
        assert_eq!(config.username, "default");
        assert_eq!(config.driver, "clickhouse-ext");
        assert_eq!(config.async_concurrency, 5);
        assert_eq!(config.base_url().unwrap().as_str(), "http://localhost:8123/");
    }

    #[test]
    fn test_builder_setters() {
        let config = ConnectionConfig::new()
            .host("ch.internal")
            .port(8443)
            .https(true)
            .credentials("reader", "secret")
            .database("analytics")
            .timeout(Duration::from_secs(30))
            .setting("max_execution_time", "10");

        assert_eq!(config.base_url().unwrap().as_str(), "https://ch.internal:8443/");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.settings.get("max_execution_time").map(String::as_str), Some("10"));
    }

    #[test]
    fn test_from_toml() {
        let config = DatabaseConfig::from_toml_str(
            r#"
            default = "analytics"

            [connections.analytics]
            driver = "clickhouse-ext"
            host = "10.0.0.5"
            database = "events"

            [connections.analytics.settings]
            max_threads = "4"
            "#,
        )
        .unwrap();

        assert_eq!(config.default, "analytics");
        let conn = &config.connections["analytics"];
        assert_eq!(conn.host, "10.0.0.5");
        assert_eq!(conn.port, DEFAULT_PORT);
        assert_eq!(conn.database, "events");
        assert_eq!(conn.settings["max_threads"], "4");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = DatabaseConfig::from_toml_str("default = [").unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
    }

    #[test]
    fn test_validate() {
        assert!(ConnectionConfig::new().validate().is_ok());
        assert!(ConnectionConfig::new().host(" ").validate().is_err());
        assert!(ConnectionConfig::new().async_concurrency(0).validate().is_err());
    }
}

//! Named connection resolution and driver registration.
//!
//! ```ignore
//! use chorm::{DatabaseConfig, DatabaseManager};
//! use chorm::events::TracingDispatcher;
//! use std::sync::Arc;
//!
//! let config = DatabaseConfig::from_path("database.toml")?;
//! let manager = DatabaseManager::bootstrap(config)
//!     .with_event_dispatcher(Arc::new(TracingDispatcher::new()));
//!
//! let total = manager.table("events")?.count("*").await?;
//! ```

use crate::config::{ConnectionConfig, DatabaseConfig};
use crate::connection::Connection;
use crate::error::{OrmError, OrmResult};
use crate::events::EventDispatcher;
use crate::query::Builder;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Driver name the ClickHouse connection factory is registered under.
pub const DRIVER_NAME: &str = "clickhouse-ext";

/// Builds a connection from its configuration and name.
pub type ConnectionFactory =
    Arc<dyn Fn(ConnectionConfig, &str) -> OrmResult<Connection> + Send + Sync>;

/// Resolves named connections from a [`DatabaseConfig`].
///
/// Each named connection is built once by the factory registered for its
/// driver and then reused.
pub struct DatabaseManager {
    config: DatabaseConfig,
    drivers: HashMap<String, ConnectionFactory>,
    connections: Mutex<HashMap<String, Connection>>,
    dispatcher: Option<Arc<dyn EventDispatcher>>,
}

impl std::fmt::Debug for DatabaseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut drivers: Vec<&String> = self.drivers.keys().collect();
        drivers.sort();
        f.debug_struct("DatabaseManager")
            .field("default", &self.config.default)
            .field("drivers", &drivers)
            .field("has_dispatcher", &self.dispatcher.is_some())
            .finish_non_exhaustive()
    }
}

impl DatabaseManager {
    /// Create a manager with no drivers registered.
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            drivers: HashMap::new(),
            connections: Mutex::new(HashMap::new()),
            dispatcher: None,
        }
    }

    /// Create a manager with the ClickHouse driver registered.
    pub fn bootstrap(config: DatabaseConfig) -> Self {
        let mut manager = Self::new(config);
        manager.register_clickhouse();
        manager
    }

    /// Register the ClickHouse HTTP driver under [`DRIVER_NAME`].
    pub fn register_clickhouse(&mut self) -> &mut Self {
        self.extend(DRIVER_NAME, |config, _name| Connection::new(config))
    }

    /// Register a connection factory for `driver`, replacing any previous one.
    pub fn extend<F>(&mut self, driver: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(ConnectionConfig, &str) -> OrmResult<Connection> + Send + Sync + 'static,
    {
        self.drivers.insert(driver.into(), Arc::new(factory));
        self
    }

    /// Returns `true` if a factory is registered for `driver`.
    pub fn has_driver(&self, driver: &str) -> bool {
        self.drivers.contains_key(driver)
    }

    /// Bind an event dispatcher; connections created afterwards get it attached.
    pub fn with_event_dispatcher(mut self, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Name of the default connection.
    pub fn default_connection(&self) -> &str {
        &self.config.default
    }

    /// Resolve a named connection, or the default one when `name` is `None`.
    pub fn connection(&self, name: Option<&str>) -> OrmResult<Connection> {
        let name = name.unwrap_or(&self.config.default);

        if let Some(connection) = self.cache()?.get(name) {
            return Ok(connection.clone());
        }

        // Factories may resolve other connections, so build without the lock.
        let connection = self.make_connection(name)?;
        Ok(self
            .cache()?
            .entry(name.to_string())
            .or_insert(connection)
            .clone())
    }

    /// Start a builder on the default connection selecting from `table`.
    pub fn table(&self, table: impl Into<String>) -> OrmResult<Builder> {
        Ok(self.connection(None)?.table(table))
    }

    /// Drop a cached connection so the next lookup rebuilds it.
    pub fn purge(&self, name: &str) -> OrmResult<()> {
        self.cache()?.remove(name);
        Ok(())
    }

    fn cache(&self) -> OrmResult<MutexGuard<'_, HashMap<String, Connection>>> {
        self.connections
            .lock()
            .map_err(|_| OrmError::Other("connection cache lock poisoned".to_string()))
    }

    fn make_connection(&self, name: &str) -> OrmResult<Connection> {
        let mut config = self
            .config
            .connections
            .get(name)
            .cloned()
            .ok_or_else(|| OrmError::config(format!("connection [{name}] not configured")))?;
        config.name = name.to_string();

        let factory = self.drivers.get(&config.driver).ok_or_else(|| {
            OrmError::config(format!(
                "unsupported driver [{}] for connection [{name}]",
                config.driver
            ))
        })?;

        let mut connection = factory(config, name)?;
        if let Some(dispatcher) = &self.dispatcher {
            connection.set_event_dispatcher(dispatcher.clone());
        }
        tracing::debug!(target: "chorm", connection = name, "connection created");
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingDispatcher;
    use std::sync::{OnceLock, Weak};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config() -> DatabaseConfig {
        DatabaseConfig::new()
            .with_default("main")
            .with_connection("main", ConnectionConfig::new().host("ch-main"))
            .with_connection(
                "other",
                ConnectionConfig {
                    driver: "mysql".to_string(),
                    ..ConnectionConfig::new()
                },
            )
    }

    #[test]
    fn test_bootstrap_registers_driver() {
        let manager = DatabaseManager::bootstrap(config());
        assert!(manager.has_driver(DRIVER_NAME));
        assert!(!DatabaseManager::new(config()).has_driver(DRIVER_NAME));
    }

    #[test]
    fn test_connection_is_created_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut manager = DatabaseManager::new(config());
        manager.extend(DRIVER_NAME, move |config, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Connection::new(config)
        });

        let first = manager.connection(None).unwrap();
        let second = manager.connection(Some("main")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.name(), "main");
        assert_eq!(second.config().host, "ch-main");

        manager.purge("main").unwrap();
        manager.connection(None).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_factory_can_resolve_another_connection() {
        let owner = Arc::new(OnceLock::<Weak<DatabaseManager>>::new());
        let handle = owner.clone();

        let config = config().with_connection(
            "replica",
            ConnectionConfig {
                driver: "mirror".to_string(),
                ..ConnectionConfig::new()
            },
        );
        let mut manager = DatabaseManager::bootstrap(config);
        manager.extend("mirror", move |config, _| {
            let manager = handle
                .get()
                .and_then(Weak::upgrade)
                .ok_or_else(|| OrmError::config("manager dropped"))?;
            let main = manager.connection(Some("main"))?;
            Connection::new(config.host(main.config().host.clone()))
        });
        let manager = Arc::new(manager);
        owner.set(Arc::downgrade(&manager)).unwrap();

        let replica = manager.connection(Some("replica")).unwrap();
        assert_eq!(replica.name(), "replica");
        assert_eq!(replica.config().host, "ch-main");
        assert_eq!(manager.connection(Some("main")).unwrap().name(), "main");
    }

    #[test]
    fn test_dispatcher_is_attached() {
        let manager = DatabaseManager::bootstrap(config())
            .with_event_dispatcher(Arc::new(CollectingDispatcher::new()));
        let conn = manager.connection(None).unwrap();
        assert!(conn.event_dispatcher().is_some());

        let plain = DatabaseManager::bootstrap(config()).connection(None).unwrap();
        assert!(plain.event_dispatcher().is_none());
    }

    #[test]
    fn test_unknown_connection_and_driver() {
        let manager = DatabaseManager::bootstrap(config());
        assert!(matches!(manager.connection(Some("missing")), Err(OrmError::Config(_))));
        assert!(matches!(manager.connection(Some("other")), Err(OrmError::Config(_))));
    }

    #[test]
    fn test_table_uses_default_connection() {
        let manager = DatabaseManager::bootstrap(config());
        let query = manager.table("events").unwrap();
        assert_eq!(query.connection().name(), "main");
        assert_eq!(query.to_sql(), "SELECT * FROM events");
    }
}

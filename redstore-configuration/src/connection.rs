//! Redis connection settings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use redstore_backend::Store;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 6379;
const DEFAULT_TIMEOUT: f64 = 5.0;

fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT
}

/// Where and how to reach Redis.
///
/// A socket `path` takes precedence over `host` and `port`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ConnectionConfig {
    /// TCP host.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Unix socket path.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// `AUTH` password.
    #[serde(default)]
    pub password: Option<String>,
    /// Database index.
    #[serde(default)]
    pub db: i64,
    /// Connect timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: f64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: None,
            password: None,
            db: 0,
            timeout: default_timeout(),
        }
    }
}

impl ConnectionConfig {
    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.timeout).map_err(|_| ConfigError::InvalidTimeout(self.timeout))
    }

    /// Builds a [`RedisStore`](redstore_redis::RedisStore) named `name`.
    ///
    /// No connection is opened until the first write.
    #[cfg(feature = "redis")]
    pub fn into_store(self, name: Option<String>) -> Result<Arc<dyn Store>, ConfigError> {
        use redstore_redis::{ConnectionMode, RedisStore};

        let timeout = self.connect_timeout()?;
        let mode = match self.path {
            Some(path) => ConnectionMode::unix(path),
            None => ConnectionMode::tcp(self.host, self.port),
        };

        let mut builder = RedisStore::builder()
            .connection(mode)
            .db(self.db)
            .connect_timeout(timeout);

        if let Some(password) = self.password {
            builder = builder.password(password);
        }
        if let Some(name) = name {
            builder = builder.name(name);
        }

        let store = builder
            .build()
            .map_err(|e| ConfigError::StoreNotAvailable(format!("Redis: {}", e)))?;

        Ok(Arc::new(store))
    }

    /// Always fails: the `redis` feature is disabled.
    #[cfg(not(feature = "redis"))]
    pub fn into_store(self, _name: Option<String>) -> Result<Arc<dyn Store>, ConfigError> {
        Err(ConfigError::StoreNotAvailable("Redis".to_string()))
    }
}

//! Redis store implementation.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use redis::{Client, aio::ConnectionManager};
use redstore_backend::{Command, Pipeline, Store, StoreResult};
use redstore_core::SinkLabel;
use tokio::sync::OnceCell;
use tracing::{debug, info, trace};

use crate::error::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 6379;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the Redis server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionMode {
    /// TCP host and port.
    Tcp {
        /// Host name or address.
        host: String,
        /// TCP port.
        port: u16,
    },
    /// Unix domain socket.
    Unix {
        /// Filesystem path of the socket.
        path: PathBuf,
    },
}

impl ConnectionMode {
    /// TCP connection to `host:port`.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Unix socket connection.
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }
}

impl Default for ConnectionMode {
    fn default() -> Self {
        Self::tcp(DEFAULT_HOST, DEFAULT_PORT)
    }
}

/// Redis store based on redis-rs crate.
///
/// The [`ConnectionManager`] is multiplexed and reconnects on its own, so one
/// `RedisStore` can serve concurrent batch writers.
///
/// [`ConnectionManager`]: redis::aio::ConnectionManager
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    connect_timeout: Duration,
    name: SinkLabel,
}

impl RedisStore {
    /// Creates new RedisStore builder with default settings.
    #[must_use]
    pub fn builder() -> RedisStoreBuilder {
        RedisStoreBuilder::default()
    }

    /// Create lazy connection to redis via [`ConnectionManager`]
    pub async fn connection(&self) -> Result<&ConnectionManager, Error> {
        trace!("Get connection manager");
        self.connection
            .get_or_try_init(|| async {
                info!(timeout = ?self.connect_timeout, "Initialize new redis connection manager");
                tokio::time::timeout(self.connect_timeout, self.client.get_connection_manager())
                    .await
                    .map_err(|_| Error::Timeout(self.connect_timeout))?
                    .map_err(Error::from)
            })
            .await
    }
}

/// Part of builder pattern implementation for RedisStore.
#[derive(Debug, Clone)]
pub struct RedisStoreBuilder {
    mode: ConnectionMode,
    password: Option<String>,
    db: i64,
    connect_timeout: Duration,
    name: SinkLabel,
}

impl Default for RedisStoreBuilder {
    fn default() -> Self {
        Self {
            mode: ConnectionMode::default(),
            password: None,
            db: 0,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            name: SinkLabel::new_static("redis"),
        }
    }
}

impl RedisStoreBuilder {
    /// Set the server address. A unix socket wins over host and port.
    pub fn connection(mut self, mode: ConnectionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the AUTH password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the database index.
    pub fn db(mut self, db: i64) -> Self {
        self.db = db;
        self
    }

    /// Set the timeout for establishing the connection.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set a custom name for this store.
    pub fn name(mut self, name: impl Into<SinkLabel>) -> Self {
        self.name = name.into();
        self
    }

    /// Renders the connection target as a redis-rs URL.
    pub fn connection_url(&self) -> String {
        let password = self
            .password
            .as_deref()
            .map(|password| utf8_percent_encode(password, NON_ALPHANUMERIC).to_string());

        match &self.mode {
            ConnectionMode::Tcp { host, port } => {
                let host = if host.contains(':') {
                    format!("[{host}]")
                } else {
                    host.clone()
                };
                let auth = password
                    .map(|password| format!(":{password}@"))
                    .unwrap_or_default();
                format!("redis://{auth}{host}:{port}/{}", self.db)
            }
            ConnectionMode::Unix { path } => {
                let mut url = format!("redis+unix://{}?db={}", path.display(), self.db);
                if let Some(password) = password {
                    url.push_str("&pass=");
                    url.push_str(&password);
                }
                url
            }
        }
    }

    /// Create new instance of Redis store with passed settings.
    pub fn build(self) -> Result<RedisStore, Error> {
        let url = self.connection_url();
        debug!(mode = ?self.mode, db = self.db, "Build redis store");
        Ok(RedisStore {
            client: Client::open(url)?,
            connection: OnceCell::new(),
            connect_timeout: self.connect_timeout,
            name: self.name,
        })
    }
}

fn append(pipe: &mut redis::Pipeline, command: Command) {
    let pipe = match command {
        Command::ZAdd { key, score, member } => {
            pipe.cmd("ZADD").arg(key).arg(score).arg(member.as_ref())
        }
        Command::ZRemRangeByScore { key, min, max } => pipe
            .cmd("ZREMRANGEBYSCORE")
            .arg(key)
            .arg(min.to_string())
            .arg(max.to_string()),
        Command::ZRemRangeByRank { key, start, stop } => {
            pipe.cmd("ZREMRANGEBYRANK").arg(key).arg(start).arg(stop)
        }
        Command::SAdd { key, member } => pipe.cmd("SADD").arg(key).arg(member.as_ref()),
        Command::RPush { key, value } => pipe.cmd("RPUSH").arg(key).arg(value.as_ref()),
        Command::LPush { key, value } => pipe.cmd("LPUSH").arg(key).arg(value.as_ref()),
        Command::LRem { key, count, value } => {
            pipe.cmd("LREM").arg(key).arg(count).arg(value.as_ref())
        }
        Command::LTrim { key, start, stop } => pipe.cmd("LTRIM").arg(key).arg(start).arg(stop),
        Command::Set { key, value } => pipe.cmd("SET").arg(key).arg(value.as_ref()),
        Command::Expire { key, seconds } => pipe.cmd("EXPIRE").arg(key).arg(seconds),
        Command::Publish { channel, message } => {
            pipe.cmd("PUBLISH").arg(channel).arg(message.as_ref())
        }
    };
    pipe.ignore();
}

#[async_trait]
impl Store for RedisStore {
    async fn execute(&self, pipeline: Pipeline) -> StoreResult<()> {
        if pipeline.is_empty() {
            trace!("Skip empty pipeline");
            return Ok(());
        }

        let commands = pipeline.len();
        let mut con = self.connection().await?.clone();

        let mut pipe = redis::pipe();
        for command in pipeline {
            append(&mut pipe, command);
        }

        pipe.query_async::<()>(&mut con)
            .await
            .map_err(Error::from)?;
        debug!(commands, "Pipeline executed");
        Ok(())
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

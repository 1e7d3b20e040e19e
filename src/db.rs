//! Database connection lifecycle.
//!
//! A [`ConnectionManager`] owns exactly one connection handle and moves it
//! through three states:
//!
//! ```text
//!                connect() ok
//!  Disconnected ─────────────▶ Connected
//!       ▲    │                    │
//!       │    │ attempts           │ liveness probe fails
//!       │    │ exhausted          ▼
//!       │    └──────────▶ Failed  Disconnected ──▶ connect() ──▶ ...
//!       │                   │
//!       └─ explicit connect()
//! ```
//!
//! [`ConnectionManager::ensure_live`] is called before every data operation:
//! it probes the held connection with `SELECT 1` and transparently reconnects
//! when the probe fails, so idle-connection drops never reach callers. Once the
//! bounded retry loop gives up the manager stays `Failed` until the owner
//! calls [`ConnectionManager::connect`] again.
//!
//! The manager needs `&mut self` for every operation. Callers that share one
//! across tasks wrap it in a mutex; callers that need parallelism give each
//! task its own manager.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::{ConnectOptions, Connection};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::DbConfig;
use crate::error::StoreError;
use crate::migrate;

/// Opens, probes and initializes connections for a [`ConnectionManager`].
#[async_trait]
pub trait Connect: Send + Sync {
    type Connection: Send;

    /// Open a fresh connection.
    async fn open(&self) -> Result<Self::Connection, sqlx::Error>;

    /// Cheap round trip proving the connection still works.
    async fn probe(&self, conn: &mut Self::Connection) -> Result<(), sqlx::Error>;

    /// Idempotent schema setup, run after every successful open.
    async fn init_schema(&self, conn: &mut Self::Connection) -> Result<(), sqlx::Error>;

    async fn close(&self, conn: Self::Connection) {
        drop(conn);
    }

    /// Human-readable target for logs. Must not contain credentials.
    fn describe(&self) -> String;
}

/// PostgreSQL connector built from a connection string.
#[derive(Debug, Clone)]
pub struct PgConnector {
    options: PgConnectOptions,
    connect_timeout: Duration,
}

impl PgConnector {
    pub fn from_config(config: &DbConfig) -> Result<Self, StoreError> {
        let url = config.url.as_deref().ok_or(StoreError::MissingUrl)?;

        let ssl_mode = PgSslMode::from_str(&config.ssl_mode)
            .map_err(|e| StoreError::InvalidConfig(format!("ssl_mode: {}", e)))?;

        let options = PgConnectOptions::from_str(url)
            .map_err(|e| StoreError::InvalidConfig(format!("connection string: {}", e)))?
            .ssl_mode(ssl_mode)
            .application_name("biblot")
            .options(keepalive_settings(config));

        Ok(Self {
            options,
            connect_timeout: config.connect_timeout(),
        })
    }
}

/// Session settings for TCP keepalive. sqlx has no client-side socket
/// options, so the server is asked to probe the connection instead.
fn keepalive_settings(config: &DbConfig) -> [(&'static str, String); 3] {
    [
        ("tcp_keepalives_idle", config.keepalives_idle_secs.to_string()),
        (
            "tcp_keepalives_interval",
            config.keepalives_interval_secs.to_string(),
        ),
        ("tcp_keepalives_count", config.keepalives_count.to_string()),
    ]
}

#[async_trait]
impl Connect for PgConnector {
    type Connection = PgConnection;

    async fn open(&self) -> Result<PgConnection, sqlx::Error> {
        match tokio::time::timeout(self.connect_timeout, self.options.connect()).await {
            Ok(result) => result,
            Err(_) => Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("connect timed out after {:?}", self.connect_timeout),
            ))),
        }
    }

    async fn probe(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(conn).await.map(|_| ())
    }

    async fn init_schema(&self, conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        migrate::init_schema(conn).await
    }

    async fn close(&self, conn: PgConnection) {
        if let Err(e) = conn.close().await {
            warn!(error = %e, "error while closing database connection");
        }
    }

    fn describe(&self) -> String {
        format!(
            "{}:{}/{}",
            self.options.get_host(),
            self.options.get_port(),
            self.options.get_database().unwrap_or("postgres")
        )
    }
}

/// Fixed-delay bounded retry for [`ConnectionManager::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &DbConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    /// Retries were exhausted; no automatic recovery.
    Failed,
}

pub struct ConnectionManager<C: Connect = PgConnector> {
    connector: C,
    policy: RetryPolicy,
    conn: Option<C::Connection>,
    state: ConnectionState,
}

impl ConnectionManager<PgConnector> {
    /// Build a PostgreSQL manager from config and connect it.
    pub async fn connect_with_config(config: &DbConfig) -> Result<Self, StoreError> {
        let connector = PgConnector::from_config(config)?;
        let mut manager = Self::new(connector, RetryPolicy::from_config(config));
        manager.connect().await?;
        Ok(manager)
    }
}

impl<C: Connect> ConnectionManager<C> {
    /// Create a manager without connecting.
    pub fn new(connector: C, policy: RetryPolicy) -> Self {
        Self {
            connector,
            policy,
            conn: None,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Open a connection, retrying transient failures up to the policy bound,
    /// then initialize the schema. Any held connection is discarded first.
    pub async fn connect(&mut self) -> Result<(), StoreError> {
        self.discard().await;

        let target = self.connector.describe();
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;

        let mut conn = loop {
            attempt += 1;
            info!(attempt, max_attempts, %target, "connecting to database");

            match self.connector.open().await {
                Ok(conn) => break conn,
                Err(e) if !is_transient(&e) || attempt >= max_attempts => {
                    error!(attempt, error = %e, "giving up on database connection");
                    self.state = ConnectionState::Failed;
                    return Err(StoreError::Connection {
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(attempt, error = %e, delay = ?self.policy.delay, "database connection failed, retrying");
                    tokio::time::sleep(self.policy.delay).await;
                }
            }
        };

        if let Err(e) = self.connector.init_schema(&mut conn).await {
            error!(error = %e, "schema initialization failed");
            self.connector.close(conn).await;
            return Err(StoreError::from(e));
        }

        info!(%target, "database connection established");
        self.conn = Some(conn);
        self.state = ConnectionState::Connected;
        Ok(())
    }

    /// Return a connection known to answer a probe, reconnecting if needed.
    pub async fn ensure_live(&mut self) -> Result<&mut C::Connection, StoreError> {
        if self.state == ConnectionState::Failed {
            return Err(StoreError::Unavailable);
        }

        let healthy = match self.conn.as_mut() {
            Some(conn) => match self.connector.probe(conn).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "liveness probe failed, reconnecting");
                    false
                }
            },
            None => {
                debug!("no open connection, reconnecting");
                false
            }
        };

        if !healthy {
            self.connect().await?;
        }

        self.conn.as_mut().ok_or(StoreError::Unavailable)
    }

    /// Close the held connection, if any.
    pub async fn close(&mut self) {
        self.discard().await;
        info!("database connection closed");
    }

    async fn discard(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.connector.close(conn).await;
        }
        self.state = ConnectionState::Disconnected;
    }
}

/// Errors worth another connect attempt. Bad configuration never heals.
pub fn is_transient(err: &sqlx::Error) -> bool {
    !matches!(err, sqlx::Error::Configuration(_) | sqlx::Error::Tls(_))
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;

/// Root configuration for the ingestion service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Database credentials. Only ever read from the environment.
    #[serde(skip)]
    pub database: DatabaseConfig,

    /// Worker pool sizing.
    pub pool: PoolConfig,

    /// Startup connection retry policy.
    pub startup: RetryConfig,

    /// HTTP request handling.
    pub http: HttpConfig,

    /// Transaction semantics for report ingestion.
    pub ingest: IngestConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host name or IP to bind.
    pub host: String,

    /// TCP port to bind.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8003,
        }
    }
}

/// PostgreSQL connection settings.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub name: String,
    pub user: String,
    pub host: String,
    pub password: String,
    pub port: u16,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("name", &self.name)
            .field("user", &self.user)
            .field("host", &self.host)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .finish()
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Workers per available CPU.
    pub multiplier: usize,

    /// Exact worker count, overriding the CPU based size.
    pub workers: Option<usize>,
}

impl PoolConfig {
    /// Number of workers (and database sessions, and queue slots).
    pub fn worker_count(&self) -> usize {
        if let Some(workers) = self.workers {
            return workers;
        }
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        cpus.saturating_mul(self.multiplier)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            multiplier: 1,
            workers: None,
        }
    }
}

/// Retry configuration for startup connectivity.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay between attempts in milliseconds.
    pub delay_ms: u64,

    /// Give up after this many attempts; absent means never.
    pub max_attempts: Option<u32>,

    /// Double the delay after every attempt.
    pub exponential: bool,

    /// Upper bound for exponential delays in milliseconds.
    pub max_delay_ms: u64,

    /// Add up to 10% random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay_ms: 5000,
            max_attempts: None,
            exponential: false,
            max_delay_ms: 60_000,
            jitter: false,
        }
    }
}

/// HTTP handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Largest accepted POST body in bytes.
    pub max_body_bytes: usize,

    /// Serve more than one request per connection.
    pub keep_alive: bool,

    /// After shutdown, how long an open connection may take to finish before
    /// it is asked to close, and again before it is dropped.
    pub drain_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
            keep_alive: false,
            drain_timeout_ms: 1000,
        }
    }
}

/// What happens to earlier rows of a request when a later segment fails.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommitPolicy {
    /// Commit whatever was inserted before the failure.
    #[default]
    Partial,
    /// Roll the whole request back.
    Atomic,
}

/// Ingestion configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IngestConfig {
    pub commit_policy: CommitPolicy,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "segment_datastore=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

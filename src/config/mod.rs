//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → environment overlay (database credentials, pool multiplier)
//!     → command line address
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All file sections have defaults to allow minimal configs
//! - Credentials never come from the file and never appear in `Debug` output

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    CommitPolicy, DatabaseConfig, HttpConfig, IngestConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, PoolConfig, RetryConfig, ServiceConfig,
};

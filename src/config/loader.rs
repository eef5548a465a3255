//! Configuration loading from file, environment and command line.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{DatabaseConfig, ListenerConfig, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_DB_NAME: &str = "POSTGRES_DB";
pub const ENV_DB_USER: &str = "POSTGRES_USER";
pub const ENV_DB_HOST: &str = "POSTGRES_HOST";
pub const ENV_DB_PASSWORD: &str = "POSTGRES_PASSWORD";
pub const ENV_DB_PORT: &str = "POSTGRES_PORT";
pub const ENV_POOL_MULTIPLIER: &str = "THREAD_POOL_MULTIPLIER";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid value {value:?} for environment variable {name}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("bad address {0:?}, expected host:port")]
    InvalidAddress(String),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, overlay and validate the full service configuration.
///
/// The optional TOML file provides tuning; database credentials and the pool
/// multiplier come from the process environment; the bind address comes from
/// the command line.
pub fn load_config(path: Option<&Path>, address: &str) -> Result<ServiceConfig, ConfigError> {
    load_config_with(path, address, |name| std::env::var(name).ok())
}

/// Same as [`load_config`] with an explicit environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, address: &str, env: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    config.listener = parse_address(address)?;
    config.database = database_from_env(&env)?;
    if let Some(value) = env(ENV_POOL_MULTIPLIER) {
        config.pool.multiplier = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv {
                name: ENV_POOL_MULTIPLIER,
                value,
            })?;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Read every required database variable.
pub fn database_from_env<F>(env: &F) -> Result<DatabaseConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |name: &'static str| env(name).ok_or(ConfigError::MissingEnv(name));

    let port_raw = required(ENV_DB_PORT)?;
    let port = port_raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name: ENV_DB_PORT,
        value: port_raw.clone(),
    })?;

    Ok(DatabaseConfig {
        name: required(ENV_DB_NAME)?,
        user: required(ENV_DB_USER)?,
        host: required(ENV_DB_HOST)?,
        password: required(ENV_DB_PASSWORD)?,
        port,
    })
}

/// Parse the positional `host:port` argument.
///
/// Anything up to the last `/` is ignored, so `http://localhost:8003` and
/// `localhost:8003` bind the same address. IPv6 hosts may be bracketed.
pub fn parse_address(raw: &str) -> Result<ListenerConfig, ConfigError> {
    let invalid = || ConfigError::InvalidAddress(raw.to_string());

    let tail = raw.rsplit('/').next().unwrap_or(raw);
    let (host, port) = tail.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port.parse().map_err(|_| invalid())?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(invalid());
    }

    Ok(ListenerConfig {
        host: host.to_string(),
        port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_DB_NAME, "datastore"),
            (ENV_DB_USER, "ingest"),
            (ENV_DB_HOST, "db.internal"),
            (ENV_DB_PASSWORD, "secret"),
            (ENV_DB_PORT, "5432"),
        ]
    }

    #[test]
    fn parses_plain_and_prefixed_addresses() {
        let plain = parse_address("localhost:8003").unwrap();
        assert_eq!(plain.host, "localhost");
        assert_eq!(plain.port, 8003);

        let prefixed = parse_address("http://0.0.0.0:8080").unwrap();
        assert_eq!(prefixed.host, "0.0.0.0");
        assert_eq!(prefixed.port, 8080);

        let v6 = parse_address("[::1]:9000").unwrap();
        assert_eq!(v6.host, "::1");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for raw in ["localhost", "localhost:http", ":8003", "host:70000", ""] {
            assert!(
                matches!(parse_address(raw), Err(ConfigError::InvalidAddress(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn loads_database_from_environment() {
        let config = load_config_with(None, "127.0.0.1:8003", env_from(&full_env())).unwrap();
        assert_eq!(config.database.name, "datastore");
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.pool.multiplier, 1);
    }

    #[test]
    fn each_database_variable_is_required() {
        for missing in [ENV_DB_NAME, ENV_DB_USER, ENV_DB_HOST, ENV_DB_PASSWORD, ENV_DB_PORT] {
            let pairs: Vec<_> = full_env().into_iter().filter(|(k, _)| *k != missing).collect();
            let err = load_config_with(None, "127.0.0.1:8003", env_from(&pairs)).unwrap_err();
            assert!(
                matches!(err, ConfigError::MissingEnv(name) if name == missing),
                "expected {missing} to be reported, got {err}"
            );
        }
    }

    #[test]
    fn multiplier_comes_from_environment() {
        let mut pairs = full_env();
        pairs.push((ENV_POOL_MULTIPLIER, "3"));
        let config = load_config_with(None, "127.0.0.1:8003", env_from(&pairs)).unwrap();
        assert_eq!(config.pool.multiplier, 3);

        let mut pairs = full_env();
        pairs.push((ENV_POOL_MULTIPLIER, "many"));
        let err = load_config_with(None, "127.0.0.1:8003", env_from(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: ENV_POOL_MULTIPLIER, .. }));
    }

    #[test]
    fn file_settings_are_kept_under_environment_overlay() {
        let path = std::env::temp_dir().join(format!("segment-datastore-{}.toml", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[pool]\nworkers = 4\n\n[http]\nmax_body_bytes = 1024").unwrap();

        let config = load_config_with(Some(&path), "127.0.0.1:8003", env_from(&full_env())).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.pool.workers, Some(4));
        assert_eq!(config.http.max_body_bytes, 1024);
        assert_eq!(config.database.user, "ingest");
    }
}

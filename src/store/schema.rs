//! Schema bootstrap.
//!
//! Runs once before the service starts. Connecting follows the configured
//! retry policy (unbounded by default); the existence check and the table
//! creation are both fatal on failure.

use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};
use thiserror::Error;

use crate::observability::metrics;
use crate::resilience::{retry, RetryPolicy};
use crate::store::SEGMENTS_TABLE;

const TABLE_EXISTS_SQL: &str =
    "select exists(select relname from pg_class where relname = $1 and relkind = 'r')";

const CREATE_STATEMENTS: &[&str] = &[
    "CREATE TABLE segments(segment_id bigint, prev_segment_id bigint, mode text, \
     start_time integer, start_time_dow smallint, start_time_hour smallint, \
     end_time integer, length integer, speed float, provider text)",
    "CREATE INDEX index_segment ON segments (segment_id)",
    "CREATE INDEX index_id_range ON segments (segment_id, start_time, end_time)",
];

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("could not connect to database after {attempts} attempts: {source}")]
    Connect {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("can't check for tables: {0}")]
    ExistenceCheck(#[source] sqlx::Error),

    #[error("can't create tables: {0}")]
    Create(#[source] sqlx::Error),
}

/// Outcome of a successful bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    Created,
    AlreadyPresent,
}

/// Connect (retrying per `policy`) and make sure the segments table exists.
pub async fn bootstrap_schema(
    options: &PgConnectOptions,
    policy: &RetryPolicy,
) -> Result<SchemaStatus, BootstrapError> {
    let mut conn = connect_with_retry(options, policy).await?;

    let status = ensure_segments_table(&mut conn).await?;

    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "Bootstrap connection did not close cleanly");
    }
    Ok(status)
}

async fn connect_with_retry(
    options: &PgConnectOptions,
    policy: &RetryPolicy,
) -> Result<PgConnection, BootstrapError> {
    let mut attempts = 0;
    let connected = retry(policy, "database connect", || {
        attempts += 1;
        metrics::record_bootstrap_attempt();
        PgConnection::connect_with(options)
    })
    .await;
    connected.map_err(|source| BootstrapError::Connect { attempts, source })
}

/// Create the table and its indexes unless the table is already there.
pub async fn ensure_segments_table(conn: &mut PgConnection) -> Result<SchemaStatus, BootstrapError> {
    let exists: bool = sqlx::query_scalar(TABLE_EXISTS_SQL)
        .bind(SEGMENTS_TABLE)
        .fetch_one(&mut *conn)
        .await
        .map_err(BootstrapError::ExistenceCheck)?;

    if exists {
        tracing::info!(table = SEGMENTS_TABLE, "Table already present");
        return Ok(SchemaStatus::AlreadyPresent);
    }

    tracing::info!(table = SEGMENTS_TABLE, "Creating table and indexes");
    let mut tx = conn.begin().await.map_err(BootstrapError::Create)?;
    for statement in CREATE_STATEMENTS {
        sqlx::query(*statement)
            .execute(&mut *tx)
            .await
            .map_err(BootstrapError::Create)?;
    }
    tx.commit().await.map_err(BootstrapError::Create)?;
    tracing::info!(table = SEGMENTS_TABLE, "Schema created");

    Ok(SchemaStatus::Created)
}

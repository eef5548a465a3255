//! Worker-owned PostgreSQL session.
//!
//! # Responsibilities
//! - Open the connection a worker keeps for its whole life
//! - Ensure the insert statement is prepared once per connection
//! - Execute inserts positionally and manage the request transaction

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgStatement};
use sqlx::{Connection, Executor, PgConnection, Statement};

use crate::config::DatabaseConfig;
use crate::ingest::PersistedRow;
use crate::store::{SegmentStore, SessionConnector, StoreError};

/// Positional insert into the segments table.
pub const INSERT_SQL: &str = "INSERT INTO segments (segment_id,prev_segment_id,mode,\
    start_time,start_time_dow,start_time_hour,end_time,length,speed,provider) \
    VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)";

/// One connection and its prepared insert, owned by a single worker.
pub struct WorkerSession {
    worker: usize,
    conn: PgConnection,
    insert: Option<PgStatement<'static>>,
    in_transaction: bool,
}

impl WorkerSession {
    /// Connect and prepare the insert statement.
    ///
    /// Any failure here is fatal for the worker; sessions are not
    /// re-established later.
    pub async fn connect(worker: usize, options: &PgConnectOptions) -> Result<Self, StoreError> {
        let conn = PgConnection::connect_with(options).await?;
        tracing::info!(worker, "Connected to database");

        let mut session = Self {
            worker,
            conn,
            insert: None,
            in_transaction: false,
        };
        session.ensure_insert_statement().await?;
        Ok(session)
    }

    /// Prepare the insert unless this session already holds it.
    pub async fn ensure_insert_statement(&mut self) -> Result<(), StoreError> {
        if self.insert.is_some() {
            return Ok(());
        }

        let statement = (&mut self.conn).prepare(INSERT_SQL).await?;
        self.insert = Some(statement);
        tracing::debug!(worker = self.worker, "Prepared insert statement");
        Ok(())
    }

    pub fn worker(&self) -> usize {
        self.worker
    }

    async fn finish(&mut self, sql: &'static str) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        sqlx::query(sql).execute(&mut self.conn).await?;
        Ok(())
    }
}

#[async_trait]
impl SegmentStore for WorkerSession {
    async fn insert(&mut self, row: &PersistedRow) -> Result<(), StoreError> {
        if !self.in_transaction {
            sqlx::query("BEGIN").execute(&mut self.conn).await?;
            self.in_transaction = true;
        }

        let statement = self.insert.as_ref().ok_or(StoreError::StatementMissing)?;
        statement
            .query()
            .bind(row.segment_id)
            .bind(row.prev_segment_id)
            .bind(row.mode.clone())
            .bind(row.start_time)
            .bind(row.start_time_dow)
            .bind(row.start_time_hour)
            .bind(row.end_time)
            .bind(row.length)
            .bind(row.speed)
            .bind(row.provider.clone())
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.finish("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.finish("ROLLBACK").await
    }
}

/// Connects worker sessions with the credentials from the environment.
#[derive(Debug, Clone)]
pub struct PgSessionConnector {
    options: PgConnectOptions,
}

impl PgSessionConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            options: config.connect_options(),
        }
    }
}

#[async_trait]
impl SessionConnector for PgSessionConnector {
    type Session = WorkerSession;

    async fn connect(&self, worker: usize) -> Result<WorkerSession, StoreError> {
        WorkerSession::connect(worker, &self.options).await
    }
}

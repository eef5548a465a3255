//! Service assembly.
//!
//! # Startup Order
//! ```text
//! bind listener → connect N sessions (WorkerPool::start) → spawn acceptor
//! ```
//!
//! Binding first means a taken port fails fast without opening sessions.
//! Schema bootstrap is not part of `start`; it runs once beforehand.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::ServiceConfig;
use crate::http::IngestHandler;
use crate::lifecycle::shutdown::Shutdown;
use crate::net::{run_acceptor, Listener, ListenerError};
use crate::pool::WorkerPool;
use crate::store::{SessionConnector, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("Failed to open worker sessions: {0}")]
    Session(#[from] StoreError),
}

/// A configured, not yet started, ingestion service.
pub struct IngestService<C> {
    config: ServiceConfig,
    connector: C,
}

impl<C: SessionConnector> IngestService<C> {
    pub fn new(config: ServiceConfig, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Bind the configured address and start serving.
    pub async fn start(self) -> Result<RunningService, ServiceError> {
        let listener = Listener::bind(&self.config.listener).await?;
        self.start_on(listener).await
    }

    /// Start serving on an already bound listener.
    pub async fn start_on(self, listener: Listener) -> Result<RunningService, ServiceError> {
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        let handler = Arc::new(IngestHandler::new(&self.config.http, &self.config.ingest));
        let shutdown = Shutdown::new();
        let pool = WorkerPool::start(&self.connector, self.config.pool.worker_count(), handler, &shutdown).await?;

        let acceptor = tokio::spawn(run_acceptor(listener, pool.queue(), shutdown.subscribe()));

        tracing::info!(
            address = %local_addr,
            workers = pool.size(),
            commit_policy = ?self.config.ingest.commit_policy,
            keep_alive = self.config.http.keep_alive,
            "Service started"
        );

        Ok(RunningService {
            local_addr,
            shutdown,
            acceptor,
            pool,
        })
    }
}

/// Handle to a started service.
pub struct RunningService {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    acceptor: JoinHandle<()>,
    pool: WorkerPool,
}

impl RunningService {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    /// Stop accepting, let workers finish queued connections, then return.
    ///
    /// Connections that stay open are closed after `http.drain_timeout_ms`
    /// (twice that for a client that ignores the close).
    pub async fn stop(self) {
        self.shutdown.trigger();
        if let Err(e) = self.acceptor.await {
            tracing::error!(error = %e, "Acceptor task failed");
        }
        self.pool.shutdown().await;
        tracing::info!("Service stopped");
    }
}

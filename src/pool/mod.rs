//! Bounded worker pool.
//!
//! # Data Flow
//! ```text
//! acceptor ──submit──▶ queue.rs (bounded, capacity = workers)
//!                          │
//!          ┌───────────────┼───────────────┐
//!          ▼               ▼               ▼
//!      worker 0        worker 1   ...  worker N-1     (worker.rs)
//!      session 0       session 1       session N-1    (store::SessionConnector)
//! ```
//!
//! # Design Decisions
//! - Every session is connected before the pool reports itself started;
//!   one failed connection fails the whole start
//! - Workers never exchange sessions; the number of database sessions is
//!   exactly the number of workers
//! - Closing the queue (dropping every `JobQueue`) drains and stops workers
//! - Shutdown bounds how long an open connection can keep its worker busy

pub mod queue;
mod worker;

use std::sync::Arc;

use futures_util::future::try_join_all;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::http::IngestHandler;
use crate::lifecycle::Shutdown;
use crate::store::{SessionConnector, StoreError};

pub use queue::JobQueue;

pub struct WorkerPool {
    queue: JobQueue,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Connect `size` sessions and spawn one worker per session.
    ///
    /// After `shutdown` fires, connections still being served are drained
    /// and then closed so that `shutdown()` below cannot wait forever.
    pub async fn start<C>(
        connector: &C,
        size: usize,
        handler: Arc<IngestHandler>,
        shutdown: &Shutdown,
    ) -> Result<Self, StoreError>
    where
        C: SessionConnector,
    {
        let size = size.max(1);
        let sessions = try_join_all((0..size).map(|worker| connector.connect(worker))).await?;
        tracing::info!(workers = size, "Worker sessions established");

        let (queue, rx) = JobQueue::bounded(size);
        let rx = Arc::new(Mutex::new(rx));

        let workers = sessions
            .into_iter()
            .enumerate()
            .map(|(id, session)| {
                tokio::spawn(worker::run(
                    id,
                    session,
                    Arc::clone(&rx),
                    Arc::clone(&handler),
                    shutdown.clone(),
                ))
            })
            .collect();

        Ok(Self { queue, workers })
    }

    /// A handle for submitting accepted connections.
    pub fn queue(&self) -> JobQueue {
        self.queue.clone()
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Close the pool's own queue handle and wait for every worker.
    ///
    /// Workers only stop once all other `JobQueue` clones are dropped too.
    pub async fn shutdown(self) {
        drop(self.queue);
        for (id, handle) in self.workers.into_iter().enumerate() {
            if let Err(e) = handle.await {
                tracing::error!(worker = id, error = %e, "Worker task failed");
            }
        }
        tracing::info!("Worker pool stopped");
    }
}

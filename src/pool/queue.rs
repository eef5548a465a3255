//! Bounded hand-off between the acceptor and the workers.

use tokio::sync::mpsc;

use crate::net::connection::Job;
use crate::observability::metrics;

/// Sending half of the job queue.
///
/// Capacity equals the worker count. `submit` waits while the queue is full,
/// which is what slows the acceptor down under load.
#[derive(Debug, Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<Job>,
}

impl JobQueue {
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Job>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Enqueue a connection, waiting for a free slot.
    ///
    /// Returns the job back if every worker has gone away.
    pub async fn submit(&self, job: Job) -> Result<(), Job> {
        self.tx.send(job).await.map_err(|e| e.0)?;
        metrics::set_queue_depth(self.depth());
        Ok(())
    }

    /// Connections currently waiting for a worker.
    pub fn depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

/// Refresh the depth gauge from the receiving side after a dequeue.
pub(crate) fn record_dequeue(rx: &mpsc::Receiver<Job>) -> usize {
    let depth = rx.len();
    metrics::set_queue_depth(depth);
    depth
}

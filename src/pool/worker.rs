//! Worker loop: take the next queued connection, serve it with this
//! worker's session, repeat until the queue closes.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::http::IngestHandler;
use crate::lifecycle::Shutdown;
use crate::net::connection::Job;
use crate::pool::queue;
use crate::store::SegmentStore;

pub(crate) type SharedReceiver = Arc<Mutex<mpsc::Receiver<Job>>>;

pub(crate) async fn run<S>(
    worker: usize,
    session: S,
    jobs: SharedReceiver,
    handler: Arc<IngestHandler>,
    shutdown: Shutdown,
)
where
    S: SegmentStore + 'static,
{
    // Only connections served by this worker ever lock it.
    let session = Arc::new(Mutex::new(session));
    tracing::debug!(worker, "Worker ready");

    loop {
        let next = {
            let mut jobs = jobs.lock().await;
            let next = jobs.recv().await;
            queue::record_dequeue(&jobs);
            next
        };
        let Some(job) = next else {
            break;
        };

        tracing::debug!(
            worker,
            connection_id = %job.id,
            peer_addr = %job.peer,
            queued_for = ?job.waited(),
            "Serving connection"
        );
        handler.serve(job, Arc::clone(&session), shutdown.subscribe()).await;
    }

    tracing::debug!(worker, "Worker stopped");
}

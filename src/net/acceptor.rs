//! Accept loop.
//!
//! Accepts connections and submits them to the worker queue. While the queue
//! is full the loop is parked in `submit`, so no further `accept` happens and
//! new clients wait in the kernel backlog.

use std::time::Duration;

use crate::lifecycle::ShutdownSignal;
use crate::net::connection::Job;
use crate::net::listener::Listener;
use crate::observability::metrics;
use crate::pool::JobQueue;

/// Pause after a failed accept. Persistent failures such as EMFILE would
/// otherwise spin the loop.
pub const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(100);

/// Run until shutdown is signalled or the workers go away.
///
/// Accept errors are logged and skipped; they never stop the service.
pub async fn run_acceptor(listener: Listener, queue: JobQueue, mut shutdown: ShutdownSignal) {
    loop {
        let accepted = tokio::select! {
            _ = shutdown.recv() => break,
            accepted = listener.accept() => accepted,
        };

        let (stream, peer) = match accepted {
            Ok(accepted) => accepted,
            Err(e) => {
                tracing::warn!(error = %e, "Accept failed");
                metrics::record_accept_error();
                if pause_after_error(&mut shutdown).await {
                    break;
                }
                continue;
            }
        };

        let job = Job::new(stream, peer);
        tracing::trace!(connection_id = %job.id, depth = queue.depth(), "Submitting connection");

        let submitted = tokio::select! {
            _ = shutdown.recv() => break,
            submitted = queue.submit(job) => submitted,
        };
        if let Err(job) = submitted {
            tracing::error!(connection_id = %job.id, "Worker queue closed, stopping acceptor");
            break;
        }
    }

    tracing::info!("Acceptor stopped");
}

/// Sleep for [`ACCEPT_ERROR_PAUSE`]. Returns true if shutdown arrived first.
async fn pause_after_error(shutdown: &mut ShutdownSignal) -> bool {
    tokio::select! {
        _ = shutdown.recv() => true,
        _ = tokio::time::sleep(ACCEPT_ERROR_PAUSE) => false,
    }
}

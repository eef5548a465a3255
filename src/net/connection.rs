//! Accepted connections waiting for, or held by, a worker.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Carry the accepted stream from the acceptor to a worker

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One accepted TCP connection queued for a worker.
#[derive(Debug)]
pub struct Job {
    pub id: ConnectionId,
    pub stream: TcpStream,
    pub peer: SocketAddr,
    accepted_at: Instant,
}

impl Job {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            id: ConnectionId::new(),
            stream,
            peer,
            accepted_at: Instant::now(),
        }
    }

    /// Time spent between accept and now (queueing delay when a worker
    /// picks the job up).
    pub fn waited(&self) -> Duration {
        self.accepted_at.elapsed()
    }
}

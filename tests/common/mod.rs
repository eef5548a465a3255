//! Shared utilities for integration testing.
//!
//! The service runs against an in-memory `SessionConnector`, so these tests
//! exercise the real listener, queue, workers and HTTP stack without a
//! database.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use segment_datastore::config::{ListenerConfig, ServiceConfig};
use segment_datastore::ingest::PersistedRow;
use segment_datastore::lifecycle::{IngestService, RunningService};
use segment_datastore::store::{SegmentStore, SessionConnector, StoreError};

/// Hands out `MemoryStore`s that commit into one shared table.
#[derive(Clone, Default)]
pub struct MemoryConnector {
    pub committed: Arc<Mutex<Vec<PersistedRow>>>,
    pub sessions: Arc<AtomicUsize>,
    pub insert_delay: Option<Duration>,
    pub fail_segment_id: Option<i64>,
}

impl MemoryConnector {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            insert_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing_on(segment_id: i64) -> Self {
        Self {
            fail_segment_id: Some(segment_id),
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<PersistedRow> {
        self.committed.lock().unwrap().clone()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionConnector for MemoryConnector {
    type Session = MemoryStore;

    async fn connect(&self, _worker: usize) -> Result<MemoryStore, StoreError> {
        self.sessions.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryStore {
            pending: Vec::new(),
            committed: Arc::clone(&self.committed),
            insert_delay: self.insert_delay,
            fail_segment_id: self.fail_segment_id,
        })
    }
}

pub struct MemoryStore {
    pending: Vec<PersistedRow>,
    committed: Arc<Mutex<Vec<PersistedRow>>>,
    insert_delay: Option<Duration>,
    fail_segment_id: Option<i64>,
}

#[async_trait]
impl SegmentStore for MemoryStore {
    async fn insert(&mut self, row: &PersistedRow) -> Result<(), StoreError> {
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_segment_id == Some(row.segment_id) {
            return Err(StoreError::StatementMissing);
        }
        self.pending.push(row.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.committed.lock().unwrap().append(&mut self.pending);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.pending.clear();
        Ok(())
    }
}

/// Default configuration bound to an ephemeral local port.
pub fn local_config(workers: usize) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener = ListenerConfig {
        host: "127.0.0.1".into(),
        port: 0,
    };
    config.pool.workers = Some(workers);
    config
}

pub async fn start_service(connector: MemoryConnector, workers: usize) -> RunningService {
    start_with_config(connector, local_config(workers)).await
}

pub async fn start_with_config(connector: MemoryConnector, config: ServiceConfig) -> RunningService {
    IngestService::new(config, connector)
        .start()
        .await
        .expect("service should start")
}

pub fn store_url(service: &RunningService) -> String {
    format!("http://{}/store", service.local_addr())
}

/// The four segment report used throughout the tests.
pub fn reference_report() -> Value {
    json!({
        "provider": 123456,
        "mode": "auto",
        "segments": [
            {"segment_id": 345678, "prev_segment_id": 356789, "start_time": 98765, "end_time": 98777, "length": 555},
            {"segment_id": 345780, "start_time": 98767, "end_time": 98779, "length": 678},
            {"segment_id": 345795, "prev_segment_id": 656784, "start_time": 98725, "end_time": 98778, "length": 479},
            {"segment_id": 545678, "prev_segment_id": 556789, "start_time": 98735, "end_time": 98747, "length": 1234}
        ]
    })
}

/// A one-segment report with a distinct segment id.
pub fn single_segment_report(segment_id: i64) -> Value {
    json!({
        "provider": "load",
        "mode": "auto",
        "segments": [
            {"segment_id": segment_id, "start_time": 1000, "end_time": 1010, "length": 100}
        ]
    })
}

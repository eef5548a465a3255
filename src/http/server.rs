//! Per-connection HTTP serving.
//!
//! # Responsibilities
//! - Drive one accepted connection through hyper's HTTP/1 state machine
//! - Wrap the handler in request ID and tracing middleware
//! - Parse, process and answer each request using the worker's session
//!
//! # Design Decisions
//! - Keep-alive is off by default: one request per connection
//! - Errors never escape `handle`; every outcome becomes a JSON response
//! - The session is owned by the worker; connections borrow it through a lock
//!   only that worker's connections ever take

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::{HttpConfig, IngestConfig};
use crate::http::request::RequestParser;
use crate::http::response;
use crate::ingest::SegmentReportProcessor;
use crate::lifecycle::ShutdownSignal;
use crate::net::connection::Job;
use crate::observability::metrics;
use crate::store::SegmentStore;

/// Shared by every worker; holds no per-connection state.
#[derive(Debug, Clone)]
pub struct IngestHandler {
    parser: RequestParser,
    processor: SegmentReportProcessor,
    keep_alive: bool,
    drain_timeout: Duration,
}

impl IngestHandler {
    pub fn new(http: &HttpConfig, ingest: &IngestConfig) -> Self {
        Self {
            parser: RequestParser::new(http.max_body_bytes),
            processor: SegmentReportProcessor::new(ingest.commit_policy),
            keep_alive: http.keep_alive,
            drain_timeout: Duration::from_millis(http.drain_timeout_ms),
        }
    }

    /// Answer one request against `store`.
    pub async fn handle<S>(&self, request: Request<Body>, store: &mut S) -> Response<Body>
    where
        S: SegmentStore + ?Sized,
    {
        let start = Instant::now();
        let method = request.method().clone();

        let result = match self.parser.parse(request).await {
            Ok(document) => self.processor.process(&document, store).await,
            Err(e) => Err(e),
        };

        let response = match result {
            Ok(outcome) => {
                tracing::info!(rows = outcome.rows_written, "Report stored");
                response::ok()
            }
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "Request rejected");
                response::error(&e)
            }
        };

        metrics::record_request(method.as_str(), response.status().as_u16(), start);
        response
    }

    /// Serve every request on an accepted connection until it closes.
    ///
    /// Once `shutdown` fires the connection gets `drain_timeout` to finish
    /// on its own, then is asked to close gracefully and gets the same time
    /// again before it is dropped. A client that never sends a request
    /// cannot hold the worker past shutdown.
    pub async fn serve<S>(self: &Arc<Self>, job: Job, session: Arc<Mutex<S>>, mut shutdown: ShutdownSignal)
    where
        S: SegmentStore + 'static,
    {
        let Job { id, stream, peer, .. } = job;

        let handler = Arc::clone(self);
        let inner = tower::service_fn(move |request: Request<Incoming>| {
            let handler = Arc::clone(&handler);
            let session = Arc::clone(&session);
            async move {
                let mut store = session.lock().await;
                let response = handler.handle(request.map(Body::new), &mut *store).await;
                Ok::<_, Infallible>(response)
            }
        });

        let service = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(move |request: &Request<Incoming>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    connection_id = %id,
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .service(inner);

        let mut builder = http1::Builder::new();
        builder.keep_alive(self.keep_alive);

        let connection = builder.serve_connection(TokioIo::new(stream), TowerToHyperService::new(service));
        let mut connection = std::pin::pin!(connection);

        let result = tokio::select! {
            result = connection.as_mut() => result,
            _ = shutdown.recv() => {
                match tokio::time::timeout(self.drain_timeout, connection.as_mut()).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::debug!(connection_id = %id, peer_addr = %peer, "Closing idle connection for shutdown");
                        connection.as_mut().graceful_shutdown();
                        match tokio::time::timeout(self.drain_timeout, connection.as_mut()).await {
                            Ok(result) => result,
                            Err(_) => {
                                tracing::warn!(connection_id = %id, peer_addr = %peer, "Dropping connection after drain timeout");
                                Ok(())
                            }
                        }
                    }
                }
            }
        };

        if let Err(e) = result {
            tracing::debug!(connection_id = %id, peer_addr = %peer, error = %e, "Connection closed with error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommitPolicy;
    use crate::ingest::PersistedRow;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use axum::http::{header::CONTENT_LENGTH, Method, StatusCode};

    #[derive(Default)]
    struct CountingStore {
        inserted: usize,
        commits: usize,
    }

    #[async_trait]
    impl SegmentStore for CountingStore {
        async fn insert(&mut self, _row: &PersistedRow) -> Result<(), StoreError> {
            self.inserted += 1;
            Ok(())
        }

        async fn commit(&mut self) -> Result<(), StoreError> {
            self.commits += 1;
            Ok(())
        }

        async fn rollback(&mut self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn handler() -> IngestHandler {
        IngestHandler::new(
            &HttpConfig::default(),
            &IngestConfig {
                commit_policy: CommitPolicy::Partial,
            },
        )
    }

    fn post(body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/store")
            .header(CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn stores_report() {
        let mut store = CountingStore::default();
        let response = handler()
            .handle(
                post(
                    r#"{"provider":"p","mode":"auto","segments":[
                        {"segment_id":1,"start_time":0,"end_time":10,"length":100}]}"#,
                ),
                &mut store,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(store.inserted, 1);
        assert_eq!(store.commits, 1);
    }

    #[tokio::test]
    async fn parse_failure_never_touches_store() {
        let mut store = CountingStore::default();
        let response = handler().handle(post("not json"), &mut store).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.inserted, 0);
        assert_eq!(store.commits, 0);
    }
}

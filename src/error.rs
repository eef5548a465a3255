//! Request-level error taxonomy.
//!
//! Every stage of request handling (path validation, document extraction,
//! report decoding, persistence) returns an [`IngestError`]. The HTTP layer
//! maps the kind to a status code and uses the `Display` text as the
//! client-visible message.

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::store::StoreError;

/// Actions accepted as the final path segment.
pub const ACTIONS: &[&str] = &["store"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Try a url that looks like /action?query_string")]
    MalformedPath,

    #[error("Try a valid action: {:?}", ACTIONS)]
    UnknownAction { action: String },

    #[error("No json provided")]
    MissingJson,

    #[error("Content-Length header required")]
    MissingContentLength,

    #[error("Invalid Content-Length header: {0}")]
    InvalidContentLength(String),

    #[error("Request body of {length} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { length: usize, limit: usize },

    #[error("Failed to read request body: {0}")]
    BodyRead(String),

    #[error("Invalid json: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid field `{field}`: expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("segment {index}: {source}")]
    InvalidSegment {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("segment {index}: `{field}` value {value} is out of range")]
    OutOfRange {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("Unsupported method ({0})")]
    UnsupportedMethod(Method),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Status code reported to the client for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            IngestError::UnsupportedMethod(_) => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::MalformedPath | IngestError::UnknownAction { .. } => "path",
            IngestError::MissingJson
            | IngestError::MissingContentLength
            | IngestError::InvalidContentLength(_)
            | IngestError::BodyTooLarge { .. }
            | IngestError::BodyRead(_)
            | IngestError::InvalidJson(_) => "document",
            IngestError::MissingField(_)
            | IngestError::InvalidField { .. }
            | IngestError::InvalidSegment { .. }
            | IngestError::OutOfRange { .. } => "report",
            IngestError::UnsupportedMethod(_) => "method",
            IngestError::Store(_) => "store",
        }
    }
}

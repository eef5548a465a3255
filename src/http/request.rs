//! Request parsing.
//!
//! # Responsibilities
//! - Reject methods other than GET and POST
//! - Validate the action named by the last path segment
//! - Extract the JSON document from the `json` query parameter (GET) or
//!   from a `Content-Length` framed body (POST)
//!
//! # Design Decisions
//! - Every failure is an `IngestError` the client sees as text, never a panic
//! - The body limit is checked against `Content-Length` before reading

use axum::body::Body;
use axum::http::{header::CONTENT_LENGTH, HeaderMap, Method, Request};
use serde_json::Value;

use crate::error::{IngestError, ACTIONS};

#[derive(Debug, Clone)]
pub struct RequestParser {
    max_body_bytes: usize,
}

impl RequestParser {
    pub fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }

    /// Produce the request's JSON document.
    pub async fn parse(&self, request: Request<Body>) -> Result<Value, IngestError> {
        let (parts, body) = request.into_parts();

        if parts.method != Method::GET && parts.method != Method::POST {
            return Err(IngestError::UnsupportedMethod(parts.method));
        }
        validate_action(parts.uri.path())?;

        if parts.method == Method::GET {
            return document_from_query(parts.uri.query());
        }

        let length = content_length(&parts.headers)?;
        if length > self.max_body_bytes {
            return Err(IngestError::BodyTooLarge {
                length,
                limit: self.max_body_bytes,
            });
        }
        let bytes = axum::body::to_bytes(body, length)
            .await
            .map_err(|e| IngestError::BodyRead(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(IngestError::InvalidJson)
    }
}

/// Check the last path segment against the allowed actions.
pub fn validate_action(path: &str) -> Result<&str, IngestError> {
    if !path.starts_with('/') {
        return Err(IngestError::MalformedPath);
    }
    let action = path.rsplit('/').next().unwrap_or_default();
    if ACTIONS.contains(&action) {
        Ok(action)
    } else {
        Err(IngestError::UnknownAction {
            action: action.to_string(),
        })
    }
}

/// First non-empty `json` query parameter, URL-decoded and parsed.
pub fn document_from_query(query: Option<&str>) -> Result<Value, IngestError> {
    let query = query.unwrap_or_default();
    let raw = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == "json" && !value.is_empty())
        .map(|(_, value)| value)
        .ok_or(IngestError::MissingJson)?;
    serde_json::from_str(&raw).map_err(IngestError::InvalidJson)
}

fn content_length(headers: &HeaderMap) -> Result<usize, IngestError> {
    let value = headers
        .get(CONTENT_LENGTH)
        .ok_or(IngestError::MissingContentLength)?;
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| {
            IngestError::InvalidContentLength(String::from_utf8_lossy(value.as_bytes()).into_owned())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOC: &str = r#"{"provider":"p","mode":"auto","segments":[]}"#;

    fn parser() -> RequestParser {
        RequestParser::new(1024)
    }

    fn post(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn action_is_last_path_segment() {
        assert_eq!(validate_action("/store").unwrap(), "store");
        assert_eq!(validate_action("/v1/datastore/store").unwrap(), "store");
        assert!(matches!(
            validate_action("/store/"),
            Err(IngestError::UnknownAction { .. })
        ));
        assert!(matches!(
            validate_action("/query"),
            Err(IngestError::UnknownAction { ref action }) if action == "query"
        ));
        assert!(matches!(validate_action("*"), Err(IngestError::MalformedPath)));
    }

    #[test]
    fn query_document_is_url_decoded() {
        let doc = document_from_query(Some(
            "json=%7B%22provider%22%3A1%2C%22mode%22%3A%22auto%22%2C%22segments%22%3A%5B%5D%7D",
        ))
        .unwrap();
        assert_eq!(doc, json!({"provider": 1, "mode": "auto", "segments": []}));
    }

    #[test]
    fn missing_or_empty_json_parameter() {
        for query in [None, Some(""), Some("other=1"), Some("json=")] {
            assert!(matches!(document_from_query(query), Err(IngestError::MissingJson)));
        }
    }

    #[test]
    fn unparsable_query_document() {
        let err = document_from_query(Some("json=%7Bnope")).unwrap_err();
        assert!(err.to_string().starts_with("Invalid json: "));
    }

    #[tokio::test]
    async fn get_and_post_yield_same_document() {
        let get = Request::builder()
            .uri(format!("/store?json={}", urlencode(DOC)))
            .body(Body::empty())
            .unwrap();
        let from_get = parser().parse(get).await.unwrap();
        let from_post = parser().parse(post("/store", DOC)).await.unwrap();
        assert_eq!(from_get, from_post);
    }

    #[tokio::test]
    async fn post_requires_content_length() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/store")
            .body(Body::from(DOC))
            .unwrap();
        let err = parser().parse(request).await.unwrap_err();
        assert!(matches!(err, IngestError::MissingContentLength));
    }

    #[tokio::test]
    async fn post_body_limit_is_enforced() {
        let err = RequestParser::new(8).parse(post("/store", DOC)).await.unwrap_err();
        assert!(matches!(err, IngestError::BodyTooLarge { limit: 8, .. }));
    }

    #[tokio::test]
    async fn post_with_bad_action_is_rejected_before_reading() {
        let err = parser().parse(post("/fetch", DOC)).await.unwrap_err();
        assert_eq!(err.to_string(), r#"Try a valid action: ["store"]"#);
    }

    #[tokio::test]
    async fn other_methods_are_unsupported() {
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/store")
            .body(Body::empty())
            .unwrap();
        let err = parser().parse(request).await.unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedMethod(Method::PUT)));
    }

    fn urlencode(raw: &str) -> String {
        url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
    }
}

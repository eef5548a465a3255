//! Response construction.
//!
//! Every reply, success or failure, is a JSON object `{"response": <text>}`
//! with an explicit length and a permissive CORS header.

use axum::body::Body;
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, Response, StatusCode};
use serde_json::json;

use crate::error::IngestError;

pub const CONTENT_TYPE_JSON: &str = "application/json;charset=utf-8";

/// `200 {"response": "ok"}`
pub fn ok() -> Response<Body> {
    write(StatusCode::OK, "ok")
}

/// The error's message under the error's status.
pub fn error(err: &IngestError) -> Response<Body> {
    write(err.status_code(), &err.to_string())
}

pub fn write(status: StatusCode, message: &str) -> Response<Body> {
    let body = json!({ "response": message }).to_string();
    let length = body.len();

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    response
}

//! End-to-end ingestion over HTTP.

use reqwest::StatusCode;
use serde_json::{json, Value};

use segment_datastore::config::CommitPolicy;

mod common;

async fn response_text(response: reqwest::Response) -> String {
    let body: Value = response.json().await.unwrap();
    body["response"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_get_and_post_persist_identical_rows() {
    let via_get = common::MemoryConnector::default();
    let service = common::start_service(via_get.clone(), 2).await;
    let response = reqwest::Client::new()
        .get(common::store_url(&service))
        .query(&[("json", common::reference_report().to_string())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_text(response).await, "ok");
    service.stop().await;

    let via_post = common::MemoryConnector::default();
    let service = common::start_service(via_post.clone(), 2).await;
    let response = reqwest::Client::new()
        .post(common::store_url(&service))
        .body(common::reference_report().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    service.stop().await;

    let rows = via_get.rows();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows, via_post.rows());

    let first = &rows[0];
    assert_eq!(first.segment_id, 345678);
    assert_eq!(first.prev_segment_id, Some(356789));
    assert_eq!(first.provider, "123456");
    assert_eq!(first.mode, "auto");
    assert_eq!(first.speed, 166.5);
    assert_eq!((first.start_time_dow, first.start_time_hour), (5, 3));
}

#[tokio::test]
async fn test_omitted_prev_segment_id_is_null() {
    let connector = common::MemoryConnector::default();
    let service = common::start_service(connector.clone(), 1).await;

    let response = reqwest::Client::new()
        .post(common::store_url(&service))
        .json(&common::reference_report())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    service.stop().await;

    let rows = connector.rows();
    assert_eq!(rows[1].segment_id, 345780);
    assert_eq!(rows[1].prev_segment_id, None);
}

#[tokio::test]
async fn test_missing_top_level_field_persists_nothing() {
    let connector = common::MemoryConnector::default();
    let service = common::start_service(connector.clone(), 1).await;
    let client = reqwest::Client::new();

    for field in ["provider", "mode", "segments"] {
        let mut report = common::reference_report();
        report.as_object_mut().unwrap().remove(field);

        let response = client
            .post(common::store_url(&service))
            .json(&report)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response_text(response).await, format!("missing field `{field}`"));
    }

    service.stop().await;
    assert!(connector.rows().is_empty());
}

#[tokio::test]
async fn test_malformed_segment_keeps_earlier_rows() {
    let connector = common::MemoryConnector::default();
    let service = common::start_service(connector.clone(), 1).await;

    let mut report = common::reference_report();
    report["segments"][2].as_object_mut().unwrap().remove("length");

    let response = reqwest::Client::new()
        .post(common::store_url(&service))
        .json(&report)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response_text(response).await.starts_with("segment 2: "));
    service.stop().await;

    let ids: Vec<i64> = connector.rows().iter().map(|r| r.segment_id).collect();
    assert_eq!(ids, vec![345678, 345780]);
}

#[tokio::test]
async fn test_atomic_policy_discards_whole_request() {
    let connector = common::MemoryConnector::default();
    let mut config = common::local_config(1);
    config.ingest.commit_policy = CommitPolicy::Atomic;
    let service = common::start_with_config(connector.clone(), config).await;

    let mut report = common::reference_report();
    report["segments"][2].as_object_mut().unwrap().remove("length");

    let response = reqwest::Client::new()
        .post(common::store_url(&service))
        .json(&report)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    service.stop().await;

    assert!(connector.rows().is_empty());
}

#[tokio::test]
async fn test_unknown_action_and_missing_json() {
    let service = common::start_service(common::MemoryConnector::default(), 1).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/query", service.local_addr()))
        .query(&[("json", "{}")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_text(response).await, r#"Try a valid action: ["store"]"#);

    let response = client.get(common::store_url(&service)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_text(response).await, "No json provided");

    service.stop().await;
}

#[tokio::test]
async fn test_unsupported_method() {
    let service = common::start_service(common::MemoryConnector::default(), 1).await;

    let response = reqwest::Client::new()
        .put(common::store_url(&service))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);

    service.stop().await;
}

#[tokio::test]
async fn test_response_headers() {
    let service = common::start_service(common::MemoryConnector::default(), 1).await;

    let response = reqwest::Client::new()
        .post(common::store_url(&service))
        .json(&json!({"provider": "p", "mode": "auto", "segments": []}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["content-type"], "application/json;charset=utf-8");
    assert_eq!(headers["content-length"], "17");
    assert!(headers.contains_key("x-request-id"));

    service.stop().await;
}

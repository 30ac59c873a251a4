mod common;

use axum::http::Method;
use axum_test::TestServer;
use bytes::Bytes;
use parking_lot::Mutex;
use rask_log_bridge::bridge::{
    BridgeError, BridgeReceiver, MAX_BODY_BYTES, ReceiverConfig, ReceiverStatus,
};
use rask_log_bridge::{LogCategory, LogEntry, LogPriority};
use serde_json::json;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

fn loopback(port: u16) -> ReceiverConfig {
    ReceiverConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port,
    }
}

fn collecting(receiver: &BridgeReceiver) -> Arc<Mutex<Vec<LogEntry>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    receiver.subscribe(move |entry| sink.lock().push(entry.clone()));
    seen
}

#[tokio::test]
async fn test_posted_message_is_rebuilt_and_published() {
    let receiver = BridgeReceiver::new(loopback(0));
    let seen = collecting(&receiver);
    let server = TestServer::new(receiver.router()).unwrap();

    let response = server
        .post("/")
        .json(&json!({
            "cat": 3,
            "prio": 0,
            "msg": "disk full",
            "tag": "storage",
            "time": "2024-01-01T00:00:00Z"
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), "");

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    let entry = &seen[0];
    assert_eq!(entry.category(), LogCategory::Error);
    assert_eq!(entry.priority(), LogPriority::None);
    assert_eq!(entry.message_text(), "disk full");
    assert_eq!(entry.tag(), Some("STORAGE"));
    assert_eq!(entry.timestamp().to_rfc3339(), "2024-01-01T00:00:00+00:00");
    assert!(entry.id().is_some());
}

#[tokio::test]
async fn test_malformed_json_is_acknowledged_and_dropped() {
    let receiver = BridgeReceiver::new(loopback(0));
    let seen = collecting(&receiver);
    let server = TestServer::new(receiver.router()).unwrap();

    let response = server.post("/").text("{\"cat\": 3, ").await;

    response.assert_status_ok();
    assert_eq!(response.text(), "");
    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn test_scenario_body_with_bad_id_and_padded_tag() {
    let receiver = BridgeReceiver::new(loopback(0));
    let seen = collecting(&receiver);
    let server = TestServer::new(receiver.router()).unwrap();

    server
        .post("/")
        .text(
            r#"{"id":"abc","cat":3,"msg":"disk full","prio":1,"tag":" storage ","time":"2024-01-01T00:00:00+00:00"}"#,
        )
        .await
        .assert_status_ok();

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    let entry = &seen[0];
    assert_eq!(entry.category(), LogCategory::Error);
    assert_eq!(entry.category().as_i32(), 3);
    assert_eq!(entry.priority(), LogPriority::Low);
    assert_eq!(entry.message_text(), "disk full");
    assert_eq!(entry.tag(), Some("STORAGE"));
    assert_eq!(entry.timestamp().offset().local_minus_utc(), 0);
    assert_eq!(entry.timestamp().to_rfc3339(), "2024-01-01T00:00:00+00:00");

    let id = entry.id().expect("unparseable id is replaced");
    assert!(!id.is_nil());
    assert_eq!(id.get_version_num(), 4);
}

#[tokio::test]
async fn test_malformed_request_does_not_block_the_next_one() {
    let receiver = BridgeReceiver::new(loopback(0));
    let seen = collecting(&receiver);
    let server = TestServer::new(receiver.router()).unwrap();

    let response = server.post("/").text("{bad").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "");

    server
        .post("/")
        .json(&json!({"cat": 1, "msg": "after the bad one"}))
        .await
        .assert_status_ok();

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].category(), LogCategory::Alert);
    assert_eq!(seen[0].message_text(), "after the bad one");
}

#[tokio::test]
async fn test_oversized_body_is_acknowledged_and_dropped() {
    let receiver = BridgeReceiver::new(loopback(0));
    let seen = collecting(&receiver);
    let server = TestServer::new(receiver.router()).unwrap();

    let oversized = format!(r#"{{"msg":"{}"}}"#, "a".repeat(MAX_BODY_BYTES));
    let response = server.post("/").text(oversized).await;

    response.assert_status_ok();
    assert_eq!(response.text(), "");
    assert!(seen.lock().is_empty());

    server
        .post("/")
        .json(&json!({"msg": "small"}))
        .await
        .assert_status_ok();
    assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn test_empty_and_non_utf8_bodies_are_dropped() {
    let receiver = BridgeReceiver::new(loopback(0));
    let seen = collecting(&receiver);
    let server = TestServer::new(receiver.router()).unwrap();

    server.post("/").await.assert_status_ok();
    server
        .post("/")
        .bytes(Bytes::from_static(&[0xc3, 0x28, 0x7b, 0x7d]))
        .await
        .assert_status_ok();

    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn test_any_method_and_path_is_accepted() {
    let receiver = BridgeReceiver::new(loopback(0));
    let seen = collecting(&receiver);
    let server = TestServer::new(receiver.router()).unwrap();

    server
        .method(Method::PUT, "/some/nested/path")
        .json(&json!({"msg": "via put"}))
        .await
        .assert_status_ok();
    server
        .get("/health")
        .await
        .assert_status_ok();

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].message_text(), "via put");
}

#[tokio::test]
async fn test_unsubscribed_callback_is_not_invoked() {
    let receiver = BridgeReceiver::new(loopback(0));
    let kept = collecting(&receiver);

    let removed = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&removed);
    let id = receiver.subscribe(move |_| *counter.lock() += 1);
    assert!(receiver.unsubscribe(id));

    let server = TestServer::new(receiver.router()).unwrap();
    server.post("/").json(&json!({"msg": "x"})).await.assert_status_ok();

    assert_eq!(kept.lock().len(), 1);
    assert_eq!(*removed.lock(), 0);
}

#[tokio::test]
async fn test_panicking_subscriber_does_not_break_the_response() {
    let receiver = BridgeReceiver::new(loopback(0));
    receiver.subscribe(|_| panic!("subscriber exploded"));
    let seen = collecting(&receiver);
    let server = TestServer::new(receiver.router()).unwrap();

    server.post("/").json(&json!({"msg": "x"})).await.assert_status_ok();

    assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn test_listener_receives_over_http_and_stops() {
    let receiver = BridgeReceiver::new(loopback(0));
    let seen = collecting(&receiver);

    let addr = receiver.start().await.unwrap();
    assert_eq!(receiver.status(), ReceiverStatus::Listening);

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/"))
        .header("content-type", "application/json")
        .body(r#"{"cat": 0, "msg": {"code": 7}}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.bytes().await.unwrap().len(), 0);

    {
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].category(), LogCategory::Emergency);
        assert_eq!(seen[0].message(), Some(&json!({"code": 7})));
    }

    receiver.shutdown().await;
    assert_eq!(receiver.status(), ReceiverStatus::Stopped);

    let refused = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap()
        .post(format!("http://{addr}/"))
        .body("{}")
        .send()
        .await;
    assert!(refused.is_err());
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let receiver = BridgeReceiver::new(loopback(0));
    receiver.start().await.unwrap();

    receiver.stop();
    receiver.stop();
    assert_eq!(receiver.status(), ReceiverStatus::Stopped);
    assert!(receiver.local_addr().is_none());

    receiver.shutdown().await;
    assert_eq!(receiver.status(), ReceiverStatus::Stopped);
}

#[tokio::test]
async fn test_receiver_can_restart_after_shutdown() {
    let receiver = BridgeReceiver::new(loopback(0));
    receiver.start().await.unwrap();
    receiver.shutdown().await;

    let addr = receiver.start().await.unwrap();
    assert_eq!(receiver.local_addr(), Some(addr));
    receiver.shutdown().await;
}

#[tokio::test]
async fn test_bind_conflict_reports_error_and_stays_stopped() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let receiver = BridgeReceiver::new(loopback(port));
    let result = receiver.start().await;

    match result {
        Err(BridgeError::Bind { address, .. }) => {
            assert_eq!(address, format!("127.0.0.1:{port}"));
        }
        other => panic!("expected bind error, got {other:?}"),
    }
    assert_eq!(receiver.status(), ReceiverStatus::Stopped);
}

#[tokio::test]
async fn test_drop_releases_the_port() {
    let port = common::free_port();
    {
        let receiver = BridgeReceiver::new(loopback(port));
        receiver.start().await.unwrap();
    }

    let rebound = common::wait_until(Duration::from_secs(5), move || async move {
        std::net::TcpListener::bind(("127.0.0.1", port)).is_ok()
    })
    .await;
    assert!(rebound);
}

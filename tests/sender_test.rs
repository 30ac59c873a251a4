mod common;

use rask_log_bridge::bridge::{HttpSender, SenderConfig};
use rask_log_bridge::{LogCategory, LogPriority, Logger};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

async fn mock_receiver(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

async fn received(server: &MockServer) -> usize {
    server.received_requests().await.map_or(0, |r| r.len())
}

async fn wait_for_requests(server: &MockServer, count: usize) -> bool {
    common::wait_until(Duration::from_secs(5), move || async move {
        received(server).await >= count
    })
    .await
}

#[tokio::test]
async fn test_entry_is_posted_as_json() {
    let server = mock_receiver(200).await;
    let sender = HttpSender::new(SenderConfig::default()).unwrap();
    sender.add_endpoint("127.0.0.1", server.address().port()).unwrap();
    let logger = Logger::new(sender);

    assert!(logger.log(
        &json!({"disk": "sda", "free": 0}),
        LogCategory::Critical,
        LogPriority::VeryHigh,
        Some(" storage ")
    ));
    assert!(wait_for_requests(&server, 1).await);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();

    assert_eq!(body["cat"], 2);
    assert_eq!(body["prio"], 4);
    assert_eq!(body["tag"], "STORAGE");
    assert_eq!(body["msg"], json!({"disk": "sda", "free": 0}));

    let id = body["id"].as_str().unwrap();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));

    let time = body["time"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(time).is_ok());
    assert!(body["thread"]["id"].is_string());
}

#[tokio::test]
async fn test_each_send_gets_a_fresh_id() {
    let server = mock_receiver(200).await;
    let sender = HttpSender::new(SenderConfig::default()).unwrap();
    sender.add_endpoint("127.0.0.1", server.address().port()).unwrap();
    let logger = Logger::new(sender);

    assert!(logger.info("first"));
    assert!(logger.info("second"));
    assert!(wait_for_requests(&server, 2).await);

    let ids: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["id"].as_str().unwrap().to_string()
        })
        .collect();
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn test_unreachable_endpoint_does_not_affect_others() {
    let server = mock_receiver(200).await;
    let sender = HttpSender::new(SenderConfig {
        request_timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(1),
        ..SenderConfig::default()
    })
    .unwrap();
    sender.add_endpoint("127.0.0.1", server.address().port()).unwrap();
    sender.add_endpoint("127.0.0.1", 1).unwrap();
    let logger = Logger::new(sender);

    assert!(logger.warn("half the world is down"));
    assert!(wait_for_requests(&server, 1).await);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(received(&server).await, 1);
}

#[tokio::test]
async fn test_server_error_is_swallowed() {
    let server = mock_receiver(500).await;
    let sender = HttpSender::new(SenderConfig::default()).unwrap();
    sender.add_endpoint("127.0.0.1", server.address().port()).unwrap();
    let logger = Logger::new(sender);

    assert!(logger.error("nobody wants this"));
    assert!(wait_for_requests(&server, 1).await);
}

#[tokio::test]
async fn test_every_endpoint_receives_the_entry() {
    let first = mock_receiver(200).await;
    let second = mock_receiver(200).await;
    let sender = HttpSender::new(SenderConfig::default()).unwrap();
    sender.add_endpoint("127.0.0.1", first.address().port()).unwrap();
    sender.add_endpoint("localhost", second.address().port()).unwrap();
    let logger = Logger::new(sender);

    assert!(logger.notice("broadcast"));
    assert!(wait_for_requests(&first, 1).await);
    assert!(wait_for_requests(&second, 1).await);
}

#[tokio::test]
async fn test_removed_endpoint_receives_nothing() {
    let server = mock_receiver(200).await;
    let sender = HttpSender::new(SenderConfig::default()).unwrap();
    let port = server.address().port();
    sender.add_endpoint("127.0.0.1", port).unwrap();
    assert!(sender.remove_endpoint("127.0.0.1", port));
    let logger = Logger::new(sender);

    assert!(logger.info("into the void"));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(received(&server).await, 0);
}

#[tokio::test]
async fn test_sends_beyond_in_flight_limit_are_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let sender = HttpSender::new(SenderConfig {
        max_in_flight: 1,
        ..SenderConfig::default()
    })
    .unwrap();
    sender.add_endpoint("127.0.0.1", server.address().port()).unwrap();
    let logger = Logger::new(sender);

    // The permit is taken synchronously, so only the first send is admitted
    for n in 0..3 {
        assert!(logger.log(&n, LogCategory::Info, LogPriority::None, None));
    }

    assert!(wait_for_requests(&server, 1).await);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(received(&server).await, 1);
}

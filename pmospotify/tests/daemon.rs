//! Daemon command client and controller intents against a mock daemon

mod common;

use common::RecordingHost;
use pmospotify::{DaemonClient, DaemonEvent, PlaybackStatus, SpotifyController, SpotifySettings};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn expect_post(server: &MockServer, route: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200))
        .expect(times)
        .mount(server)
        .await;
}

fn client(server: &MockServer) -> DaemonClient {
    DaemonClient::new(server.uri(), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_play_resumes_when_paused() {
    let server = MockServer::start().await;
    expect_post(&server, "/player/resume", 1).await;
    expect_post(&server, "/player/play", 2).await;

    let daemon = client(&server);
    daemon.play(PlaybackStatus::Pause).await;
    daemon.play(PlaybackStatus::Stop).await;
    daemon.play(PlaybackStatus::Play).await;
}

#[tokio::test]
async fn test_command_paths() {
    let server = MockServer::start().await;
    expect_post(&server, "/player/pause", 2).await;
    expect_post(&server, "/player/next", 1).await;
    expect_post(&server, "/player/prev", 1).await;

    let daemon = client(&server);
    daemon.pause().await;
    daemon.stop().await;
    daemon.next().await;
    daemon.previous().await;
}

#[tokio::test]
async fn test_payloads() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/player/seek"))
        .and(body_json(json!({ "position": 42000 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/player/volume"))
        .and(body_json(json!({ "volume": 0.35 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let daemon = client(&server);
    daemon.seek(42000).await;
    daemon.set_volume(35).await;
}

#[tokio::test]
async fn test_rejected_command_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/player/next"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    // Logged, not retried, no panic
    client(&server).next().await;
}

#[tokio::test]
async fn test_status_is_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "bob",
            "device_name": "PMOMusic",
            "stopped": true
        })))
        .mount(&server)
        .await;

    let status = client(&server).status().await.unwrap();
    assert_eq!(status["device_name"], "PMOMusic");
}

#[tokio::test]
async fn test_controller_play_follows_session_state() {
    let server = MockServer::start().await;
    expect_post(&server, "/player/play", 1).await;
    expect_post(&server, "/player/resume", 1).await;

    let mut settings = SpotifySettings::default();
    settings.daemon.base_url = server.uri();
    let controller = SpotifyController::new(settings, Arc::new(RecordingHost::default())).unwrap();

    controller.play().await;

    controller
        .session()
        .handle_event(DaemonEvent::new("paused", json!({})))
        .await;
    controller.play().await;
}

//! Event feed against a local WebSocket server standing in for the daemon

mod common;

use common::RecordingHost;
use futures::SinkExt;
use pmospotify::{
    AudioQuality, ConnectionState, DaemonClient, EventFeed, PlaybackSession, PlaybackStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

async fn wait_until<F: Fn() -> bool>(condition: F) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached in time");
}

fn session(host: Arc<RecordingHost>) -> PlaybackSession {
    let daemon = DaemonClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
    PlaybackSession::new(
        host,
        daemon,
        AudioQuality::new(320),
        Duration::from_millis(100),
    )
}

#[tokio::test]
async fn test_events_reach_the_host_after_activation() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/events", listener.local_addr().unwrap());

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let frames = [
            r#"{"type":"track","data":{"name":"So What","duration":562000,"uri":"spotify:track:t1","artist_names":["Miles Davis"],"album_name":"Kind of Blue","album_cover_url":"https://i.scdn.co/image/kob"}}"#,
            "this is not json",
            r#"{"type":"playing","data":{}}"#,
        ];
        for frame in frames {
            ws.send(Message::Text(frame.to_string())).await.unwrap();
        }
        // Keep the connection open while the client settles
        tokio::time::sleep(Duration::from_millis(500)).await;
        ws.send(Message::Text(r#"{"type":"seek","data":{"position":1000}}"#.to_string()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        ws.close(None).await.ok();
    });

    let host = Arc::new(RecordingHost::default());
    let session = session(host.clone());
    let (feed, mut state) = EventFeed::new(url, Duration::from_secs(60), session.clone());
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(feed.run(shutdown.clone()));

    state
        .wait_for(|s| *s == ConnectionState::Connected)
        .await
        .unwrap();

    wait_until(|| !host.pushes().is_empty()).await;
    let first = host.pushes()[0].clone();
    assert_eq!(first.title, "So What");
    assert_eq!(first.duration, 562);
    assert_eq!(first.status, PlaybackStatus::Play);
    assert_eq!(host.claims(), 1);

    wait_until(|| host.pushes().iter().any(|s| s.seek == 1000)).await;

    // The server closed the stream: the feed drops back to disconnected
    state
        .wait_for(|s| *s == ConnectionState::Disconnected)
        .await
        .unwrap();
    assert!(!session.is_active().await);

    shutdown.cancel();
    task.await.unwrap();
    server.await.unwrap();
}

#[tokio::test]
async fn test_reconnect_resets_state() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/events", listener.local_addr().unwrap());
    let (accepted_tx, mut accepted) = mpsc::unbounded_channel();
    let (release_tx, release) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        // First connection: one event then a close
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        accepted_tx.send(1).unwrap();
        ws.send(Message::Text(r#"{"type":"paused"}"#.to_string()))
            .await
            .unwrap();
        ws.close(None).await.ok();

        // Second connection stays open until the test is done
        let (stream, _) = listener.accept().await.unwrap();
        let _ws = accept_async(stream).await.unwrap();
        accepted_tx.send(2).unwrap();
        release.await.ok();
    });

    let host = Arc::new(RecordingHost::default());
    let session = session(host.clone());
    let (feed, mut state) = EventFeed::new(url, Duration::from_millis(500), session.clone());
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(feed.run(shutdown.clone()));

    let first = timeout(Duration::from_secs(5), accepted.recv()).await.unwrap();
    assert_eq!(first, Some(1));
    timeout(Duration::from_secs(5), async {
        while session.current_state().await.status != PlaybackStatus::Pause {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let second = timeout(Duration::from_secs(5), accepted.recv()).await.unwrap();
    assert_eq!(second, Some(2));
    timeout(
        Duration::from_secs(5),
        state.wait_for(|s| *s == ConnectionState::Connected),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(session.current_state().await.status, PlaybackStatus::Stop);

    shutdown.cancel();
    task.await.unwrap();
    release_tx.send(()).ok();
    server.await.unwrap();
}

//! Shared helpers for the pmospotify integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pmospotify::{
    AudioQuality, BrowseCache, BrowseResolver, Exploder, PlaybackState, PlayerHost,
    ReleaseCallback, SpotifyApi, TokenManager,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Host double recording everything the adapter sends
#[derive(Default)]
pub struct RecordingHost {
    pub pushes: Mutex<Vec<PlaybackState>>,
    pub volumes: Mutex<Vec<u8>>,
    pub claims: Mutex<usize>,
}

impl RecordingHost {
    pub fn pushes(&self) -> Vec<PlaybackState> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn claims(&self) -> usize {
        *self.claims.lock().unwrap()
    }
}

#[async_trait]
impl PlayerHost for RecordingHost {
    async fn push_state(&self, state: PlaybackState, _service: &str) {
        self.pushes.lock().unwrap().push(state);
    }

    async fn set_volume(&self, volume: u8) -> anyhow::Result<()> {
        self.volumes.lock().unwrap().push(volume);
        Ok(())
    }

    async fn unset_consume_update_service(&self) {}

    async fn set_volatile(&self, _service: &str, _on_release: ReleaseCallback) {
        *self.claims.lock().unwrap() += 1;
    }
}

/// Token exchange answering with a token valid for one hour
pub async fn mount_token_exchange(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/spotify/accessToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "BQD-access",
            "expiresInSeconds": 3600
        })))
        .mount(server)
        .await;
}

/// Web API client whose token exchange and API both live on `server`
pub fn api_for(server: &MockServer, country: Option<&str>) -> Arc<SpotifyApi> {
    let tokens = Arc::new(
        TokenManager::new(server.uri(), "AQB-refresh", Duration::from_secs(5)).unwrap(),
    );
    Arc::new(
        SpotifyApi::new(format!("{}/v1", server.uri()), tokens, Duration::from_secs(5))
            .unwrap()
            .with_country(country),
    )
}

pub fn resolver_for(server: &MockServer, country: Option<&str>) -> BrowseResolver {
    BrowseResolver::new(
        api_for(server, country),
        AudioQuality::new(320),
        BrowseCache::default(),
    )
}

pub fn exploder_for(server: &MockServer, country: Option<&str>) -> Exploder {
    Exploder::new(api_for(server, country), AudioQuality::new(320))
}

/// Minimal Web API track object
pub fn track_json(id: &str, name: &str, markets: Option<&[&str]>) -> serde_json::Value {
    let mut track = json!({
        "id": id,
        "name": name,
        "uri": format!("spotify:track:{}", id),
        "duration_ms": 215_000,
        "artists": [{"id": "a1", "name": "Miles Davis", "uri": "spotify:artist:a1"}],
        "album": {
            "id": "al1",
            "name": "Kind of Blue",
            "uri": "spotify:album:al1",
            "images": [{"url": "https://i.scdn.co/image/kob", "width": 640, "height": 640}]
        }
    });
    if let Some(markets) = markets {
        track["available_markets"] = json!(markets);
    }
    track
}

/// Single-page paging object
pub fn page_json(items: Vec<serde_json::Value>) -> serde_json::Value {
    let total = items.len();
    json!({ "items": items, "next": null, "total": total, "offset": 0 })
}

//! Accès au démon Spotify Connect local
//!
//! - [`DaemonClient`] : commandes HTTP "best effort" (POST sans retry) et
//!   lecture de `/status`
//! - [`events`] : normalisation des événements du flux WebSocket
//! - [`feed`] : boucle de connexion / reconnexion au flux d'événements

pub mod events;
pub mod feed;

use crate::config::DaemonSettings;
use crate::error::{Result, SpotifyError};
use crate::models::PlaybackStatus;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

const PLAY_PATH: &str = "/player/play";
const PAUSE_PATH: &str = "/player/pause";
const RESUME_PATH: &str = "/player/resume";
const NEXT_PATH: &str = "/player/next";
const PREV_PATH: &str = "/player/prev";
const SEEK_PATH: &str = "/player/seek";
const VOLUME_PATH: &str = "/player/volume";
const STATUS_PATH: &str = "/status";

/// Client de commande du démon local
///
/// Toutes les commandes sont "fire and forget" : les erreurs de transport
/// et les statuts non-2xx sont journalisés puis oubliés, jamais retentés.
#[derive(Debug, Clone)]
pub struct DaemonClient {
    client: Client,
    base_url: String,
}

impl DaemonClient {
    /// Crée un client vers `base_url` (ex: `http://127.0.0.1:9876`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &DaemonSettings) -> Result<Self> {
        Self::new(
            settings.base_url.as_str(),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Envoie une commande sans corps
    pub async fn send_command(&self, path: &str) {
        self.post(path, None).await;
    }

    /// Envoie une commande avec un corps JSON
    pub async fn send_command_with_payload(&self, path: &str, payload: &Value) {
        self.post(path, Some(payload)).await;
    }

    async fn post(&self, path: &str, payload: Option<&Value>) {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let mut request = self.client.post(&url);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => warn!(
                "Daemon command {} rejected with status {}",
                path,
                response.status()
            ),
            Err(e) => warn!("Daemon command {} failed: {}", path, e),
        }
    }

    /// État brut rapporté par le démon (diagnostic)
    pub async fn status(&self) -> Result<Value> {
        let url = format!("{}{}", self.base_url, STATUS_PATH);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpotifyError::from_status_code(status.as_u16(), body));
        }
        Ok(serde_json::from_str(&response.text().await?)?)
    }

    // ============ Intentions ============

    /// Lance la lecture, ou la reprend si elle est en pause
    pub async fn play(&self, current: PlaybackStatus) {
        if current == PlaybackStatus::Pause {
            self.send_command(RESUME_PATH).await;
        } else {
            self.send_command(PLAY_PATH).await;
        }
    }

    pub async fn pause(&self) {
        self.send_command(PAUSE_PATH).await;
    }

    /// Le démon n'a pas de commande d'arrêt : on met en pause
    pub async fn stop(&self) {
        self.send_command(PAUSE_PATH).await;
    }

    pub async fn resume(&self) {
        self.send_command(RESUME_PATH).await;
    }

    pub async fn next(&self) {
        self.send_command(NEXT_PATH).await;
    }

    pub async fn previous(&self) {
        self.send_command(PREV_PATH).await;
    }

    pub async fn seek(&self, position: u64) {
        self.send_command_with_payload(SEEK_PATH, &json!({ "position": position }))
            .await;
    }

    /// Volume hôte (0..=100) converti en fraction pour le démon
    pub async fn set_volume(&self, volume: u8) {
        let fraction = f64::from(volume.min(100)) / 100.0;
        self.send_command_with_payload(VOLUME_PATH, &json!({ "volume": fraction }))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = DaemonClient::new("http://127.0.0.1:9876/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9876");
    }

    #[tokio::test]
    async fn test_unreachable_daemon_is_swallowed() {
        // Port 9 (discard) : la connexion échoue, la commande ne doit pas paniquer
        let client = DaemonClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        client.next().await;
        client.seek(1000).await;
    }
}

//! Façade exposée à l'hôte
//!
//! [`SpotifyController`] assemble la session de lecture, le client du démon,
//! la boucle d'événements et, si un refresh token est configuré, la pile de
//! navigation (OAuth, Web API, cache, explosion d'URI).

use crate::api::SpotifyApi;
use crate::api::auth::TokenManager;
use crate::browse::BrowseResolver;
use crate::browse::cache::BrowseCache;
use crate::config::{Config, SpotifySettings};
use crate::daemon::DaemonClient;
use crate::daemon::feed::{ConnectionState, EventFeed};
use crate::error::{Result, SpotifyError};
use crate::explode::Exploder;
use crate::host::PlayerHost;
use crate::models::{AudioQuality, NavigationList, NavigationNode, PlaybackState, TrackDescriptor};
use crate::session::PlaybackSession;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Identité du lecteur telle que présentée par le démon
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub name: String,
    pub icon: String,
}

/// Pile de navigation, présente uniquement avec un refresh token
#[derive(Debug, Clone)]
struct BrowseStack {
    resolver: BrowseResolver,
    exploder: Exploder,
}

struct FeedTask {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
    state: watch::Receiver<ConnectionState>,
}

/// Contrôleur Spotify
pub struct SpotifyController {
    settings: SpotifySettings,
    session: PlaybackSession,
    daemon: DaemonClient,
    browse: Option<BrowseStack>,
    feed: Mutex<Option<FeedTask>>,
}

impl SpotifyController {
    /// Construit le contrôleur depuis les réglages
    ///
    /// Sans refresh token, la navigation reste désactivée : c'est un état
    /// valide, les appels de navigation renvoient `BrowsingDisabled`.
    pub fn new(settings: SpotifySettings, host: Arc<dyn PlayerHost>) -> Result<Self> {
        let quality = AudioQuality::new(settings.playback.bitrate);
        let daemon = DaemonClient::from_settings(&settings.daemon)?;
        let session = PlaybackSession::new(
            host,
            daemon.clone(),
            quality,
            Duration::from_millis(settings.daemon.settle_delay_ms),
        );

        let browse = match settings.oauth.refresh_token() {
            Some(_) => {
                let timeout = Duration::from_secs(settings.webapi.request_timeout_secs);
                let tokens = Arc::new(TokenManager::from_settings(&settings.oauth, timeout)?);
                let api = Arc::new(SpotifyApi::from_settings(&settings.webapi, tokens)?);
                let cache =
                    BrowseCache::new(Duration::from_secs(settings.webapi.root_cache_ttl_secs));
                info!("Spotify browsing enabled");
                Some(BrowseStack {
                    resolver: BrowseResolver::new(api.clone(), quality, cache),
                    exploder: Exploder::new(api, quality),
                })
            }
            None => {
                info!("No Spotify refresh token configured, browsing disabled");
                None
            }
        };

        Ok(Self {
            settings,
            session,
            daemon,
            browse,
            feed: Mutex::new(None),
        })
    }

    /// Construit le contrôleur depuis la configuration chargée
    pub fn from_config(config: &Config, host: Arc<dyn PlayerHost>) -> Result<Self> {
        Self::new(config.settings()?, host)
    }

    pub fn settings(&self) -> &SpotifySettings {
        &self.settings
    }

    pub fn is_browsing_enabled(&self) -> bool {
        self.browse.is_some()
    }

    /// Résolveur de navigation (si activé)
    pub fn browser(&self) -> Option<&BrowseResolver> {
        self.browse.as_ref().map(|b| &b.resolver)
    }

    fn browse_stack(&self) -> Result<&BrowseStack> {
        self.browse.as_ref().ok_or(SpotifyError::BrowsingDisabled)
    }

    // ============ Cycle de vie ============

    /// Lance la boucle d'événements du démon (sans effet si déjà lancée)
    pub async fn start(&self) {
        let mut feed = self.feed.lock().await;
        if feed.is_some() {
            return;
        }

        let (event_feed, state) = EventFeed::new(
            self.settings.daemon.events_url.as_str(),
            Duration::from_millis(self.settings.daemon.reconnect_delay_ms),
            self.session.clone(),
        );
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(event_feed.run(shutdown.clone()));

        info!(
            "Spotify controller started (events: {})",
            self.settings.daemon.events_url
        );
        *feed = Some(FeedTask {
            shutdown,
            handle,
            state,
        });
    }

    /// Arrête la boucle d'événements et attend sa fin
    pub async fn stop(&self) {
        let Some(task) = self.feed.lock().await.take() else {
            return;
        };

        task.shutdown.cancel();
        if let Err(e) = task.handle.await {
            warn!("Event feed task ended abnormally: {}", e);
        }
        self.session.disconnected().await;
        info!("Spotify controller stopped");
    }

    /// État de la connexion au flux d'événements
    pub async fn connection_state(&self) -> ConnectionState {
        match self.feed.lock().await.as_ref() {
            Some(task) => *task.state.borrow(),
            None => ConnectionState::Disconnected,
        }
    }

    // ============ État ============

    pub async fn get_state(&self) -> PlaybackState {
        self.session.current_state().await
    }

    /// Publie l'état courant vers l'hôte
    pub async fn push_state(&self) {
        self.session.push_state().await;
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: self.settings.device.name.clone(),
            icon: self.settings.device.icon.clone(),
        }
    }

    /// État brut du démon
    pub async fn daemon_status(&self) -> Result<Value> {
        self.daemon.status().await
    }

    // ============ Navigation ============

    pub async fn handle_browse_uri(&self, uri: &str) -> Result<NavigationNode> {
        self.browse_stack()?.resolver.resolve(uri).await
    }

    pub async fn explode_uri(&self, uri: &str) -> Result<Vec<TrackDescriptor>> {
        self.browse_stack()?.exploder.explode(uri).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<NavigationList>> {
        Ok(self.browse_stack()?.resolver.search(query).await)
    }

    pub fn flush_cache(&self) {
        if let Some(browse) = &self.browse {
            browse.resolver.flush_cache();
        }
    }

    // ============ Commandes de lecture ============

    /// Lecture, ou reprise si la lecture est en pause
    pub async fn play(&self) {
        let status = self.session.current_state().await.status;
        self.daemon.play(status).await;
    }

    pub async fn pause(&self) {
        self.daemon.pause().await;
    }

    pub async fn stop_playback(&self) {
        self.daemon.stop().await;
    }

    pub async fn resume(&self) {
        self.daemon.resume().await;
    }

    pub async fn next(&self) {
        self.daemon.next().await;
    }

    pub async fn previous(&self) {
        self.daemon.previous().await;
    }

    pub async fn seek(&self, position: u64) {
        self.daemon.seek(position).await;
    }

    pub async fn set_volume(&self, volume: u8) {
        self.daemon.set_volume(volume).await;
    }

    /// Non supporté par le démon
    pub async fn random(&self, enabled: bool) {
        warn!("Spotify random({}) is not supported by the daemon", enabled);
    }

    /// Non supporté par le démon
    pub async fn repeat(&self, enabled: bool, single: bool) {
        warn!(
            "Spotify repeat({}, single={}) is not supported by the daemon",
            enabled, single
        );
    }
}

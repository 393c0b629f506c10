//! PMOSpotify - adaptateur Spotify Connect autonome
//!
//! Charge la configuration, lance le contrôleur et journalise l'état de
//! lecture publié. Arrêt propre sur Ctrl+C.

use async_trait::async_trait;
use pmospotify::{Config, PlaybackState, PlayerHost, ReleaseCallback, SpotifyController};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Hôte minimal : trace tout ce que l'adaptateur lui envoie
struct LoggingHost;

#[async_trait]
impl PlayerHost for LoggingHost {
    async fn push_state(&self, state: PlaybackState, service: &str) {
        match serde_json::to_string(&state) {
            Ok(json) => info!("🎵 [{}] {}", service, json),
            Err(e) => warn!("Cannot serialize playback state: {}", e),
        }
    }

    async fn set_volume(&self, volume: u8) -> anyhow::Result<()> {
        info!("🔊 Volume set to {}", volume);
        Ok(())
    }

    async fn unset_consume_update_service(&self) {
        info!("Consume update service detached");
    }

    async fn set_volatile(&self, service: &str, _on_release: ReleaseCallback) {
        info!("Volatile playback claimed by {}", service);
    }
}

/// Charge la configuration sous un subscriber temporaire
///
/// Le niveau de log définitif dépend de la configuration : les traces du
/// chargement passent donc par `filter` et `writer`.
fn load_config_logged<W>(config_dir: &str, filter: EnvFilter, writer: W) -> anyhow::Result<Config>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .finish();
    tracing::subscriber::with_default(bootstrap, || Config::load_config(config_dir))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_dir = std::env::args().nth(1).unwrap_or_default();
    let bootstrap_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let config = load_config_logged(&config_dir, bootstrap_filter, std::io::stdout)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.get_log_min_level().to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!("🚀 Starting PMOSpotify...");
    info!("📁 Configuration directory: {}", config.config_dir());

    let controller = SpotifyController::from_config(&config, Arc::new(LoggingHost))?;
    let device = controller.device_info();
    info!("🎧 Device: {}", device.name);
    if !controller.is_browsing_enabled() {
        info!("ℹ️ Browsing disabled (no refresh token)");
    }

    controller.start().await;

    info!("✅ PMOSpotify is ready, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    info!("🛑 Shutting down...");
    controller.stop().await;
    Ok(())
}

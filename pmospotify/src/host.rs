//! Frontière avec l'application hôte

use crate::models::PlaybackState;
use async_trait::async_trait;

/// Callback invoqué par l'hôte quand il retire la session volatile
pub type ReleaseCallback = Box<dyn FnOnce() + Send + 'static>;

/// Capacités de l'hôte utilisées par l'adaptateur
#[async_trait]
pub trait PlayerHost: Send + Sync + 'static {
    /// Publie l'état de lecture sous l'étiquette `service`
    async fn push_state(&self, state: PlaybackState, service: &str);

    /// Applique un volume (0..=100) côté hôte
    async fn set_volume(&self, volume: u8) -> anyhow::Result<()>;

    /// Détache le service "consume/update" courant du coordinateur d'état
    async fn unset_consume_update_service(&self);

    /// Déclare `service` comme unique source volatile de l'état de lecture
    async fn set_volatile(&self, service: &str, on_release: ReleaseCallback);
}

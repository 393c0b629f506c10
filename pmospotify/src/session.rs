//! Session de lecture : état normalisé et activation de la session volatile
//!
//! La session détient l'unique [`PlaybackState`] du plugin. Les événements du
//! démon y sont appliqués ; les publications vers l'hôte ne commencent qu'une
//! fois que ce backend s'est déclaré seul propriétaire de la lecture (la
//! session *volatile*) :
//!
//! ```text
//! Inactive --1er événement--> Activating --délai--> Active
//!     ^                                                 |
//!     +------- reconnexion / libération par l'hôte -----+
//! ```
//!
//! Tant que la session n'est pas `Active`, les événements mettent l'état à
//! jour mais rien n'est publié : le premier push arrive toujours après la
//! prise de la session par l'hôte.

use crate::daemon::DaemonClient;
use crate::daemon::events::{DaemonEvent, EventEffect, EventNormalizer};
use crate::host::PlayerHost;
use crate::models::{AudioQuality, PlaybackState, SERVICE_NAME};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// État d'activation de la session volatile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Inactive,
    Activating,
    Active,
}

struct SessionState {
    normalizer: EventNormalizer,
    activation: Activation,
    /// Incrémenté à chaque (re)connexion : les activations périmées sont ignorées
    generation: u64,
}

struct SessionShared {
    host: Arc<dyn PlayerHost>,
    daemon: DaemonClient,
    settle_delay: Duration,
    state: RwLock<SessionState>,
}

/// Poignée partagée sur la session de lecture
#[derive(Clone)]
pub struct PlaybackSession {
    inner: Arc<SessionShared>,
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession").finish()
    }
}

enum Next {
    Push(PlaybackState),
    Activate(u64),
    Hold,
}

impl PlaybackSession {
    pub fn new(
        host: Arc<dyn PlayerHost>,
        daemon: DaemonClient,
        quality: AudioQuality,
        settle_delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SessionShared {
                host,
                daemon,
                settle_delay,
                state: RwLock::new(SessionState {
                    normalizer: EventNormalizer::new(quality),
                    activation: Activation::Inactive,
                    generation: 0,
                }),
            }),
        }
    }

    /// Copie de l'état de lecture courant
    pub async fn current_state(&self) -> PlaybackState {
        self.inner.state.read().await.normalizer.current_state()
    }

    pub async fn activation(&self) -> Activation {
        self.inner.state.read().await.activation
    }

    pub async fn is_active(&self) -> bool {
        self.activation().await == Activation::Active
    }

    /// Nouvelle connexion au démon : état par défaut, activation réarmée
    pub async fn reset(&self) {
        let mut state = self.inner.state.write().await;
        state.generation += 1;
        state.normalizer.reset();
        state.activation = Activation::Inactive;
        debug!(generation = state.generation, "Playback session reset");
    }

    /// Connexion perdue : la prochaine connexion devra se réactiver
    pub async fn disconnected(&self) {
        let mut state = self.inner.state.write().await;
        state.generation += 1;
        state.activation = Activation::Inactive;
    }

    /// Publie l'état courant vers l'hôte, quel que soit l'état d'activation
    pub async fn push_state(&self) {
        let state = self.current_state().await;
        self.inner.host.push_state(state, SERVICE_NAME).await;
    }

    /// Applique un événement du démon et le publie si la session est active
    pub async fn handle_event(&self, event: DaemonEvent) {
        let (effect, next) = {
            let mut state = self.inner.state.write().await;
            let effect = state.normalizer.apply(&event);
            let next = if effect == EventEffect::Ignored {
                Next::Hold
            } else {
                match state.activation {
                    Activation::Active => Next::Push(state.normalizer.current_state()),
                    Activation::Activating => Next::Hold,
                    Activation::Inactive => {
                        state.activation = Activation::Activating;
                        Next::Activate(state.generation)
                    }
                }
            };
            (effect, next)
        };

        if let EventEffect::Volume(volume) = effect {
            if let Err(e) = self.inner.host.set_volume(volume).await {
                warn!("Host refused volume {}: {}", volume, e);
            }
        }

        match next {
            Next::Push(state) => self.inner.host.push_state(state, SERVICE_NAME).await,
            Next::Activate(generation) => {
                let shared = self.inner.clone();
                tokio::spawn(async move { shared.activate(generation).await });
            }
            Next::Hold => {}
        }
    }
}

impl SessionShared {
    async fn activate(self: Arc<Self>, generation: u64) {
        info!("Claiming volatile playback session");
        self.host.unset_consume_update_service().await;
        self.host
            .set_volatile(SERVICE_NAME, self.release_callback(generation))
            .await;

        tokio::time::sleep(self.settle_delay).await;

        let snapshot = {
            let mut state = self.state.write().await;
            if state.generation != generation || state.activation != Activation::Activating {
                debug!("Discarding stale volatile activation");
                return;
            }
            state.activation = Activation::Active;
            state.normalizer.current_state()
        };
        self.host.push_state(snapshot, SERVICE_NAME).await;
    }

    /// Appelé par l'hôte quand une autre source prend la main
    fn release_callback(self: &Arc<Self>, generation: u64) -> crate::host::ReleaseCallback {
        let weak: Weak<SessionShared> = Arc::downgrade(self);
        let handle = Handle::current();
        Box::new(move || {
            handle.spawn(async move {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                info!("Volatile session released by host, stopping playback");
                shared.daemon.stop().await;
                let mut state = shared.state.write().await;
                if state.generation == generation {
                    state.activation = Activation::Inactive;
                }
            });
        })
    }
}

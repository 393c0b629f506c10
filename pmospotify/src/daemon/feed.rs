//! Flux d'événements du démon (WebSocket)
//!
//! La connexion est maintenue en permanence : à chaque coupure on attend
//! `reconnect_delay` puis on se reconnecte, jusqu'à l'annulation du jeton
//! d'arrêt. Chaque nouvelle connexion réinitialise la session de lecture.

use crate::daemon::events::DaemonEvent;
use crate::error::Result;
use crate::session::PlaybackSession;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// État de la connexion au flux
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Boucle de consommation du flux d'événements
pub struct EventFeed {
    url: String,
    reconnect_delay: Duration,
    session: PlaybackSession,
    state_tx: watch::Sender<ConnectionState>,
}

impl EventFeed {
    /// Retourne la boucle et un récepteur de l'état de connexion
    pub fn new(
        url: impl Into<String>,
        reconnect_delay: Duration,
        session: PlaybackSession,
    ) -> (Self, watch::Receiver<ConnectionState>) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        (
            Self {
                url: url.into(),
                reconnect_delay,
                session,
                state_tx,
            },
            state_rx,
        )
    }

    /// Tourne jusqu'à l'annulation de `shutdown`
    pub async fn run(self, shutdown: CancellationToken) {
        loop {
            self.state_tx.send_replace(ConnectionState::Connecting);

            let result = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.run_connection() => result,
            };

            match result {
                Ok(()) => info!("Daemon event stream closed"),
                Err(e) => warn!("Daemon event stream error: {}", e),
            }
            self.session.disconnected().await;
            self.state_tx.send_replace(ConnectionState::Disconnected);

            debug!("Reconnecting to daemon in {:?}", self.reconnect_delay);
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        self.state_tx.send_replace(ConnectionState::Disconnected);
        info!("Daemon event feed stopped");
    }

    async fn run_connection(&self) -> Result<()> {
        let (mut stream, _) = connect_async(self.url.as_str()).await?;
        info!("Connected to daemon events at {}", self.url);

        self.session.reset().await;
        self.state_tx.send_replace(ConnectionState::Connected);

        while let Some(message) = stream.next().await {
            match message? {
                Message::Text(text) => match DaemonEvent::parse(&text) {
                    Ok(event) => self.session.handle_event(event).await,
                    Err(e) => warn!("Malformed daemon event {:?}: {}", text, e),
                },
                Message::Close(frame) => {
                    debug!("Daemon closed the event stream: {:?}", frame);
                    break;
                }
                _ => {}
            }
        }

        Ok(())
    }
}

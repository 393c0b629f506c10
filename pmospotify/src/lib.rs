//! # pmospotify - Adaptateur Spotify Connect pour PMOMusic
//!
//! Cette crate relie l'hôte de lecture à un démon Spotify Connect local
//! (HTTP + flux d'événements WebSocket) et, pour la navigation, à la Web API
//! Spotify.
//!
//! ## Vue d'ensemble
//!
//! - Normalisation des événements du démon en un état "now playing" unique
//! - Prise de la session volatile de l'hôte avant toute publication d'état
//! - Commandes de lecture vers le démon (play, pause, seek, volume, ...)
//! - Navigation dans le catalogue avec cache de la racine
//! - Explosion d'une URI (album, artiste, playlist) en pistes jouables
//! - Cycle de vie du token OAuth de la Web API
//!
//! ## Structure des modules
//!
//! ```text
//! pmospotify/
//! ├── src/
//! │   ├── lib.rs              # Module principal (ce fichier)
//! │   ├── controller.rs       # Façade exposée à l'hôte
//! │   ├── session.rs          # État de lecture + session volatile
//! │   ├── host.rs             # Trait PlayerHost
//! │   ├── daemon/
//! │   │   ├── mod.rs          # Commandes HTTP du démon
//! │   │   ├── events.rs       # Normalisation des événements
//! │   │   └── feed.rs         # Boucle WebSocket avec reconnexion
//! │   ├── api/
//! │   │   ├── mod.rs          # Client Web API (pagination, marché)
//! │   │   ├── auth.rs         # Token OAuth
//! │   │   ├── catalog.rs      # Catalogue, browse, recherche
//! │   │   └── user.rs         # Bibliothèque utilisateur
//! │   ├── browse/
//! │   │   ├── mod.rs          # Résolution des URI de navigation
//! │   │   ├── artist.rs       # Page artiste par étapes
//! │   │   ├── cache.rs        # Cache de la racine
//! │   │   └── mapping.rs      # Conversions + filtre de marché
//! │   ├── explode.rs          # URI -> pistes
//! │   ├── uri.rs              # URIs spotify:<kind>:<id>
//! │   ├── models.rs           # Structures échangées avec l'hôte
//! │   ├── config.rs           # Configuration YAML
//! │   └── error.rs            # Gestion des erreurs
//! ```
//!
//! ## Utilisation
//!
//! ```rust,no_run
//! use pmospotify::{Config, PlayerHost, SpotifyController};
//! use std::sync::Arc;
//!
//! # async fn run(host: Arc<dyn PlayerHost>) -> anyhow::Result<()> {
//! let config = Config::load_config("")?;
//! let controller = SpotifyController::from_config(&config, host)?;
//! controller.start().await;
//!
//! let root = controller.handle_browse_uri("spotify").await?;
//! println!("{} sections", root.lists.len());
//!
//! controller.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod browse;
pub mod config;
pub mod controller;
pub mod daemon;
pub mod error;
pub mod explode;
pub mod host;
pub mod models;
pub mod session;
pub mod uri;

pub use api::SpotifyApi;
pub use api::auth::TokenManager;
pub use browse::artist::{ArtistPage, ArtistStage};
pub use browse::cache::BrowseCache;
pub use browse::{BrowseResolver, BrowseTarget};
pub use config::{Config, SpotifySettings};
pub use controller::{DeviceInfo, SpotifyController};
pub use daemon::DaemonClient;
pub use daemon::events::{DaemonEvent, EventEffect, EventNormalizer};
pub use daemon::feed::{ConnectionState, EventFeed};
pub use error::{Result, SpotifyError};
pub use explode::Exploder;
pub use host::{PlayerHost, ReleaseCallback};
pub use models::*;
pub use session::{Activation, PlaybackSession};
pub use uri::SpotifyUri;

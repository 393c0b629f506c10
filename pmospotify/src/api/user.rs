//! Endpoints de la bibliothèque utilisateur (`/me/...`)

use super::catalog::{Album, Artist, PlayHistory, Playlist, SavedAlbum, SavedTrack, Track};
use super::{Page, SpotifyApi};
use crate::error::Result;
use serde::Deserialize;
use tracing::debug;

/// Profil de l'utilisateur courant
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    /// Code pays ISO 3166-1 (absent sans le scope `user-read-private`)
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl SpotifyApi {
    /// Profil de l'utilisateur authentifié
    pub async fn me(&self) -> Result<UserProfile> {
        debug!("Fetching current user profile");
        self.get("/me", &[]).await
    }

    /// Playlists de l'utilisateur (créées et suivies)
    pub async fn get_my_playlists(&self) -> Result<Vec<Playlist>> {
        debug!("Fetching user playlists");
        self.get_all("/me/playlists", &[]).await
    }

    /// Albums sauvegardés
    pub async fn get_my_albums(&self) -> Result<Vec<Album>> {
        debug!("Fetching saved albums");
        let saved: Vec<SavedAlbum> = self.get_all("/me/albums", &[]).await?;
        Ok(saved.into_iter().map(|s| s.album).collect())
    }

    /// Pistes sauvegardées
    pub async fn get_my_tracks(&self) -> Result<Vec<Track>> {
        debug!("Fetching saved tracks");
        let saved: Vec<SavedTrack> = self.get_all("/me/tracks", &[]).await?;
        Ok(saved.into_iter().map(|s| s.track).collect())
    }

    pub async fn get_my_top_artists(&self) -> Result<Vec<Artist>> {
        debug!("Fetching top artists");
        self.get_all("/me/top/artists", &[]).await
    }

    pub async fn get_my_top_tracks(&self) -> Result<Vec<Track>> {
        debug!("Fetching top tracks");
        self.get_all("/me/top/tracks", &[]).await
    }

    /// Dernières pistes écoutées
    ///
    /// Pagination par curseur côté Web API : seule la page la plus récente
    /// est lue.
    pub async fn get_recently_played(&self) -> Result<Vec<Track>> {
        debug!("Fetching recently played tracks");
        let limit = super::PAGE_LIMIT.to_string();
        let page: Page<PlayHistory> = self
            .get("/me/player/recently-played", &[("limit", limit.as_str())])
            .await?;
        Ok(page.items.into_iter().map(|h| h.track).collect())
    }
}

//! URIs du catalogue Spotify (`spotify:<kind>:<id>`)

use std::fmt;

/// Ressource du catalogue désignée par une URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpotifyUri {
    Track(String),
    Album(String),
    Artist(String),
    Playlist(String),
    /// Ancienne forme `spotify:user:<user>:playlist:<id>`
    UserPlaylist { user: String, id: String },
}

impl SpotifyUri {
    /// Décode une URI, `None` si elle n'est pas reconnue
    pub fn parse(uri: &str) -> Option<Self> {
        let parts: Vec<&str> = uri.trim().split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }

        match parts.as_slice() {
            ["spotify", "track", id] => Some(Self::Track(id.to_string())),
            ["spotify", "album", id] => Some(Self::Album(id.to_string())),
            ["spotify", "artist", id] => Some(Self::Artist(id.to_string())),
            ["spotify", "playlist", id] => Some(Self::Playlist(id.to_string())),
            ["spotify", "user", user, "playlist", id] => Some(Self::UserPlaylist {
                user: user.to_string(),
                id: id.to_string(),
            }),
            _ => None,
        }
    }

}

impl fmt::Display for SpotifyUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Track(id) => write!(f, "spotify:track:{}", id),
            Self::Album(id) => write!(f, "spotify:album:{}", id),
            Self::Artist(id) => write!(f, "spotify:artist:{}", id),
            Self::Playlist(id) => write!(f, "spotify:playlist:{}", id),
            Self::UserPlaylist { user, id } => write!(f, "spotify:user:{}:playlist:{}", user, id),
        }
    }
}

/// URI canonique d'une piste
pub fn track_uri(id: &str) -> String {
    SpotifyUri::Track(id.to_string()).to_string()
}

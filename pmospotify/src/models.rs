//! Structures de données échangées avec l'hôte
//!
//! Les noms de champs sérialisés suivent le vocabulaire de l'hôte
//! (`albumart`, `trackType`, `availableListViews`, ...).

use serde::{Deserialize, Serialize};

/// Étiquette de service sous laquelle l'état est publié
pub const SERVICE_NAME: &str = "spop";

/// Type de piste constant pour ce backend
pub const TRACK_TYPE: &str = "spotify";

/// Pochette par défaut fournie par l'hôte
pub const DEFAULT_ALBUMART: &str = "/albumart";

/// État de lecture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    #[default]
    Stop,
    Play,
    Pause,
}

/// Qualité configurée sur le démon
///
/// Le démon décode toujours du 44.1 kHz / 16 bit stéréo ; seul le débit
/// du flux Spotify varie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioQuality {
    pub bitrate_kbps: u32,
}

impl AudioQuality {
    pub fn new(bitrate_kbps: u32) -> Self {
        Self { bitrate_kbps }
    }

    /// Étiquette de débit, ex: `320 kbps`
    pub fn bitrate_label(&self) -> String {
        format!("{} kbps", self.bitrate_kbps)
    }

    pub fn samplerate_label(&self) -> String {
        "44.1 kHz".to_string()
    }

    pub fn bitdepth_label(&self) -> String {
        "16 bit".to_string()
    }

    pub fn channels(&self) -> u8 {
        2
    }
}

impl Default for AudioQuality {
    fn default() -> Self {
        Self::new(320)
    }
}

/// État "now playing" publié vers l'hôte
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    pub service: String,
    pub title: String,
    /// Artistes joints par `", "`
    pub artist: String,
    pub album: String,
    pub albumart: String,
    pub uri: String,
    pub track_type: String,
    /// Position telle que rapportée par le démon
    pub seek: u64,
    /// Durée en secondes
    pub duration: u64,
    pub samplerate: String,
    pub bitdepth: String,
    pub bitrate: String,
    pub channels: u8,
}

impl PlaybackState {
    /// État initial, réinitialisé à chaque (re)connexion au démon
    pub fn new(quality: AudioQuality) -> Self {
        Self {
            status: PlaybackStatus::Stop,
            service: SERVICE_NAME.to_string(),
            title: String::new(),
            artist: String::new(),
            album: String::new(),
            albumart: DEFAULT_ALBUMART.to_string(),
            uri: String::new(),
            track_type: TRACK_TYPE.to_string(),
            seek: 0,
            duration: 0,
            samplerate: quality.samplerate_label(),
            bitdepth: quality.bitdepth_label(),
            bitrate: quality.bitrate_label(),
            channels: quality.channels(),
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(AudioQuality::default())
    }
}

/// Piste prête à être mise en file par l'hôte
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDescriptor {
    pub service: String,
    pub name: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub albumart: String,
    /// URI canonique `spotify:track:<id>`
    pub uri: String,
    /// Durée en secondes
    pub duration: u64,
    pub samplerate: String,
    pub bitdepth: String,
    pub bitrate: String,
    pub track_type: String,
}

/// Vues proposées pour une liste
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListView {
    List,
    Grid,
}

/// Entrée de navigation (dossier, playlist, catégorie)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationEntry {
    pub service: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub albumart: Option<String>,
    pub uri: String,
}

impl NavigationEntry {
    pub fn new(title: impl Into<String>, uri: impl Into<String>, albumart: Option<String>) -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            title: title.into(),
            albumart,
            uri: uri.into(),
        }
    }
}

/// Élément d'une liste de navigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NavigationItem {
    Folder(NavigationEntry),
    Playlist(NavigationEntry),
    Song(TrackDescriptor),
    StreamingCategory(NavigationEntry),
    SpotifyCategory(NavigationEntry),
}

impl NavigationItem {
    pub fn title(&self) -> &str {
        match self {
            NavigationItem::Song(track) => &track.title,
            NavigationItem::Folder(e)
            | NavigationItem::Playlist(e)
            | NavigationItem::StreamingCategory(e)
            | NavigationItem::SpotifyCategory(e) => &e.title,
        }
    }

    pub fn uri(&self) -> &str {
        match self {
            NavigationItem::Song(track) => &track.uri,
            NavigationItem::Folder(e)
            | NavigationItem::Playlist(e)
            | NavigationItem::StreamingCategory(e)
            | NavigationItem::SpotifyCategory(e) => &e.uri,
        }
    }
}

/// Liste d'éléments, avec titre optionnel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationList {
    pub available_list_views: Vec<ListView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub items: Vec<NavigationItem>,
}

impl NavigationList {
    /// Liste de pistes (vue liste uniquement)
    pub fn tracks(title: Option<&str>, items: Vec<NavigationItem>) -> Self {
        Self {
            available_list_views: vec![ListView::List],
            title: title.map(str::to_string),
            items,
        }
    }

    /// Liste de dossiers (liste ou grille)
    pub fn folders(title: Option<&str>, items: Vec<NavigationItem>) -> Self {
        Self {
            available_list_views: vec![ListView::List, ListView::Grid],
            title: title.map(str::to_string),
            items,
        }
    }
}

/// Lien vers le nœud parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrevLink {
    pub uri: String,
}

/// En-tête d'une page album / playlist / artiste
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationInfo {
    pub uri: String,
    pub title: String,
    pub service: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub albumart: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
}

/// Réponse de navigation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<PrevLink>,
    pub lists: Vec<NavigationList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<NavigationInfo>,
}

impl NavigationNode {
    /// Nœud vide avec lien vers le parent
    pub fn with_prev(prev: &str) -> Self {
        Self {
            prev: Some(PrevLink {
                uri: prev.to_string(),
            }),
            lists: Vec::new(),
            info: None,
        }
    }

    /// Nombre total d'éléments dans toutes les listes
    pub fn item_count(&self) -> usize {
        self.lists.iter().map(|l| l.items.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_state() {
        let state = PlaybackState::new(AudioQuality::new(160));
        assert_eq!(state.status, PlaybackStatus::Stop);
        assert_eq!(state.service, "spop");
        assert_eq!(state.bitrate, "160 kbps");
        assert_eq!(state.albumart, "/albumart");
        assert_eq!(state.channels, 2);
    }

    #[test]
    fn test_state_serializes_with_host_keys() {
        let value = serde_json::to_value(PlaybackState::default()).unwrap();
        assert_eq!(value["status"], "stop");
        assert_eq!(value["trackType"], "spotify");
        assert_eq!(value["albumart"], "/albumart");
    }

    #[test]
    fn test_navigation_item_tagging() {
        let item = NavigationItem::SpotifyCategory(NavigationEntry::new(
            "Jazz",
            "spotify/categories/jazz",
            None,
        ));
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "type": "spotify-category",
                "service": "spop",
                "title": "Jazz",
                "uri": "spotify/categories/jazz"
            })
        );
        assert_eq!(item.title(), "Jazz");
    }

    #[test]
    fn test_node_serialization() {
        let mut node = NavigationNode::with_prev("spotify");
        node.lists.push(NavigationList::folders(Some("Albums"), vec![]));
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["prev"]["uri"], "spotify");
        assert_eq!(value["lists"][0]["availableListViews"], json!(["list", "grid"]));
        assert!(value.get("info").is_none());
    }
}

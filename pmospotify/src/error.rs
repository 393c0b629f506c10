//! Gestion des erreurs pour l'adaptateur Spotify

use thiserror::Error;

/// Type Result personnalisé pour pmospotify
pub type Result<T> = std::result::Result<T, SpotifyError>;

/// Erreurs possibles lors de l'utilisation de l'adaptateur Spotify
#[derive(Error, Debug)]
pub enum SpotifyError {
    /// Erreur d'authentification (token refusé par la Web API)
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Ressource non trouvée (album, track, playlist, etc.)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Erreur HTTP
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Erreur de parsing JSON
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Erreur du flux WebSocket du démon
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Erreur de configuration (anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// Erreur de la Web API Spotify
    #[error("Spotify API error (code {code}): {message}")]
    ApiError { code: u16, message: String },

    /// Quota dépassé (rate limiting)
    #[error("Rate limit exceeded, please try again later")]
    RateLimitExceeded,

    /// Aucun refresh token configuré
    #[error("No refresh token configured")]
    NoRefreshToken,

    /// Échec de l'échange du refresh token
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// URI de navigation ou d'explosion non reconnue
    #[error("Unsupported URI: {0}")]
    UnsupportedUri(String),

    /// La navigation n'est pas initialisée (pas de refresh token)
    #[error("Browsing is not available without a refresh token")]
    BrowsingDisabled,

    /// Erreur générique
    #[error("Spotify error: {0}")]
    Other(String),
}

impl SpotifyError {
    /// Crée une erreur API depuis un code de statut HTTP et un message
    pub fn from_status_code(code: u16, message: impl Into<String>) -> Self {
        match code {
            401 | 403 => Self::Unauthorized(message.into()),
            404 => Self::NotFound(message.into()),
            429 => Self::RateLimitExceeded,
            _ => Self::ApiError {
                code,
                message: message.into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_code() {
        assert!(matches!(
            SpotifyError::from_status_code(401, "expired"),
            SpotifyError::Unauthorized(_)
        ));
        assert!(matches!(
            SpotifyError::from_status_code(404, "missing"),
            SpotifyError::NotFound(_)
        ));
        assert!(matches!(
            SpotifyError::from_status_code(429, ""),
            SpotifyError::RateLimitExceeded
        ));
        assert!(matches!(
            SpotifyError::from_status_code(502, "bad gateway"),
            SpotifyError::ApiError { code: 502, .. }
        ));
    }
}

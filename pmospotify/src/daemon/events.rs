//! Normalisation des événements poussés par le démon
//!
//! Chaque message WebSocket `{type, data}` est replié dans l'unique
//! [`PlaybackState`] de la session. Chaque type d'événement ne touche qu'un
//! sous-ensemble de champs ; les autres gardent leur valeur.

use crate::error::Result;
use crate::models::{AudioQuality, DEFAULT_ALBUMART, PlaybackState, PlaybackStatus};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Message brut du flux d'événements
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DaemonEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl DaemonEvent {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// Décode une trame texte du WebSocket
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Effet d'un événement sur la session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventEffect {
    /// L'état a été mis à jour
    Updated,
    /// Volume (0..=100) à transmettre à l'hôte, l'état est inchangé
    Volume(u8),
    /// Événement inconnu ou inexploitable
    Ignored,
}

/// Propriétaire de l'état de lecture courant
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    quality: AudioQuality,
    state: PlaybackState,
}

impl EventNormalizer {
    pub fn new(quality: AudioQuality) -> Self {
        Self {
            quality,
            state: PlaybackState::new(quality),
        }
    }

    /// Revient à l'état initial (nouvelle connexion au démon)
    pub fn reset(&mut self) {
        self.state = PlaybackState::new(self.quality);
    }

    /// Copie de l'état courant
    pub fn current_state(&self) -> PlaybackState {
        self.state.clone()
    }

    /// Applique un événement à l'état
    pub fn apply(&mut self, event: &DaemonEvent) -> EventEffect {
        let data = &event.data;
        match event.kind.as_str() {
            "track" => {
                self.state.title = string_field(data, "name");
                self.state.duration = duration_secs(data.get("duration"));
                self.state.uri = string_field(data, "uri");
                self.state.artist = artist_names(data.get("artist_names"));
                self.state.album = string_field(data, "album_name");
                self.state.albumart = data
                    .get("album_cover_url")
                    .and_then(Value::as_str)
                    .filter(|url| !url.is_empty())
                    .unwrap_or(DEFAULT_ALBUMART)
                    .to_string();
                EventEffect::Updated
            }
            "playing" => {
                self.state.status = PlaybackStatus::Play;
                EventEffect::Updated
            }
            "paused" => {
                self.state.status = PlaybackStatus::Pause;
                EventEffect::Updated
            }
            "stopped" | "not_playing" => {
                self.state.status = PlaybackStatus::Stop;
                EventEffect::Updated
            }
            "seek" => {
                // Les démons récents envoient `position`, les anciens `seek`
                match position(data.get("position")).or_else(|| position(data.get("seek"))) {
                    Some(seek) => {
                        self.state.seek = seek;
                        EventEffect::Updated
                    }
                    None => {
                        warn!("Seek event without a usable position: {}", data);
                        EventEffect::Ignored
                    }
                }
            }
            "volume" => match data.get("value").and_then(Value::as_f64) {
                Some(value) if value.is_finite() => {
                    EventEffect::Volume((value * 100.0).round().clamp(0.0, 100.0) as u8)
                }
                _ => {
                    warn!("Volume event without a usable value: {}", data);
                    EventEffect::Ignored
                }
            },
            other => {
                debug!("Ignoring daemon event '{}'", other);
                EventEffect::Ignored
            }
        }
    }
}

fn string_field(data: &Value, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn artist_names(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::String(name)) => name.clone(),
        _ => String::new(),
    }
}

/// Durée en millisecondes -> secondes entières, 0 si illisible
fn duration_secs(value: Option<&Value>) -> u64 {
    let millis = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match millis {
        Some(ms) if ms.is_finite() && ms >= 0.0 => (ms / 1000.0).floor() as u64,
        _ => 0,
    }
}

fn position(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalizer() -> EventNormalizer {
        EventNormalizer::new(AudioQuality::new(320))
    }

    fn track_event(duration: Value) -> DaemonEvent {
        DaemonEvent::new(
            "track",
            json!({
                "name": "So What",
                "duration": duration,
                "uri": "spotify:track:4vLYewWIvqHfKtJDk8c8tq",
                "artist_names": ["Miles Davis", "John Coltrane"],
                "album_name": "Kind of Blue",
                "album_cover_url": "https://i.scdn.co/image/kob"
            }),
        )
    }

    #[test]
    fn test_track_event_maps_fields() {
        let mut n = normalizer();
        assert_eq!(n.apply(&track_event(json!(125000))), EventEffect::Updated);

        let state = n.current_state();
        assert_eq!(state.title, "So What");
        assert_eq!(state.duration, 125);
        assert_eq!(state.uri, "spotify:track:4vLYewWIvqHfKtJDk8c8tq");
        assert_eq!(state.artist, "Miles Davis, John Coltrane");
        assert_eq!(state.album, "Kind of Blue");
        assert_eq!(state.albumart, "https://i.scdn.co/image/kob");
        assert_eq!(state.status, PlaybackStatus::Stop);
    }

    #[test]
    fn test_bad_duration_yields_zero() {
        let mut n = normalizer();
        n.apply(&track_event(json!("bad")));
        assert_eq!(n.current_state().duration, 0);

        n.apply(&track_event(json!(-5)));
        assert_eq!(n.current_state().duration, 0);

        n.apply(&track_event(json!("61999")));
        assert_eq!(n.current_state().duration, 61);
    }

    #[test]
    fn test_status_events_touch_only_status() {
        let mut n = normalizer();
        n.apply(&track_event(json!(200000)));
        n.apply(&DaemonEvent::new("seek", json!({"position": 4200})));
        let before = n.current_state();

        n.apply(&DaemonEvent::new("playing", Value::Null));
        let after = n.current_state();
        assert_eq!(after.status, PlaybackStatus::Play);
        assert_eq!(
            PlaybackState {
                status: before.status,
                ..after.clone()
            },
            before
        );

        n.apply(&DaemonEvent::new("paused", json!({})));
        assert_eq!(n.current_state().status, PlaybackStatus::Pause);
        assert_eq!(n.current_state().title, "So What");
        assert_eq!(n.current_state().seek, 4200);
    }

    #[test]
    fn test_seek_accepts_both_payload_shapes() {
        let mut n = normalizer();
        n.apply(&DaemonEvent::new("seek", json!({"position": 1500})));
        assert_eq!(n.current_state().seek, 1500);

        n.apply(&DaemonEvent::new("seek", json!({"seek": 3000})));
        assert_eq!(n.current_state().seek, 3000);

        assert_eq!(
            n.apply(&DaemonEvent::new("seek", json!({"where": "?"}))),
            EventEffect::Ignored
        );
        assert_eq!(n.current_state().seek, 3000);
    }

    #[test]
    fn test_track_event_leaves_status_and_seek() {
        let mut n = normalizer();
        n.apply(&DaemonEvent::new("playing", Value::Null));
        n.apply(&DaemonEvent::new("seek", json!({"position": 10})));
        n.apply(&track_event(json!(1000)));

        let state = n.current_state();
        assert_eq!(state.status, PlaybackStatus::Play);
        assert_eq!(state.seek, 10);
    }

    #[test]
    fn test_volume_event() {
        let mut n = normalizer();
        let before = n.current_state();
        assert_eq!(
            n.apply(&DaemonEvent::new("volume", json!({"value": 0.456}))),
            EventEffect::Volume(46)
        );
        assert_eq!(n.current_state(), before);
        assert_eq!(
            n.apply(&DaemonEvent::new("volume", json!({"value": "loud"}))),
            EventEffect::Ignored
        );
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let mut n = normalizer();
        n.apply(&track_event(json!(1000)));
        let before = n.current_state();
        assert_eq!(
            n.apply(&DaemonEvent::new("shuffle_context", json!({"value": true}))),
            EventEffect::Ignored
        );
        assert_eq!(n.current_state(), before);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut n = normalizer();
        n.apply(&track_event(json!(1000)));
        n.reset();
        assert_eq!(n.current_state(), PlaybackState::new(AudioQuality::new(320)));
    }

    #[test]
    fn test_parse_event() {
        let event = DaemonEvent::parse(r#"{"type":"paused","data":{"uri":"x"}}"#).unwrap();
        assert_eq!(event.kind, "paused");
        assert_eq!(event.data["uri"], "x");

        let bare = DaemonEvent::parse(r#"{"type":"playing"}"#).unwrap();
        assert_eq!(bare.data, Value::Null);

        assert!(DaemonEvent::parse("not json").is_err());
    }
}

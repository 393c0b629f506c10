//! Configuration de l'adaptateur Spotify
//!
//! La configuration est construite en trois couches, de la moins prioritaire
//! à la plus prioritaire :
//!
//! 1. la configuration par défaut intégrée (`pmospotify.yaml`) ;
//! 2. le fichier `config.yaml` du répertoire de configuration ;
//! 3. les variables d'environnement `PMOSPOTIFY_CONFIG__SECTION__CLE=valeur`.
//!
//! La configuration est en lecture seule : l'adaptateur ne réécrit jamais
//! le fichier.
//!
//! ```no_run
//! use pmospotify::Config;
//!
//! let config = Config::load_config("")?;
//! let settings = config.settings()?;
//! println!("Daemon: {}", settings.daemon.base_url);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Result, anyhow};
use dirs::home_dir;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::{env, fs, path::Path};
use tracing::info;

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmospotify.yaml");

const ENV_CONFIG_DIR: &str = "PMOSPOTIFY_CONFIG";
const ENV_PREFIX: &str = "PMOSPOTIFY_CONFIG__";
const DEFAULT_CONFIG_DIR: &str = ".pmospotify";

const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";

/// Configuration chargée (arbre YAML fusionné)
#[derive(Debug, Clone)]
pub struct Config {
    config_dir: String,
    data: Value,
}

impl Config {
    /// Cherche le répertoire de configuration dans l'ordre :
    /// argument, variable `PMOSPOTIFY_CONFIG`, `./.pmospotify`, `~/.pmospotify`
    fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        if Path::new(DEFAULT_CONFIG_DIR).exists() {
            return DEFAULT_CONFIG_DIR.to_string();
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(DEFAULT_CONFIG_DIR);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        DEFAULT_CONFIG_DIR.to_string()
    }

    /// Charge la configuration depuis le répertoire indiqué (ou le répertoire
    /// trouvé automatiquement si `directory` est vide)
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        info!(config_dir = %config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let external = match fs::read(&config_file_path) {
            Ok(data) => {
                info!(config_file = %config_file_path.display(), "Loaded config file");
                Some(serde_yaml::from_slice::<Value>(&data)?)
            }
            Err(_) => {
                info!(
                    config_file = %config_file_path.display(),
                    "Config file not found, using default embedded config"
                );
                None
            }
        };

        let mut config = Self::layered(external.as_ref())?;
        Self::apply_env_overrides(&mut config.data, env::vars());
        config.config_dir = config_dir;
        Ok(config)
    }

    /// Construit une configuration depuis un document YAML fusionné avec
    /// les valeurs par défaut (sans fichier ni variables d'environnement)
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let external: Value = serde_yaml::from_str(yaml)?;
        Self::layered(Some(&external))
    }

    fn layered(external: Option<&Value>) -> Result<Self> {
        let mut data: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        if let Some(external) = external {
            merge_yaml(&mut data, &lower_keys_value(external.clone()));
        }
        Ok(Self {
            config_dir: String::new(),
            data: lower_keys_value(data),
        })
    }

    /// Répertoire de configuration effectivement utilisé
    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    /// Récupère une valeur à partir d'un chemin (ex: `&["spotify", "oauth"]`)
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let mut current = &self.data;
        for (i, key) in path.iter().enumerate() {
            let Value::Mapping(map) = current else {
                return Err(anyhow!("Path {} is not a mapping", path[..i].join(".")));
            };
            current = map
                .get(Value::String(key.to_lowercase()))
                .ok_or_else(|| anyhow!("Path {} does not exist", path[..=i].join(".")))?;
        }
        Ok(current.clone())
    }

    /// Vue typée de la section `spotify`
    pub fn settings(&self) -> Result<SpotifySettings> {
        let section = self.get_value(&["spotify"])?;
        Ok(serde_yaml::from_value(section)?)
    }

    /// Niveau de log minimum (`host.logger.min_level`)
    pub fn get_log_min_level(&self) -> String {
        match self.get_value(&["host", "logger", "min_level"]) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => DEFAULT_LOG_MIN_LEVEL.to_string(),
        }
    }

    fn apply_env_overrides(config: &mut Value, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                let key_path = stripped.split("__").collect::<Vec<_>>();
                if let Err(e) = set_value_internal(config, &key_path, convert_env_value(&value)) {
                    tracing::warn!(variable = %key, "Ignoring config override: {}", e);
                }
            }
        }
    }
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((first, rest)) = path.split_first() else {
        *data = value;
        return Ok(());
    };
    let Value::Mapping(map) = data else {
        return Err(anyhow!("Current node is not a map"));
    };
    let key = Value::String(first.to_lowercase());
    if rest.is_empty() {
        map.insert(key, value);
    } else {
        let entry = map.entry(key).or_insert(Value::Mapping(Mapping::new()));
        set_value_internal(entry, rest, value)?;
    }
    Ok(())
}

fn convert_env_value(value: &str) -> Value {
    serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lower_keys_value(v))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

/// Fusionne `external` dans `default` : les mappings sont fusionnés clé par
/// clé, les scalaires et séquences sont remplacés
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(),
    }
}

/// Paramètres typés de l'adaptateur (section `spotify`)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpotifySettings {
    pub daemon: DaemonSettings,
    pub playback: PlaybackSettings,
    pub oauth: OAuthSettings,
    pub webapi: WebApiSettings,
    pub device: DeviceSettings,
}

/// Démon Spotify Connect local
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DaemonSettings {
    /// URL de base de l'API HTTP de contrôle
    pub base_url: String,
    /// URL du flux d'événements WebSocket
    pub events_url: String,
    pub request_timeout_secs: u64,
    /// Délai entre deux tentatives de reconnexion
    pub reconnect_delay_ms: u64,
    /// Délai entre la demande de session volatile et le premier push
    pub settle_delay_ms: u64,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9876".to_string(),
            events_url: "ws://localhost:9876/events".to_string(),
            request_timeout_secs: 5,
            reconnect_delay_ms: 2000,
            settle_delay_ms: 100,
        }
    }
}

/// Qualité de lecture
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Débit configuré sur le démon (kbps)
    pub bitrate: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self { bitrate: 320 }
    }
}

/// Service d'échange de tokens OAuth
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OAuthSettings {
    pub base_url: String,
    /// Refresh token ; vide = navigation désactivée
    pub refresh_token: String,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            base_url: "https://oauth-performer.prod.vlmapi.io".to_string(),
            refresh_token: String::new(),
        }
    }
}

impl OAuthSettings {
    /// Refresh token s'il est configuré
    pub fn refresh_token(&self) -> Option<&str> {
        let token = self.refresh_token.trim();
        (!token.is_empty()).then_some(token)
    }
}

/// Web API Spotify
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WebApiSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Pays de l'utilisateur (ISO 3166-1 alpha-2) ; vide = lu depuis `/me`
    pub country: String,
    pub root_cache_ttl_secs: u64,
}

impl Default for WebApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.spotify.com/v1".to_string(),
            request_timeout_secs: 10,
            country: String::new(),
            root_cache_ttl_secs: 3600,
        }
    }
}

impl WebApiSettings {
    /// Pays configuré s'il n'est pas vide
    pub fn country(&self) -> Option<&str> {
        let country = self.country.trim();
        (!country.is_empty()).then_some(country)
    }
}

/// Identité du périphérique Spotify Connect (exposée à l'hôte)
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceSettings {
    pub name: String,
    pub icon: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            name: "PMOMusic".to_string(),
            icon: "avr".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_match_typed_defaults() {
        let config = Config::from_yaml_str("{}").unwrap();
        let settings = config.settings().unwrap();
        assert_eq!(settings, SpotifySettings::default());
        assert_eq!(config.get_log_min_level(), "INFO");
    }

    #[test]
    fn test_external_file_overrides_defaults() {
        let config = Config::from_yaml_str(
            "spotify:\n  Playback:\n    Bitrate: 160\n  oauth:\n    refresh_token: abc\n",
        )
        .unwrap();
        let settings = config.settings().unwrap();
        assert_eq!(settings.playback.bitrate, 160);
        assert_eq!(settings.oauth.refresh_token(), Some("abc"));
        // Les clés non surchargées gardent leur valeur par défaut
        assert_eq!(settings.daemon.base_url, "http://127.0.0.1:9876");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::from_yaml_str("{}").unwrap();
        let vars = vec![
            (
                "PMOSPOTIFY_CONFIG__SPOTIFY__WEBAPI__COUNTRY".to_string(),
                "FR".to_string(),
            ),
            (
                "PMOSPOTIFY_CONFIG__SPOTIFY__DAEMON__RECONNECT_DELAY_MS".to_string(),
                "500".to_string(),
            ),
            ("UNRELATED".to_string(), "x".to_string()),
        ];
        Config::apply_env_overrides(&mut config.data, vars);

        let settings = config.settings().unwrap();
        assert_eq!(settings.webapi.country(), Some("FR"));
        assert_eq!(settings.daemon.reconnect_delay_ms, 500);
    }

    #[test]
    fn test_blank_refresh_token_is_none() {
        let config =
            Config::from_yaml_str("spotify:\n  oauth:\n    refresh_token: \"  \"\n").unwrap();
        assert_eq!(config.settings().unwrap().oauth.refresh_token(), None);
    }

    #[test]
    fn test_get_value_missing_path() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert!(config.get_value(&["spotify", "nope"]).is_err());
    }

    #[test]
    fn test_load_config_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "spotify:\n  device:\n    name: Salon\n",
        )
        .unwrap();

        let config = Config::load_config(&dir.path().to_string_lossy()).unwrap();
        assert_eq!(config.settings().unwrap().device.name, "Salon");
        assert_eq!(config.config_dir(), dir.path().to_string_lossy());
    }
}

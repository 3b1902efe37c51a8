//! Server configuration loading from file and environment variables.

use parlance_voice::VoiceConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Media directory settings.
    #[serde(default)]
    pub media: MediaConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// External voice engine settings (STT, LLM, TTS).
    #[serde(default)]
    pub voice: VoiceConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Media directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory for synthesized audio clips (served at `/media`).
    #[serde(default = "default_media_dir")]
    pub dir: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "parlance_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_media_dir() -> String {
    "media".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: default_media_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `PARLANCE_HOST` overrides `server.host`
/// - `PARLANCE_PORT` overrides `server.port`
/// - `PARLANCE_MEDIA_DIR` overrides `media.dir`
/// - `PARLANCE_LOG_LEVEL` overrides `logging.level`
/// - `PARLANCE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `PARLANCE_STT_API_KEY` / `PARLANCE_LLM_API_KEY` / `PARLANCE_TTS_API_KEY`
///   override the engine keys, so secrets need not live in the file
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("PARLANCE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("PARLANCE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(dir) = std::env::var("PARLANCE_MEDIA_DIR") {
        config.media.dir = dir;
    }
    if let Ok(level) = std::env::var("PARLANCE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("PARLANCE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(key) = std::env::var("PARLANCE_STT_API_KEY") {
        config.voice.stt.api_key = key;
    }
    if let Ok(key) = std::env::var("PARLANCE_LLM_API_KEY") {
        config.voice.llm.api_key = key;
    }
    if let Ok(key) = std::env::var("PARLANCE_TTS_API_KEY") {
        config.voice.tts.api_key = key;
    }

    Ok(config)
}

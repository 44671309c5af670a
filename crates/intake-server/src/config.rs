//! Server configuration loading from file and environment variables.

use intake_pipeline::PipelineConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Pipeline settings (API endpoint, TTS engine, storage directories).
    #[serde(default)]
    pub pipeline: PipelineConfig,
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

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "intake_server=debug,info").
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
/// - `INTAKE_HOST` overrides `server.host`
/// - `INTAKE_PORT` overrides `server.port`
/// - `INTAKE_LOG_LEVEL` overrides `logging.level`
/// - `INTAKE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `INTAKE_API_BASE_URL` overrides `pipeline.api.base_url`
/// - `OPENAI_API_KEY` overrides `pipeline.api.api_key`
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
    if let Ok(host) = std::env::var("INTAKE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("INTAKE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(level) = std::env::var("INTAKE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("INTAKE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Ok(base_url) = std::env::var("INTAKE_API_BASE_URL") {
        config.pipeline.api.base_url = base_url;
    }
    if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
        config.pipeline.api.api_key = api_key;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_pipeline::TtsEngine;

    #[test]
    fn full_config_parses() {
        let config: Config = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [logging]
            level = "debug"
            json = true

            [pipeline.api]
            base_url = "http://localhost:8000/v1"
            transcription_model = "whisper-large-v3"

            [pipeline.tts]
            engine = "piper"
            voice_path = "voices/en_US-lessac-medium.onnx"

            [pipeline.storage]
            json_dir = "/var/lib/intake/json"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.logging.json);
        assert_eq!(config.pipeline.api.base_url, "http://localhost:8000/v1");
        assert_eq!(config.pipeline.tts.engine, TtsEngine::Piper);
        assert_eq!(
            config.pipeline.storage.json_dir,
            std::path::PathBuf::from("/var/lib/intake/json")
        );
        // Untouched sections keep their defaults.
        assert_eq!(config.pipeline.api.chat_model, "gpt-4o");
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }
}

//! Pipeline configuration: the remote API endpoint, the local TTS engine,
//! and the directories the pipeline reads from and writes to.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

/// Connection settings for the OpenAI-compatible API used by transcription,
/// intent analysis, and document extraction.
#[derive(Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token. Usually injected via `OPENAI_API_KEY` rather than the
    /// config file.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    /// Model used for both intent analysis and vision extraction.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            transcription_model: default_transcription_model(),
            chat_model: default_chat_model(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("transcription_model", &self.transcription_model)
            .field("chat_model", &self.chat_model)
            .finish()
    }
}

/// Which local TTS engine renders spoken replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtsEngine {
    /// Piper (ONNX-based, needs a voice model file).
    Piper,
    /// espeak-ng, the cross-platform fallback.
    #[default]
    Espeak,
    /// No synthesis; the pipeline returns text-only replies.
    Disabled,
}

fn default_piper_binary() -> PathBuf {
    PathBuf::from("piper")
}

fn default_espeak_binary() -> PathBuf {
    PathBuf::from("espeak-ng")
}

fn default_speed() -> f32 {
    1.0
}

/// Local TTS engine settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub engine: TtsEngine,
    #[serde(default = "default_piper_binary")]
    pub piper_binary: PathBuf,
    #[serde(default = "default_espeak_binary")]
    pub espeak_binary: PathBuf,
    /// Voice model file for piper. Required when `engine = "piper"`.
    #[serde(default)]
    pub voice_path: Option<PathBuf>,
    /// Speech speed multiplier (1.0 is normal). Must be within 0.1–10.0.
    #[serde(default = "default_speed")]
    pub speed: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            engine: TtsEngine::default(),
            piper_binary: default_piper_binary(),
            espeak_binary: default_espeak_binary(),
            voice_path: None,
            speed: default_speed(),
        }
    }
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("outputs/audio")
}

fn default_json_dir() -> PathBuf {
    PathBuf::from("outputs/json")
}

/// Directories the pipeline works in.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Where uploads are staged before processing.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    /// Where synthesized audio replies are written.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,
    /// Where pipeline reports are persisted as JSON.
    #[serde(default = "default_json_dir")]
    pub json_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            audio_dir: default_audio_dir(),
            json_dir: default_json_dir(),
        }
    }
}

impl StorageConfig {
    /// Creates every configured directory that does not exist yet.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.temp_dir, &self.audio_dir, &self.json_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Everything the orchestrator needs to run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_api_key() {
        let config = ApiConfig {
            api_key: "sk-secret".to_string(),
            ..ApiConfig::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("[REDACTED]"));
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config: PipelineConfig = toml::from_str("").unwrap();
        assert_eq!(config.api.base_url, "https://api.openai.com/v1");
        assert_eq!(config.api.transcription_model, "whisper-1");
        assert_eq!(config.tts.engine, TtsEngine::Espeak);
        assert_eq!(config.storage.json_dir, PathBuf::from("outputs/json"));
    }
}

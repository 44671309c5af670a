//! Local text-to-speech rendering via subprocess engines.
//!
//! Two engines are supported: piper (reads text on stdin, writes raw s16le
//! PCM to stdout with `--output_raw`) and espeak-ng (writes WAV to stdout
//! with `--stdout`). The raw PCM is wrapped into a mono 16-bit WAV file in
//! the audio output directory.
//!
//! A missing engine binary is not an error: the pipeline degrades to a
//! text-only reply so the transcript and analysis still reach the caller.

use crate::config::{TtsConfig, TtsEngine};
use crate::error::PipelineError;
use hound::{SampleFormat, WavSpec, WavWriter};
use intake_types::SpokenReply;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

/// Maximum text input size for TTS (64 KiB). Prevents resource exhaustion
/// from oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for TTS process execution.
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

/// Sample rate of the PCM both engines emit at their defaults.
const OUTPUT_SAMPLE_RATE: u32 = 22050;

/// Size of the WAV header espeak-ng prepends to its stdout stream.
const WAV_HEADER_BYTES: usize = 44;

#[derive(Debug, Clone)]
pub struct Synthesizer {
    config: TtsConfig,
    audio_dir: PathBuf,
}

enum Rendered {
    Pcm(Vec<u8>),
    /// The engine could not run at all; carries the reason for the log.
    Unavailable(String),
}

impl Synthesizer {
    pub fn new(config: TtsConfig, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            audio_dir: audio_dir.into(),
        }
    }

    /// Renders `text` to a WAV file named `output_filename` in the audio
    /// directory. Returns a text-only reply when no engine is available.
    pub async fn speak(
        &self,
        text: &str,
        output_filename: &str,
    ) -> Result<SpokenReply, PipelineError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(PipelineError::Synthesis(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        let rendered = match self.config.engine {
            TtsEngine::Disabled => {
                Rendered::Unavailable("TTS engine disabled in configuration".to_string())
            }
            TtsEngine::Piper => self.render_piper(text).await?,
            TtsEngine::Espeak => self.render_espeak(text).await?,
        };

        match rendered {
            Rendered::Pcm(pcm) => {
                tokio::fs::create_dir_all(&self.audio_dir).await.map_err(|e| {
                    PipelineError::Synthesis(format!("failed to create audio dir: {}", e))
                })?;
                let path = self.audio_dir.join(output_filename);
                write_wav(&path, &pcm)?;

                info!(file = %path.display(), pcm_bytes = pcm.len(), "spoken reply written");
                Ok(SpokenReply {
                    text: text.to_string(),
                    audio_file: Some(path.to_string_lossy().into_owned()),
                    engine: match self.config.engine {
                        TtsEngine::Piper => "piper".to_string(),
                        _ => "espeak-ng".to_string(),
                    },
                    text_length: text.len(),
                })
            }
            Rendered::Unavailable(reason) => {
                warn!(%reason, "TTS unavailable, returning text-only reply");
                Ok(SpokenReply {
                    text: text.to_string(),
                    audio_file: None,
                    engine: "text_only".to_string(),
                    text_length: text.len(),
                })
            }
        }
    }

    async fn render_piper(&self, text: &str) -> Result<Rendered, PipelineError> {
        let model_path = match &self.config.voice_path {
            Some(path) => path.clone(),
            None => {
                return Ok(Rendered::Unavailable(
                    "piper engine configured without tts.voice_path".to_string(),
                ))
            }
        };

        if !model_path.exists() {
            return Ok(Rendered::Unavailable(format!(
                "voice model not found: {:?}",
                model_path
            )));
        }

        if self.config.speed < 0.1 || self.config.speed > 10.0 {
            return Err(PipelineError::Config(
                "speed must be between 0.1 and 10.0".to_string(),
            ));
        }

        let mut command = Command::new(&self.config.piper_binary);
        command
            .arg("--model")
            .arg(&model_path)
            .arg("--output_raw")
            // Length scale is roughly the inverse of speed: 2.0 (faster)
            // maps to a 0.5 scale (shorter).
            .arg("--length_scale")
            .arg((1.0 / self.config.speed).to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Rendered::Unavailable(format!(
                    "piper binary not found: {:?}",
                    self.config.piper_binary
                )))
            }
            Err(e) => {
                return Err(PipelineError::Synthesis(format!(
                    "failed to spawn piper: {}",
                    e
                )))
            }
        };

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PipelineError::Synthesis("failed to open stdin".to_string()))?;
        let text_owned = text.to_string();

        // Write stdin from a task so a full stdout buffer cannot deadlock us.
        let write_task = tokio::spawn(async move { stdin.write_all(text_owned.as_bytes()).await });

        let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                PipelineError::Synthesis(format!(
                    "TTS process timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| PipelineError::Synthesis(format!("failed to wait for piper: {}", e)))?;

        match write_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(PipelineError::Synthesis(format!(
                    "failed to write to piper stdin: {}",
                    e
                )))
            }
            Err(e) => {
                return Err(PipelineError::Synthesis(format!("stdin task failed: {}", e)))
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Synthesis(format!("piper failed: {}", stderr)));
        }

        Ok(Rendered::Pcm(output.stdout))
    }

    /// espeak-ng outputs WAV on stdout via `--stdout`; the header is
    /// stripped so both engines hand back raw PCM.
    async fn render_espeak(&self, text: &str) -> Result<Rendered, PipelineError> {
        let mut command = Command::new(&self.config.espeak_binary);
        command
            .arg("--stdout")
            .arg(text)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Rendered::Unavailable(format!(
                    "espeak-ng binary not found: {:?}",
                    self.config.espeak_binary
                )))
            }
            Err(e) => {
                return Err(PipelineError::Synthesis(format!(
                    "failed to spawn espeak-ng: {}",
                    e
                )))
            }
        };

        let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                PipelineError::Synthesis(format!(
                    "TTS process timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| {
                PipelineError::Synthesis(format!("failed to wait for espeak-ng: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Synthesis(format!(
                "espeak-ng failed: {}",
                stderr
            )));
        }

        let wav_data = output.stdout;
        if wav_data.len() > WAV_HEADER_BYTES {
            Ok(Rendered::Pcm(wav_data[WAV_HEADER_BYTES..].to_vec()))
        } else {
            Ok(Rendered::Pcm(wav_data))
        }
    }
}

/// Wraps raw s16le PCM into a mono 16-bit WAV file.
fn write_wav(path: &Path, pcm: &[u8]) -> Result<(), PipelineError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: OUTPUT_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .map_err(|e| PipelineError::Synthesis(format!("failed to create WAV file: {}", e)))?;

    for chunk in pcm.chunks_exact(2) {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        writer
            .write_sample(sample)
            .map_err(|e| PipelineError::Synthesis(format!("failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| PipelineError::Synthesis(format!("failed to finalize WAV file: {}", e)))?;

    Ok(())
}

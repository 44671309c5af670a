//! Speech-to-text over a Whisper-compatible transcription endpoint.

use crate::config::ApiConfig;
use crate::error::PipelineError;
use intake_types::{Transcript, TranscriptSegment};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Maximum audio input size accepted by the transcription API (25 MiB).
const MAX_AUDIO_INPUT_BYTES: usize = 25 * 1024 * 1024;

/// Timeout for one transcription request.
const TRANSCRIBE_TIMEOUT: Duration = Duration::from_secs(120);

/// Fallback segment length when the API reports no duration.
const FALLBACK_SEGMENT_SECS: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct Transcriber {
    client: reqwest::Client,
    config: ApiConfig,
}

/// The `verbose_json` response shape. Everything beyond `text` is optional;
/// some compatible servers omit language, duration, or segments entirely.
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    segments: Vec<VerboseSegment>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
}

impl Transcriber {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Sends the audio file to the transcription endpoint and returns the
    /// parsed transcript.
    pub async fn transcribe(&self, audio_path: &Path) -> Result<Transcript, PipelineError> {
        let data = tokio::fs::read(audio_path).await.map_err(|e| {
            PipelineError::Transcription(format!("failed to read {:?}: {}", audio_path, e))
        })?;

        if data.len() > MAX_AUDIO_INPUT_BYTES {
            return Err(PipelineError::Transcription(format!(
                "audio exceeds maximum size: {} bytes (limit: {} bytes)",
                data.len(),
                MAX_AUDIO_INPUT_BYTES
            )));
        }

        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        info!(file = %file_name, bytes = data.len(), "transcribing audio");

        let form = reqwest::multipart::Form::new()
            .text("model", self.config.transcription_model.clone())
            .text("response_format", "verbose_json")
            .part("file", reqwest::multipart::Part::bytes(data).file_name(file_name));

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .timeout(TRANSCRIBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| PipelineError::Transcription(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Transcription(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let verbose: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| PipelineError::Transcription(format!("invalid response body: {}", e)))?;

        let transcript = into_transcript(verbose);
        info!(
            language = %transcript.language,
            chars = transcript.text.len(),
            "transcription complete"
        );
        Ok(transcript)
    }
}

fn into_transcript(verbose: VerboseTranscription) -> Transcript {
    let text = verbose.text.trim().to_string();
    let duration_secs = verbose.duration.unwrap_or(0.0);

    // Servers that skip segment timestamps get one whole-file segment.
    let segments = if verbose.segments.is_empty() {
        vec![TranscriptSegment {
            start: 0.0,
            end: if duration_secs > 0.0 {
                duration_secs
            } else {
                FALLBACK_SEGMENT_SECS
            },
            text: text.clone(),
        }]
    } else {
        verbose
            .segments
            .into_iter()
            .map(|s| TranscriptSegment {
                start: s.start,
                end: s.end,
                text: s.text.trim().to_string(),
            })
            .collect()
    };

    Transcript {
        text,
        language: verbose.language.unwrap_or_else(|| "unknown".to_string()),
        duration_secs,
        segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_optional_fields_collapse_to_one_segment() {
        let verbose: VerboseTranscription =
            serde_json::from_str(r#"{"text": " hello there "}"#).unwrap();
        let transcript = into_transcript(verbose);

        assert_eq!(transcript.text, "hello there");
        assert_eq!(transcript.language, "unknown");
        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(transcript.segments[0].end, FALLBACK_SEGMENT_SECS);
    }

    #[test]
    fn provided_segments_are_kept() {
        let verbose: VerboseTranscription = serde_json::from_str(
            r#"{
                "text": "one two",
                "language": "english",
                "duration": 3.5,
                "segments": [
                    {"start": 0.0, "end": 1.5, "text": " one"},
                    {"start": 1.5, "end": 3.5, "text": " two"}
                ]
            }"#,
        )
        .unwrap();
        let transcript = into_transcript(verbose);

        assert_eq!(transcript.language, "english");
        assert_eq!(transcript.duration_secs, 3.5);
        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.segments[1].text, "two");
    }
}

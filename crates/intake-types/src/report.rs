//! Stage records and the pipeline reports assembled by the orchestrator.

use crate::analysis::{AnalysisRecord, Confidence, EntitySet, Sentiment};
use crate::extraction::ExtractionRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of a single pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Error,
}

/// One timed stage: its status, its output when it succeeded, and the error
/// message when it did not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord<T> {
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_secs: f64,
}

impl<T> StageRecord<T> {
    pub fn success(output: T, elapsed: Duration) -> Self {
        Self {
            status: StageStatus::Success,
            output: Some(output),
            error: None,
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    pub fn failure(error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            status: StageStatus::Error,
            output: None,
            error: Some(error.into()),
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == StageStatus::Success
    }
}

/// A transcription of one audio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// Detected language, or `"unknown"` when the API omitted it.
    pub language: String,
    pub duration_secs: f64,
    pub segments: Vec<TranscriptSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// A synthesized spoken reply.
///
/// `audio_file` is `None` when no TTS engine was available and the pipeline
/// degraded to a text-only reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpokenReply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
    /// Engine that produced the audio (`piper`, `espeak-ng`) or `text_only`.
    pub engine: String,
    pub text_length: usize,
}

/// Seconds spent in each stage. Stages that did not run stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_analysis_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_secs: Option<f64>,
    pub total_secs: f64,
}

/// Closing metadata block on a pipeline summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetadata {
    pub total_steps: u32,
    pub pipeline_type: String,
    pub success: bool,
    /// Total wall-clock time, rounded to centiseconds.
    pub processing_time_seconds: f64,
}

/// Either the summary of a completed pipeline or the error that stopped it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FinalOutput<T> {
    Completed(T),
    Failed { error: String },
}

impl<T> FinalOutput<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Condensed result of the audio pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSummary {
    pub original_audio: String,
    pub transcribed_text: String,
    pub detected_intent: String,
    pub extracted_entities: EntitySet,
    pub sentiment: Sentiment,
    pub response_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_audio: Option<String>,
    pub confidence: Confidence,
    pub processing_steps: Vec<String>,
    pub metadata: SummaryMetadata,
}

/// Condensed result of the image pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub input_image: String,
    pub document_type: crate::extraction::DocumentType,
    pub extracted_text: String,
    pub structured_fields: crate::extraction::StructuredFields,
    pub extracted_entities: Vec<String>,
    pub extraction_confidence: Confidence,
    pub processing_methods: Vec<String>,
    pub processing_steps: Vec<String>,
    pub metadata: SummaryMetadata,
}

/// Per-stage records of the audio pipeline, in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSteps {
    pub transcription: StageRecord<Transcript>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_analysis: Option<StageRecord<AnalysisRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_to_speech: Option<StageRecord<SpokenReply>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSteps {
    pub extraction: StageRecord<ExtractionRecord>,
}

/// Full report for one audio upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioReport {
    pub input_file: String,
    pub generated_at: DateTime<Utc>,
    pub steps: AudioSteps,
    pub final_output: FinalOutput<AudioSummary>,
    pub performance: Performance,
    /// Where the report was persisted; set after the write succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_json: Option<String>,
}

/// Full report for one image upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageReport {
    pub input_file: String,
    pub generated_at: DateTime<Utc>,
    pub steps: ImageSteps,
    pub final_output: FinalOutput<ImageSummary>,
    pub performance: Performance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_json: Option<String>,
}

/// A finished pipeline run, tagged by which pipeline produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pipeline_type", rename_all = "snake_case")]
pub enum PipelineReport {
    Audio(AudioReport),
    Image(ImageReport),
}

impl PipelineReport {
    /// The input file this report describes.
    pub fn input_file(&self) -> &str {
        match self {
            Self::Audio(r) => &r.input_file,
            Self::Image(r) => &r.input_file,
        }
    }

    /// Whether the pipeline reached a completed summary.
    pub fn succeeded(&self) -> bool {
        match self {
            Self::Audio(r) => r.final_output.is_completed(),
            Self::Image(r) => r.final_output.is_completed(),
        }
    }

    /// Records where the report was persisted.
    pub fn set_output_json(&mut self, path: impl Into<String>) {
        let path = Some(path.into());
        match self {
            Self::Audio(r) => r.output_json = path,
            Self::Image(r) => r.output_json = path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_json_is_tagged_by_pipeline_type() {
        let report = PipelineReport::Image(ImageReport {
            input_file: "card.png".into(),
            generated_at: Utc::now(),
            steps: ImageSteps {
                extraction: StageRecord::failure("boom", Duration::from_millis(10)),
            },
            final_output: FinalOutput::Failed {
                error: "Document extraction failed".into(),
            },
            performance: Performance {
                extraction_secs: Some(0.01),
                total_secs: 0.01,
                ..Performance::default()
            },
            output_json: None,
        });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pipeline_type"], "image");
        assert_eq!(json["steps"]["extraction"]["status"], "error");
        assert_eq!(json["final_output"]["error"], "Document extraction failed");
        assert!(json.get("output_json").is_none());
        assert!(!report.succeeded());
    }

    #[test]
    fn failed_stage_keeps_error_and_drops_output() {
        let record: StageRecord<Transcript> =
            StageRecord::failure("request failed", Duration::from_secs(1));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "request failed");
        assert!(json.get("output").is_none());
    }
}

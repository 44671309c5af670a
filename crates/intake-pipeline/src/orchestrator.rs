//! The pipeline orchestrator: routes an input file to the audio or image
//! pipeline, times every stage, and persists the assembled report.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::extract::DocumentExtractor;
use crate::interpret::IntentAnalyzer;
use crate::synthesize::Synthesizer;
use crate::transcribe::Transcriber;
use chrono::Utc;
use intake_types::{
    AudioReport, AudioSteps, AudioSummary, FinalOutput, ImageReport, ImageSteps, ImageSummary,
    MediaKind, Performance, PipelineReport, StageRecord, SummaryMetadata,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Hard input cap applied before any stage runs (25 MiB).
const MAX_INPUT_BYTES: u64 = 25 * 1024 * 1024;

/// Reply used when the analysis produced no suggested response.
const DEFAULT_RESPONSE: &str = "Thank you for your message. I understand your request.";

pub struct Orchestrator {
    transcriber: Transcriber,
    analyzer: IntentAnalyzer,
    synthesizer: Synthesizer,
    extractor: DocumentExtractor,
    json_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig) -> Self {
        let PipelineConfig { api, tts, storage } = config;
        info!(tts_engine = ?tts.engine, "pipeline orchestrator ready");
        Self {
            transcriber: Transcriber::new(api.clone()),
            analyzer: IntentAnalyzer::new(api.clone()),
            synthesizer: Synthesizer::new(tts, storage.audio_dir),
            extractor: DocumentExtractor::new(api),
            json_dir: storage.json_dir,
        }
    }

    /// Main entry point: classifies the file, runs the matching pipeline,
    /// and persists the report to the JSON output directory.
    pub async fn process_file(&self, path: &Path) -> Result<PipelineReport, PipelineError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| PipelineError::InputNotFound(path.display().to_string()))?;

        if metadata.len() > MAX_INPUT_BYTES {
            return Err(PipelineError::InputTooLarge {
                actual: metadata.len(),
                limit: MAX_INPUT_BYTES,
            });
        }

        let kind = MediaKind::from_path(path).ok_or_else(|| {
            PipelineError::UnsupportedMedia(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("<none>")
                    .to_string(),
            )
        })?;

        info!(file = %path.display(), kind = kind.label(), "processing file");

        let mut report = match kind {
            MediaKind::Audio => PipelineReport::Audio(self.run_audio(path).await),
            MediaKind::Image => PipelineReport::Image(self.run_image(path).await),
        };

        let output_path = self.persist(&report, path).await?;
        info!(report = %output_path.display(), success = report.succeeded(), "report persisted");
        report.set_output_json(output_path.to_string_lossy().into_owned());
        Ok(report)
    }

    async fn run_audio(&self, path: &Path) -> AudioReport {
        let started = Instant::now();
        let mut performance = Performance::default();
        let input_file = path.display().to_string();

        info!("audio pipeline step 1/4: speech to text");
        let stage = Instant::now();
        let transcription = self.transcriber.transcribe(path).await;
        let elapsed = stage.elapsed();
        performance.transcription_secs = Some(elapsed.as_secs_f64());

        let transcript = match transcription {
            Ok(transcript) => transcript,
            Err(e) => {
                performance.total_secs = started.elapsed().as_secs_f64();
                return AudioReport {
                    input_file,
                    generated_at: Utc::now(),
                    steps: AudioSteps {
                        transcription: StageRecord::failure(e.to_string(), elapsed),
                        intent_analysis: None,
                        text_to_speech: None,
                    },
                    final_output: FinalOutput::Failed {
                        error: "Speech-to-text failed".to_string(),
                    },
                    performance,
                    output_json: None,
                };
            }
        };
        let transcription_record = StageRecord::success(transcript.clone(), elapsed);

        info!("audio pipeline step 2/4: intent analysis");
        let stage = Instant::now();
        let analysis_result = self.analyzer.analyze(&transcript.text).await;
        let elapsed = stage.elapsed();
        performance.intent_analysis_secs = Some(elapsed.as_secs_f64());

        let analysis = match analysis_result {
            Ok(analysis) => analysis,
            Err(e) => {
                performance.total_secs = started.elapsed().as_secs_f64();
                return AudioReport {
                    input_file,
                    generated_at: Utc::now(),
                    steps: AudioSteps {
                        transcription: transcription_record,
                        intent_analysis: Some(StageRecord::failure(e.to_string(), elapsed)),
                        text_to_speech: None,
                    },
                    final_output: FinalOutput::Failed {
                        error: "Intent analysis failed".to_string(),
                    },
                    performance,
                    output_json: None,
                };
            }
        };
        let analysis_record = StageRecord::success(analysis.clone(), elapsed);

        // Step 3 is pure selection: the reply text comes out of the analysis.
        info!("audio pipeline step 3/4: response generation");
        let response_text = if analysis.suggested_response.trim().is_empty() {
            DEFAULT_RESPONSE.to_string()
        } else {
            analysis.suggested_response.clone()
        };

        info!("audio pipeline step 4/4: speech synthesis");
        let reply_filename = format!("response_{}.wav", file_stem(path));
        let stage = Instant::now();
        let synthesis = self.synthesizer.speak(&response_text, &reply_filename).await;
        let elapsed = stage.elapsed();
        performance.synthesis_secs = Some(elapsed.as_secs_f64());

        // A synthesis failure leaves the transcript and analysis intact;
        // the reply just stays text-only.
        let (tts_record, response_audio) = match synthesis {
            Ok(reply) => {
                let audio = reply.audio_file.clone();
                (StageRecord::success(reply, elapsed), audio)
            }
            Err(e) => {
                warn!(error = %e, "speech synthesis failed, reply stays text-only");
                (StageRecord::failure(e.to_string(), elapsed), None)
            }
        };

        let total = started.elapsed().as_secs_f64();
        performance.total_secs = total;

        AudioReport {
            input_file: input_file.clone(),
            generated_at: Utc::now(),
            steps: AudioSteps {
                transcription: transcription_record,
                intent_analysis: Some(analysis_record),
                text_to_speech: Some(tts_record),
            },
            final_output: FinalOutput::Completed(AudioSummary {
                original_audio: input_file,
                transcribed_text: transcript.text,
                detected_intent: analysis.intent,
                extracted_entities: analysis.entities,
                sentiment: analysis.sentiment,
                response_text,
                response_audio,
                confidence: analysis.confidence,
                processing_steps: vec![
                    "speech_to_text".to_string(),
                    "intent_analysis".to_string(),
                    "response_generation".to_string(),
                    "text_to_speech".to_string(),
                ],
                metadata: SummaryMetadata {
                    total_steps: 4,
                    pipeline_type: "complete_audio_processing".to_string(),
                    success: true,
                    processing_time_seconds: round_centis(total),
                },
            }),
            performance,
            output_json: None,
        }
    }

    async fn run_image(&self, path: &Path) -> ImageReport {
        let started = Instant::now();
        let mut performance = Performance::default();
        let input_file = path.display().to_string();

        info!("image pipeline step 1/1: document extraction");
        let stage = Instant::now();
        let extraction = self.extractor.extract(path).await;
        let elapsed = stage.elapsed();
        performance.extraction_secs = Some(elapsed.as_secs_f64());

        let record = match extraction {
            Ok(record) => record,
            Err(e) => {
                performance.total_secs = started.elapsed().as_secs_f64();
                return ImageReport {
                    input_file,
                    generated_at: Utc::now(),
                    steps: ImageSteps {
                        extraction: StageRecord::failure(e.to_string(), elapsed),
                    },
                    final_output: FinalOutput::Failed {
                        error: "Document extraction failed".to_string(),
                    },
                    performance,
                    output_json: None,
                };
            }
        };

        let total = started.elapsed().as_secs_f64();
        performance.total_secs = total;

        ImageReport {
            input_file: input_file.clone(),
            generated_at: Utc::now(),
            steps: ImageSteps {
                extraction: StageRecord::success(record.clone(), elapsed),
            },
            final_output: FinalOutput::Completed(ImageSummary {
                input_image: input_file,
                document_type: record.document_type,
                extracted_text: record.extracted_text,
                structured_fields: record.structured_fields,
                extracted_entities: record.entities,
                extraction_confidence: record.confidence,
                processing_methods: vec!["direct_text_extraction".to_string()],
                processing_steps: vec![
                    "document_extraction".to_string(),
                    "text_structuring".to_string(),
                    "entity_extraction".to_string(),
                ],
                metadata: SummaryMetadata {
                    total_steps: 1,
                    pipeline_type: "complete_image_processing".to_string(),
                    success: true,
                    processing_time_seconds: round_centis(total),
                },
            }),
            performance,
            output_json: None,
        }
    }

    async fn persist(
        &self,
        report: &PipelineReport,
        input: &Path,
    ) -> Result<PathBuf, PipelineError> {
        tokio::fs::create_dir_all(&self.json_dir)
            .await
            .map_err(|e| PipelineError::Persist(format!("failed to create report dir: {}", e)))?;

        let path = self.json_dir.join(format!("{}_result.json", file_stem(input)));
        let body = serde_json::to_string_pretty(report)
            .map_err(|e| PipelineError::Persist(e.to_string()))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| PipelineError::Persist(format!("failed to write {:?}: {}", path, e)))?;

        Ok(path)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("input")
        .to_string()
}

fn round_centis(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

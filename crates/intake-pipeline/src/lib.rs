//! The Intake processing pipeline.
//!
//! Sequences remote AI-service calls into two fixed pipelines: audio
//! (transcription → intent analysis → spoken reply) and image (document
//! extraction). The [`Orchestrator`] routes inputs by media kind, times
//! every stage, and persists a JSON report per run.
//!
//! Remote stages talk to an OpenAI-compatible API over HTTPS; speech
//! synthesis runs a local engine as a subprocess and degrades to text-only
//! replies when none is installed.

pub mod chat;
pub mod config;
pub mod error;
pub mod extract;
pub mod interpret;
pub mod orchestrator;
pub mod synthesize;
pub mod transcribe;

pub use config::{ApiConfig, PipelineConfig, StorageConfig, TtsConfig, TtsEngine};
pub use error::PipelineError;
pub use extract::DocumentExtractor;
pub use interpret::IntentAnalyzer;
pub use orchestrator::Orchestrator;
pub use synthesize::Synthesizer;
pub use transcribe::Transcriber;

//! Shared types for the Intake media & document processing pipeline.
//!
//! This crate provides the data model used across the workspace: media
//! classification, stage records, the intent-analysis record produced by the
//! language model, the document-extraction record produced by the vision
//! model, and the pipeline reports assembled by the orchestrator.
//!
//! No crate in the workspace depends on anything *except* `intake-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

pub mod analysis;
pub mod extraction;
pub mod media;
pub mod report;

pub use analysis::{AnalysisRecord, Confidence, EntitySet, ParameterSet, Sentiment, Urgency};
pub use extraction::{DocumentType, ExtractionRecord, StructuredFields};
pub use media::MediaKind;
pub use report::{
    AudioReport, AudioSummary, FinalOutput, ImageReport, ImageSummary, Performance,
    PipelineReport, SpokenReply, StageRecord, StageStatus, SummaryMetadata, Transcript,
    TranscriptSegment,
};

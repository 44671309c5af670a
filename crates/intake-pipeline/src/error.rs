use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("transcription failed: {0}")]
    Transcription(String),

    #[error("intent analysis failed: {0}")]
    Analysis(String),

    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("document extraction failed: {0}")]
    Extraction(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("input file not found: {0}")]
    InputNotFound(String),

    #[error("input too large: {actual} bytes (limit: {limit} bytes)")]
    InputTooLarge { actual: u64, limit: u64 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to persist report: {0}")]
    Persist(String),
}

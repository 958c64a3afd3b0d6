use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShortsmithError {
    #[error("Transcript misalignment: {0}")]
    Misalignment(String),

    #[error("Invalid transcript: {0}")]
    InvalidTranscript(String),

    #[error("Segment count mismatch: expected {expected}, got {actual}")]
    SegmentCountMismatch { expected: usize, actual: usize },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ShortsmithError>;

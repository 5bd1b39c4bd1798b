use thiserror::Error;

/// Errors surfaced by the recording engine.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A prefix was popped from an empty stack (push/pop mismatch).
    #[error("prefix stack underflow on recorder level {level}")]
    Underflow { level: usize },

    /// Instrumentation was described with an unusable origin, method or label.
    #[error("invalid instrumentation: {0}")]
    Configuration(String),

    #[error("malformed table document: {0}")]
    TableFormat(String),

    #[error("failed to parse record config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecordError>;

use thiserror::Error;

/// Failure of a single channel inside an otherwise readable recording.
///
/// The orchestrator records these against the channel label and keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    #[error("Invalid sample rate {sample_rate} Hz: {reason}")]
    InvalidSampleRate { sample_rate: f64, reason: String },

    #[error("Insufficient samples: need at least {required}, got {available}")]
    InsufficientSamples { required: usize, available: usize },
}

#[derive(Error, Debug)]
pub enum QeegError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("Unreadable recording: {0}")]
    UnreadableRecording(String),

    #[error("Unsupported recording format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("Invalid frequency band: {0}")]
    InvalidBand(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read DOCX document: {0}")]
    Docx(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QeegError>;

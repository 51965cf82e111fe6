use thiserror::Error;

/// Error taxonomy (§7): the kinds a stage is allowed to raise.
#[derive(Debug, Error)]
pub enum SbkgError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("acquisition error: {0}")]
    Acquisition(String),

    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("schema validation error: {0}")]
    SchemaValidation(String),

    #[error("pipeline dependency error: {0}")]
    PipelineDependency(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SbkgError>;

/// Closed set of reason tags carried by every record-level error (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingField,
    InvalidValue,
    BelowLengthThreshold,
    DuplicateKey,
    ExtractorFailure,
    ServiceTimeout,
    ServiceUnavailable,
    BelowConfidenceThreshold,
    TypeIncompatible,
    Other,
}

/// A single record-level failure: caught, counted, and written to a
/// rejection file rather than propagated.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RejectedRecord {
    pub stage: String,
    pub record_id: Option<String>,
    pub reason: ErrorKind,
    pub message: String,
}

impl RejectedRecord {
    pub fn new(
        stage: impl Into<String>,
        record_id: Option<String>,
        reason: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self { stage: stage.into(), record_id, reason, message: message.into() }
    }
}

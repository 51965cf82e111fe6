//! Error types for the topic modelling pipeline (embedding, reduction,
//! clustering, labeling).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TopicError>;

#[derive(Error, Debug)]
pub enum TopicError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Model download failed: {0}")]
    Download(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimensionality reduction failed: {0}")]
    Reduction(String),

    #[error("Clustering failed: {0}")]
    Clustering(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hugging Face Hub error: {0}")]
    HfHub(String),
}

impl From<candle_core::Error> for TopicError {
    fn from(e: candle_core::Error) -> Self {
        TopicError::Inference(e.to_string())
    }
}

impl From<tokenizers::Error> for TopicError {
    fn from(e: tokenizers::Error) -> Self {
        TopicError::Tokenizer(e.to_string())
    }
}

impl From<hf_hub::api::sync::ApiError> for TopicError {
    fn from(e: hf_hub::api::sync::ApiError) -> Self {
        TopicError::Download(e.to_string())
    }
}

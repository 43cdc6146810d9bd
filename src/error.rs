use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model API error: {0}")]
    Model(String),

    #[error("Model API rate limited: {0}")]
    ModelRateLimited(String),

    #[error("Model API request timed out after {0}s")]
    ModelTimeout(u64),

    #[error("Validator error: {0}")]
    Validator(String),

    #[error("Stage error: {0}")]
    Stage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacklotError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Missing zoning rule: {0}")]
    MissingRule(String),

    #[error("Pipeline cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BacklotError>;

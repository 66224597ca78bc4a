//! Error types for PageState

use thiserror::Error;

/// Result type alias using PageState Error
pub type Result<T> = std::result::Result<T, Error>;

/// PageState error types
///
/// The store and the consensus algorithms are total; only the file and
/// parse surfaces around them produce these.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid recording: {0}")]
    InvalidRecording(String),

    #[error("Not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },
}

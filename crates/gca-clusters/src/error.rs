use thiserror::Error;

use gca_core::CoreError;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ClusterResult<T> = Result<T, ClusterError>;

impl From<CoreError> for ClusterError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Invalid(msg) => ClusterError::Invalid(msg),
            CoreError::Mismatch(msg) => ClusterError::Invalid(msg),
        }
    }
}

impl From<serde_json::Error> for ClusterError {
    fn from(err: serde_json::Error) -> Self {
        ClusterError::Parse(err.to_string())
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid parameter: {0}")]
    Invalid(String),
    #[error("size mismatch: {0}")]
    Mismatch(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

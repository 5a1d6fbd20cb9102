use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoordinateError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidConfiguration,
    OutOfRange,
    InvalidArgument,
    UnsupportedConversion,
}

/// Malformed requests against the coordinate model.
///
/// Moves refused by a topology are not errors; they come back as `false`/`None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("out of range: {0}")]
    OutOfRange(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unsupported conversion: {0}")]
    UnsupportedConversion(String),
}

impl CoordinateError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoordinateError::InvalidConfiguration(_) => ErrorCode::InvalidConfiguration,
            CoordinateError::OutOfRange(_) => ErrorCode::OutOfRange,
            CoordinateError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            CoordinateError::UnsupportedConversion(_) => ErrorCode::UnsupportedConversion,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CoordinateError::InvalidConfiguration(m)
            | CoordinateError::OutOfRange(m)
            | CoordinateError::InvalidArgument(m)
            | CoordinateError::UnsupportedConversion(m) => m,
        }
    }
}

//! Resource parsing and arithmetic error types.

use thiserror::Error;

/// Errors produced when parsing or combining resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("malformed resource segment: {0:?}")]
    Malformed(String),

    #[error("unknown resource name: {0:?}")]
    UnknownName(String),

    #[error("negative quantity for resource {0:?}")]
    Negative(String),

    #[error("malformed range in {0:?}")]
    MalformedRange(String),
}

pub type ResourceResult<T> = Result<T, ResourceError>;

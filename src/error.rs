//! Error type for decoding inputs.
//!
//! Missing records, unknown ids and absent values are not errors: they
//! resolve to fallbacks. Configuration problems go through
//! [`crate::diagnostics`] instead.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("payload decode error: {0}")]
    Payload(#[from] simd_json::Error),

    #[error("grid decode error: {0}")]
    Grid(String),

    #[error("invalid color: {0:?}")]
    Color(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("malformed address text: {0:?}")]
    MalformedAddress(String),
}

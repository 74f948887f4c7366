//! Errors raised by host bridge implementations.

use thiserror::Error;

/// Failure of a host capability.
///
/// Messages must not contain token values or other secrets.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The request or operation did not complete (transport, encoding, type mismatch)
    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The settings database rejected a query or transaction
    #[error("Settings database error: {0}")]
    DatabaseError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

//! Runtime setup errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid identity service settings, log filter or settings path
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A bridge was neither injected nor available as a desktop default
    #[error("Missing {capability}: {message}")]
    CapabilityMissing { capability: String, message: String },

    /// A default bridge could not be constructed
    #[error("Runtime setup failed: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

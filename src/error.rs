use std::fmt;

use thiserror::Error;

/// Failures from the envelope encryption engine.
///
/// `Integrity` is layer-blind: callers cannot tell whether the inner or the
/// outer cipher rejected the data.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Master key missing, wrong length, or not valid hex; also covers
    /// rejected KDF parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token is not valid base64, decodes to fewer bytes than the fixed
    /// envelope header, or did not carry UTF-8 text.
    #[error("envelope is malformed or truncated")]
    MalformedEnvelope,

    /// Authentication tag verification failed in the cipher stack.
    #[error("envelope failed authentication")]
    Integrity,

    /// Encrypt-path failure, e.g. the OS entropy source was unavailable.
    #[error("encryption failed: {0}")]
    Encryption(String),
}

#[derive(Debug)]
pub enum StoreError {
    AlreadyExists(String),
    NotFound(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::AlreadyExists(name) => write!(f, "secret '{name}' already exists"),
            StoreError::NotFound(name) => write!(f, "secret '{name}' not found"),
        }
    }
}

impl std::error::Error for StoreError {}

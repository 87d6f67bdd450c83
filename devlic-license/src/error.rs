//! Error types for the licensing module.

use devlic_crypto::CryptoError;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Unknown unit, zero period or empty fingerprint at issue time.
    #[error("invalid license parameters: {0}")]
    InvalidParameters(String),

    /// License text could not be decoded, or the payload is missing fields
    /// or violates record invariants.
    #[error("malformed license: {0}")]
    MalformedLicense(String),

    /// No device signal could be collected.
    #[error("device fingerprint unavailable: {0}")]
    FingerprintUnavailable(String),

    /// Codec failure while encoding.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

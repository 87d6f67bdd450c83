//! Error types for the codec layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in key handling and license encoding.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key material is not 16, 24 or 32 bytes long.
    #[error("invalid key length: expected 16, 24 or 32 bytes, got {actual}")]
    InvalidKeyLength { actual: usize },

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The encoded text could not be turned back into plaintext
    /// (bad base64, misaligned ciphertext, bad padding, wrong key or tampering).
    #[error("decode failed: {0}")]
    Decode(String),
}

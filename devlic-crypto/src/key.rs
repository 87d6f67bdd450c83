//! Shared key material for license encoding.
//!
//! The same key must be present at issue time and at validation time; the
//! codec has no key-distribution mechanism of its own. Key files carry the key
//! as URL-safe base64 text.

use crate::error::{CryptoError, CryptoResult};
use base64::{engine::general_purpose::URL_SAFE, Engine};
use rand::RngCore;
use zeroize::Zeroizing;

/// Accepted key lengths in bytes (AES-128, AES-192, AES-256).
pub const KEY_SIZES: [usize; 3] = [16, 24, 32];

/// Length of a key generated when no source is given.
pub const DEFAULT_KEY_SIZE: usize = 32;

/// Where the key material of a [`KeyContext`] comes from.
#[derive(Clone, Copy)]
pub enum KeySource<'a> {
    /// Caller-provided secret bytes.
    Secret(&'a [u8]),
    /// A fresh random key of the requested length.
    Random(usize),
    /// A fresh random key of [`DEFAULT_KEY_SIZE`] bytes.
    Default,
}

impl std::fmt::Debug for KeySource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secret(bytes) => f
                .debug_tuple("Secret")
                .field(&format_args!("[REDACTED; {}]", bytes.len()))
                .finish(),
            Self::Random(len) => f.debug_tuple("Random").field(len).finish(),
            Self::Default => f.write_str("Default"),
        }
    }
}

/// Immutable symmetric key, wiped from memory on drop.
#[derive(Clone)]
pub struct KeyContext {
    bytes: Zeroizing<Vec<u8>>,
}

impl KeyContext {
    /// Builds a key context from an explicit source.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if the secret or requested
    /// length is not one of [`KEY_SIZES`]. A requested length of zero is an
    /// error, not a request for the default.
    pub fn new(source: KeySource<'_>) -> CryptoResult<Self> {
        match source {
            KeySource::Secret(secret) => Self::from_secret(secret),
            KeySource::Random(len) => Self::random(len),
            KeySource::Default => Ok(Self::default_random()),
        }
    }

    /// Wraps caller-provided secret bytes.
    pub fn from_secret(secret: &[u8]) -> CryptoResult<Self> {
        check_key_size(secret.len())?;
        Ok(Self {
            bytes: Zeroizing::new(secret.to_vec()),
        })
    }

    /// Generates a random key of `len` bytes from the OS RNG.
    pub fn random(len: usize) -> CryptoResult<Self> {
        check_key_size(len)?;
        let mut bytes = Zeroizing::new(vec![0u8; len]);
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Ok(Self { bytes })
    }

    /// Generates a random 32-byte key.
    #[must_use]
    pub fn default_random() -> Self {
        let mut bytes = Zeroizing::new(vec![0u8; DEFAULT_KEY_SIZE]);
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Parses key-file text produced by [`KeyContext::export_base64`].
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = Zeroizing::new(
            URL_SAFE
                .decode(encoded.trim())
                .map_err(|e| CryptoError::Decode(format!("invalid key base64: {e}")))?,
        );
        Self::from_secret(&bytes)
    }

    /// Encodes the key for writing to a key file.
    ///
    /// Anyone holding this text can issue and read licenses.
    #[must_use]
    pub fn export_base64(&self) -> String {
        URL_SAFE.encode(self.bytes.as_slice())
    }

    /// Key size in bytes (16, 24 or 32).
    #[must_use]
    pub fn key_size(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for KeyContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyContext")
            .field("key_size", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

fn check_key_size(len: usize) -> CryptoResult<()> {
    if KEY_SIZES.contains(&len) {
        Ok(())
    } else {
        Err(CryptoError::InvalidKeyLength { actual: len })
    }
}

//! Text codec for license payloads.
//!
//! Two wire formats exist:
//!
//! - **Legacy**: `base64url(iv || aes_cbc(payload))`, compatible with licenses
//!   issued by earlier tooling. Not authenticated.
//! - **Sealed**: `v2.` followed by `base64url(nonce || chacha20poly1305(payload))`.
//!
//! `.` is not part of the base64url alphabet, so [`Codec::decode`] tells the
//! two apart by prefix alone. Encoding uses the codec's configured format;
//! decoding accepts either.

use crate::cipher::{self, EncryptedData};
use crate::error::{CryptoError, CryptoResult};
use crate::key::KeyContext;
use crate::legacy;
use base64::{
    alphabet,
    engine::{general_purpose::URL_SAFE_NO_PAD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use tracing::{debug, warn};

/// Prefix that marks sealed license text.
pub const SEALED_PREFIX: &str = "v2.";

/// URL-safe alphabet, padded on encode, padding optional on decode.
const LEGACY_B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Wire format produced by [`Codec::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodecFormat {
    /// AES-CBC, unauthenticated.
    #[default]
    Legacy,
    /// ChaCha20-Poly1305, authenticated.
    Sealed,
}

impl CodecFormat {
    /// Detects the format of encoded text.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        if text.trim().starts_with(SEALED_PREFIX) {
            Self::Sealed
        } else {
            Self::Legacy
        }
    }
}

/// Encrypting text codec bound to one key.
///
/// The codec never mutates its key, so a shared `&Codec` can be used from
/// several threads at once.
#[derive(Debug, Clone)]
pub struct Codec {
    key: KeyContext,
    format: CodecFormat,
}

impl Codec {
    /// Creates a codec that encodes in the legacy format.
    #[must_use]
    pub fn new(key: KeyContext) -> Self {
        Self {
            key,
            format: CodecFormat::default(),
        }
    }

    /// Selects the format used by [`Codec::encode`].
    #[must_use]
    pub fn with_format(mut self, format: CodecFormat) -> Self {
        self.format = format;
        self
    }

    /// The format used for encoding.
    #[must_use]
    pub fn format(&self) -> CodecFormat {
        self.format
    }

    /// Encrypts `plaintext` and returns transport-safe text.
    ///
    /// Output differs on every call for the same input (random IV/nonce).
    pub fn encode(&self, plaintext: &[u8]) -> CryptoResult<String> {
        match self.format {
            CodecFormat::Legacy => {
                let bytes = legacy::encrypt(&self.key, plaintext)?;
                Ok(LEGACY_B64.encode(bytes))
            }
            CodecFormat::Sealed => {
                let sealed = cipher::encrypt(&self.key, plaintext)?;
                Ok(format!("{SEALED_PREFIX}{}", URL_SAFE_NO_PAD.encode(sealed.to_bytes())))
            }
        }
    }

    /// Reverses [`Codec::encode`] for either format.
    ///
    /// # Errors
    ///
    /// [`CryptoError::Decode`] for invalid base64, misaligned or too-short
    /// ciphertext, bad padding, or (sealed only) a failed authentication check.
    pub fn decode(&self, text: &str) -> CryptoResult<Vec<u8>> {
        let text = text.trim();

        match CodecFormat::detect(text) {
            CodecFormat::Sealed => {
                let body = &text[SEALED_PREFIX.len()..];
                let bytes = URL_SAFE_NO_PAD
                    .decode(body.trim_end_matches('='))
                    .map_err(|e| CryptoError::Decode(format!("invalid base64: {e}")))?;
                let sealed = EncryptedData::from_bytes(&bytes)?;
                debug!(len = bytes.len(), "decoding sealed license text");
                cipher::decrypt(&self.key, &sealed)
            }
            CodecFormat::Legacy => {
                let bytes = LEGACY_B64
                    .decode(text)
                    .map_err(|e| CryptoError::Decode(format!("invalid base64: {e}")))?;
                let plaintext = legacy::decrypt(&self.key, &bytes)?;
                warn!("decoded legacy license text; legacy format is not authenticated");
                Ok(plaintext)
            }
        }
    }
}

//! Shared-key license codec for devlic.
//!
//! This crate handles:
//! - Key material selection and validation ([`KeyContext`])
//! - Encrypting license payloads to URL-safe text and back ([`Codec`])
//!
//! # Security model
//!
//! Issuer and validator share one symmetric key. Anyone who can read the key
//! can mint licenses; this is not public-key licensing.
//!
//! The legacy format (AES-CBC) gives confidentiality only. The sealed format
//! (ChaCha20-Poly1305) adds integrity and is opt-in because it changes the
//! wire format.

mod cipher;
mod codec;
mod error;
mod key;
mod legacy;

pub use cipher::{EncryptedData, NONCE_SIZE, TAG_SIZE};
pub use codec::{Codec, CodecFormat, SEALED_PREFIX};
pub use error::{CryptoError, CryptoResult};
pub use key::{KeyContext, KeySource, DEFAULT_KEY_SIZE, KEY_SIZES};
pub use legacy::{BLOCK_SIZE, IV_SIZE};

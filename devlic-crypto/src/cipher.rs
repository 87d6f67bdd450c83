//! Sealed license cipher using ChaCha20-Poly1305.
//!
//! Provides authenticated encryption: a wrong key or any modified byte makes
//! decryption fail. The AEAD key is derived from the shared [`KeyContext`] with
//! HKDF-SHA256, so 16, 24 and 32 byte keys all seal the same way.

use crate::error::{CryptoError, CryptoResult};
use crate::key::KeyContext;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

const SUBKEY_INFO: &[u8] = b"devlic/sealed/v1";

/// Sealed data: nonce plus ciphertext with its trailing tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedData {
    /// The nonce used for encryption (unique per encryption).
    pub nonce: [u8; NONCE_SIZE],
    /// The encrypted ciphertext (includes auth tag).
    pub ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Serializes as `nonce || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(NONCE_SIZE + self.ciphertext.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Parses `nonce || ciphertext`.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Decode("sealed data too short".to_string()));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[..NONCE_SIZE]);
        let ciphertext = bytes[NONCE_SIZE..].to_vec();

        Ok(Self { nonce, ciphertext })
    }
}

fn cipher_for(key: &KeyContext) -> CryptoResult<ChaCha20Poly1305> {
    let hk = Hkdf::<Sha256>::new(None, key.as_bytes());
    let mut okm = Zeroizing::new([0u8; 32]);
    hk.expand(SUBKEY_INFO, &mut okm[..])
        .map_err(|e| CryptoError::Encryption(format!("subkey derivation: {e}")))?;
    ChaCha20Poly1305::new_from_slice(&okm[..])
        .map_err(|e| CryptoError::Encryption(e.to_string()))
}

/// Encrypts plaintext under a random nonce.
pub fn encrypt(key: &KeyContext, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    let cipher = cipher_for(key)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    Ok(EncryptedData {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypts and authenticates sealed data.
pub fn decrypt(key: &KeyContext, encrypted: &EncryptedData) -> CryptoResult<Vec<u8>> {
    let cipher = cipher_for(key)?;
    let nonce = Nonce::from_slice(&encrypted.nonce);

    cipher
        .decrypt(nonce, encrypted.ciphertext.as_ref())
        .map_err(|_| CryptoError::Decode("authentication failed (wrong key or tampered data)".to_string()))
}

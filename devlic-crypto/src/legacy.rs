//! Legacy license cipher: AES-CBC with PKCS#7 padding.
//!
//! Binary layout is `iv[16] || ciphertext`. There is no authentication tag, so
//! a corrupted ciphertext that still unpads cleanly decrypts to garbage instead
//! of failing. Callers must treat the output as untrusted until it parses.

use crate::error::{CryptoError, CryptoResult};
use crate::key::KeyContext;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

/// AES block size, which is also the IV size for CBC.
pub const BLOCK_SIZE: usize = 16;

/// Size of the IV prefix in bytes.
pub const IV_SIZE: usize = BLOCK_SIZE;

/// Encrypts `plaintext` under a fresh random IV and returns `iv || ciphertext`.
pub fn encrypt(key: &KeyContext, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut iv = [0u8; IV_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let key = key.as_bytes();
    let ciphertext = match key.len() {
        16 => encrypt_with::<cbc::Encryptor<aes::Aes128>>(key, &iv, plaintext)?,
        24 => encrypt_with::<cbc::Encryptor<aes::Aes192>>(key, &iv, plaintext)?,
        32 => encrypt_with::<cbc::Encryptor<aes::Aes256>>(key, &iv, plaintext)?,
        actual => return Err(CryptoError::InvalidKeyLength { actual }),
    };

    let mut out = Vec::with_capacity(IV_SIZE + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Splits off the IV, decrypts and removes padding.
pub fn decrypt(key: &KeyContext, data: &[u8]) -> CryptoResult<Vec<u8>> {
    if data.len() < IV_SIZE + BLOCK_SIZE {
        return Err(CryptoError::Decode("data too short".to_string()));
    }

    let (iv, ciphertext) = data.split_at(IV_SIZE);
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Decode(format!(
            "ciphertext length {} is not a multiple of {BLOCK_SIZE}",
            ciphertext.len()
        )));
    }

    let key = key.as_bytes();
    match key.len() {
        16 => decrypt_with::<cbc::Decryptor<aes::Aes128>>(key, iv, ciphertext),
        24 => decrypt_with::<cbc::Decryptor<aes::Aes192>>(key, iv, ciphertext),
        32 => decrypt_with::<cbc::Decryptor<aes::Aes256>>(key, iv, ciphertext),
        actual => Err(CryptoError::InvalidKeyLength { actual }),
    }
}

fn encrypt_with<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> CryptoResult<Vec<u8>>
where
    C: BlockEncryptMut + KeyIvInit,
{
    let cipher = C::new_from_slices(key, iv)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn decrypt_with<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>>
where
    C: BlockDecryptMut + KeyIvInit,
{
    let cipher = C::new_from_slices(key, iv)
        .map_err(|e| CryptoError::Decode(e.to_string()))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::Decode("invalid padding (wrong key or corrupted data)".to_string()))
}

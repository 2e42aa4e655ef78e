// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! AES-256-CBC with a PBKDF2-HMAC-SHA256 key.
//!
//! Output is base64 of:
//!
//! ```text
//! [4 bytes ] metadata length (BE u32)
//! [N bytes ] metadata JSON {"alg","kdf","iter"}
//! [32 bytes] PBKDF2 salt (random per message)
//! [16 bytes] CBC IV (random per message)
//! [rest    ] ciphertext, PKCS#7 padded
//! ```
//!
//! CBC carries no authentication tag. A wrong password shows up as bad
//! padding or non-UTF-8 plaintext; both map to `IncorrectPassword`.

use ::aes::cipher::block_padding::Pkcs7;
use ::aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{b64_decode, b64_encode, random_bytes};
use crate::stego::error::StegoError;

type Aes256CbcEnc = cbc::Encryptor<::aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<::aes::Aes256>;

/// Default PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 10_000;
/// PBKDF2 salt length in bytes.
pub const SALT_LEN: usize = 32;
/// CBC initialisation vector length in bytes.
pub const IV_LEN: usize = 16;

const ALG_NAME: &str = "AES-256-CBC";
const KDF_NAME: &str = "PBKDF2-SHA256";
/// Upper bound for [`Aes256Crypto::with_iterations`].
const MAX_ITERATIONS: u32 = 10_000_000;

#[derive(Debug, Serialize, Deserialize)]
struct CipherMeta {
    alg: String,
    kdf: String,
    iter: u32,
}

/// Derive a 256-bit key with PBKDF2-HMAC-SHA256.
pub(crate) fn derive_key(password: &str, salt: &[u8], iterations: u32) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut *key);
    key
}

pub(crate) fn cbc_encrypt(key: &[u8; 32], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Vec<u8> {
    Aes256CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt and strip padding. Bad padding means the key was wrong.
pub(crate) fn cbc_decrypt(
    key: &[u8; 32],
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, StegoError> {
    if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
        return Err(StegoError::CorruptedImage);
    }
    Aes256CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| StegoError::IncorrectPassword)
}

/// Password-based AES-256-CBC text cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aes256Crypto {
    iterations: u32,
}

impl Default for Aes256Crypto {
    fn default() -> Self {
        Self { iterations: PBKDF2_ITERATIONS }
    }
}

impl Aes256Crypto {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a non-default PBKDF2 iteration count. The count is recorded in
    /// the output and a decryptor only accepts its own count.
    pub fn with_iterations(iterations: u32) -> Self {
        Self { iterations: iterations.clamp(1, MAX_ITERATIONS) }
    }

    /// Encrypt `plaintext` under `password`.
    pub fn encrypt(&self, plaintext: &str, password: &str) -> Result<String, StegoError> {
        let salt: [u8; SALT_LEN] = random_bytes();
        let iv: [u8; IV_LEN] = random_bytes();
        let key = derive_key(password, &salt, self.iterations);
        let ciphertext = cbc_encrypt(&key, &iv, plaintext.as_bytes());

        let meta = serde_json::to_vec(&CipherMeta {
            alg: ALG_NAME.to_string(),
            kdf: KDF_NAME.to_string(),
            iter: self.iterations,
        })
        .map_err(|_| StegoError::InvalidInput("cipher metadata"))?;
        let meta_len = u32::try_from(meta.len())
            .map_err(|_| StegoError::InvalidInput("cipher metadata"))?;

        let mut packed = Vec::with_capacity(4 + meta.len() + SALT_LEN + IV_LEN + ciphertext.len());
        packed.extend_from_slice(&meta_len.to_be_bytes());
        packed.extend_from_slice(&meta);
        packed.extend_from_slice(&salt);
        packed.extend_from_slice(&iv);
        packed.extend_from_slice(&ciphertext);
        Ok(b64_encode(&packed))
    }

    /// Decrypt the output of [`Aes256Crypto::encrypt`].
    ///
    /// # Errors
    /// - [`StegoError::CorruptedImage`] if the container is malformed or
    ///   records a different iteration count.
    /// - [`StegoError::IncorrectPassword`] on bad padding or non-UTF-8
    ///   plaintext.
    pub fn decrypt(&self, encoded: &str, password: &str) -> Result<String, StegoError> {
        let packed = b64_decode(encoded, StegoError::CorruptedImage)?;
        if packed.len() < 4 {
            return Err(StegoError::CorruptedImage);
        }
        let meta_len = u32::from_be_bytes([packed[0], packed[1], packed[2], packed[3]]) as usize;
        let body = &packed[4..];
        if body.len() < meta_len + SALT_LEN + IV_LEN {
            return Err(StegoError::CorruptedImage);
        }
        let meta: CipherMeta =
            serde_json::from_slice(&body[..meta_len]).map_err(|_| StegoError::CorruptedImage)?;
        if meta.alg != ALG_NAME || meta.kdf != KDF_NAME || meta.iter != self.iterations {
            return Err(StegoError::CorruptedImage);
        }

        let rest = &body[meta_len..];
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&rest[..SALT_LEN]);
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&rest[SALT_LEN..SALT_LEN + IV_LEN]);
        let ciphertext = &rest[SALT_LEN + IV_LEN..];

        let key = derive_key(password, &salt, self.iterations);
        let plaintext = Zeroizing::new(cbc_decrypt(&key, &iv, ciphertext)?);
        String::from_utf8(plaintext.to_vec()).map_err(|_| StegoError::IncorrectPassword)
    }
}

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! HMAC-authenticated JSON envelope.
//!
//! A serialisable value is encrypted with AES-256-CBC under a key stretched
//! by PBKDF2 (iterations by [`Strength`]) and authenticated with
//! HMAC-SHA256 over `"salt:iv:ciphertext"`, each field base64-encoded.
//! The PBKDF2 output is a master key; encryption key, MAC key and an
//! 8-byte key-check value are split off it with HMAC labels.
//!
//! Opening checks, in order:
//!
//! 1. key-check value, else [`StegoError::IncorrectPassword`];
//! 2. HMAC in constant time, else [`StegoError::IntegrityViolation`];
//! 3. only then AES decryption and deserialisation.
//!
//! No plaintext is produced unless both checks pass.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::aes::{cbc_decrypt, cbc_encrypt, derive_key, IV_LEN, SALT_LEN};
use super::{b64_decode, b64_encode, hmac_sha256, random_bytes, Strength};
use crate::stego::error::StegoError;

const ENVELOPE_VERSION: u8 = 1;
const ALG_NAME: &str = "AES-256-CBC+HMAC-SHA256";

const ENC_LABEL: &[u8] = b"chroma-defense-enc-v1";
const MAC_LABEL: &[u8] = b"chroma-defense-mac-v1";
const CHECK_LABEL: &[u8] = b"chroma-defense-kcv-v1";
const KCV_LEN: usize = 8;

const MIN_ITERATIONS: u32 = 1_000;
const MAX_ITERATIONS: u32 = 10_000_000;

/// PBKDF2 iterations for each strength level.
pub fn iterations_for(strength: Strength) -> u32 {
    match strength {
        Strength::Standard => 100_000,
        Strength::High => 250_000,
        Strength::Maximum => 500_000,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SealedEnvelope {
    v: u8,
    alg: String,
    iter: u32,
    salt: String,
    iv: String,
    ct: String,
    kcv: String,
    mac: String,
}

struct SplitKeys {
    enc: Zeroizing<[u8; 32]>,
    mac: Zeroizing<[u8; 32]>,
    check: [u8; KCV_LEN],
}

fn split_keys(password: &str, salt: &[u8], iterations: u32) -> SplitKeys {
    let master = derive_key(password, salt, iterations);
    let mut check = [0u8; KCV_LEN];
    check.copy_from_slice(&hmac_sha256(&*master, &[CHECK_LABEL])[..KCV_LEN]);
    SplitKeys {
        enc: Zeroizing::new(hmac_sha256(&*master, &[ENC_LABEL])),
        mac: Zeroizing::new(hmac_sha256(&*master, &[MAC_LABEL])),
        check,
    }
}

fn envelope_mac(key: &[u8; 32], salt: &str, iv: &str, ct: &str) -> [u8; 32] {
    hmac_sha256(key, &[salt.as_bytes(), b":", iv.as_bytes(), b":", ct.as_bytes()])
}

/// The defense envelope cipher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefenseEnvelope {
    iterations: u32,
}

impl DefenseEnvelope {
    pub fn new(strength: Strength) -> Self {
        Self { iterations: iterations_for(strength) }
    }

    /// Use an explicit iteration count instead of a strength level.
    pub fn with_iterations(iterations: u32) -> Self {
        Self { iterations: iterations.clamp(MIN_ITERATIONS, MAX_ITERATIONS) }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Serialise `value` to JSON and seal it under `password`.
    pub fn seal<T: Serialize>(&self, value: &T, password: &str) -> Result<String, StegoError> {
        let plaintext = Zeroizing::new(
            serde_json::to_vec(value).map_err(|_| StegoError::InvalidInput("unserialisable message"))?,
        );
        let salt: [u8; SALT_LEN] = random_bytes();
        let iv: [u8; IV_LEN] = random_bytes();
        let keys = split_keys(password, &salt, self.iterations);
        let ciphertext = cbc_encrypt(&keys.enc, &iv, &plaintext);

        let salt_b64 = b64_encode(&salt);
        let iv_b64 = b64_encode(&iv);
        let ct_b64 = b64_encode(&ciphertext);
        let mac = envelope_mac(&keys.mac, &salt_b64, &iv_b64, &ct_b64);

        let sealed = SealedEnvelope {
            v: ENVELOPE_VERSION,
            alg: ALG_NAME.to_string(),
            iter: self.iterations,
            salt: salt_b64,
            iv: iv_b64,
            ct: ct_b64,
            kcv: b64_encode(&keys.check),
            mac: b64_encode(&mac),
        };
        serde_json::to_string(&sealed).map_err(|_| StegoError::InvalidInput("envelope"))
    }

    /// Verify and open a sealed envelope.
    ///
    /// The envelope must record this opener's iteration count; any other
    /// count is rejected before key derivation.
    pub fn open<T: DeserializeOwned>(&self, sealed: &str, password: &str) -> Result<T, StegoError> {
        let env: SealedEnvelope =
            serde_json::from_str(sealed).map_err(|_| StegoError::CorruptedImage)?;
        if env.v != ENVELOPE_VERSION
            || env.alg != ALG_NAME
            || env.iter != self.iterations
        {
            return Err(StegoError::CorruptedImage);
        }
        let salt = b64_decode(&env.salt, StegoError::CorruptedImage)?;
        let iv_bytes = b64_decode(&env.iv, StegoError::CorruptedImage)?;
        let kcv = b64_decode(&env.kcv, StegoError::CorruptedImage)?;
        let mac = b64_decode(&env.mac, StegoError::CorruptedImage)?;
        if salt.len() != SALT_LEN || iv_bytes.len() != IV_LEN || kcv.len() != KCV_LEN || mac.len() != 32 {
            return Err(StegoError::CorruptedImage);
        }

        let keys = split_keys(password, &salt, self.iterations);
        if keys.check[..].ct_eq(&kcv[..]).unwrap_u8() != 1 {
            return Err(StegoError::IncorrectPassword);
        }
        let expected = envelope_mac(&keys.mac, &env.salt, &env.iv, &env.ct);
        if expected[..].ct_eq(&mac[..]).unwrap_u8() != 1 {
            return Err(StegoError::IntegrityViolation);
        }

        // Authenticated from here on.
        let ciphertext = b64_decode(&env.ct, StegoError::IntegrityViolation)?;
        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(&iv_bytes);
        let plaintext = Zeroizing::new(
            cbc_decrypt(&keys.enc, &iv, &ciphertext).map_err(|_| StegoError::IntegrityViolation)?,
        );
        serde_json::from_slice(&plaintext).map_err(|_| StegoError::CorruptedImage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Secret {
        message: String,
        timestamp: u64,
        classification: String,
    }

    fn secret() -> Secret {
        Secret {
            message: "meet at dawn".into(),
            timestamp: 1_700_000_000,
            classification: "CONFIDENTIAL".into(),
        }
    }

    fn fast() -> DefenseEnvelope {
        DefenseEnvelope::with_iterations(MIN_ITERATIONS)
    }

    fn tamper(sealed: &str, edit: impl FnOnce(&mut SealedEnvelope)) -> String {
        let mut env: SealedEnvelope = serde_json::from_str(sealed).unwrap();
        edit(&mut env);
        serde_json::to_string(&env).unwrap()
    }

    #[test]
    fn seal_open_roundtrip() {
        let sealed = fast().seal(&secret(), "pw").unwrap();
        let opened: Secret = fast().open(&sealed, "pw").unwrap();
        assert_eq!(opened, secret());
    }

    #[test]
    fn strength_sets_iterations() {
        assert_eq!(DefenseEnvelope::new(Strength::Standard).iterations(), 100_000);
        assert_eq!(DefenseEnvelope::new(Strength::High).iterations(), 250_000);
        assert_eq!(DefenseEnvelope::new(Strength::Maximum).iterations(), 500_000);
    }

    #[test]
    fn wrong_password_is_reported_as_such() {
        let sealed = fast().seal(&secret(), "right").unwrap();
        assert_eq!(fast().open::<Secret>(&sealed, "wrong"), Err(StegoError::IncorrectPassword));
    }

    #[test]
    fn every_ciphertext_byte_is_authenticated() {
        let sealed = fast().seal(&secret(), "pw").unwrap();
        let env: SealedEnvelope = serde_json::from_str(&sealed).unwrap();
        let ct = b64_decode(&env.ct, StegoError::CorruptedImage).unwrap();
        for i in 0..ct.len() {
            let mut flipped = ct.clone();
            flipped[i] ^= 0x01;
            let forged = tamper(&sealed, |e| e.ct = b64_encode(&flipped));
            assert_eq!(
                fast().open::<Secret>(&forged, "pw"),
                Err(StegoError::IntegrityViolation),
                "byte {i}"
            );
        }
    }

    #[test]
    fn tampered_iv_and_mac_rejected() {
        let sealed = fast().seal(&secret(), "pw").unwrap();
        let forged_iv = tamper(&sealed, |e| e.iv = b64_encode(&[7u8; IV_LEN]));
        assert_eq!(fast().open::<Secret>(&forged_iv, "pw"), Err(StegoError::IntegrityViolation));
        let forged_mac = tamper(&sealed, |e| e.mac = b64_encode(&[0u8; 32]));
        assert_eq!(fast().open::<Secret>(&forged_mac, "pw"), Err(StegoError::IntegrityViolation));
    }

    #[test]
    fn output_is_json() {
        let sealed = fast().seal(&secret(), "pw").unwrap();
        let value: serde_json::Value = serde_json::from_str(&sealed).unwrap();
        assert_eq!(value["alg"], ALG_NAME);
        assert_eq!(value["iter"], MIN_ITERATIONS);
    }

    #[test]
    fn iteration_count_must_match_strength() {
        let sealed = fast().seal(&"x", "pw").unwrap();
        assert_eq!(
            DefenseEnvelope::new(Strength::Maximum).open::<String>(&sealed, "pw"),
            Err(StegoError::CorruptedImage)
        );
        let inflated = tamper(&sealed, |e| e.iter = MAX_ITERATIONS);
        assert_eq!(fast().open::<String>(&inflated, "pw"), Err(StegoError::CorruptedImage));
        assert_eq!(fast().open::<String>(&sealed, "pw").unwrap(), "x");
    }

    #[test]
    fn garbage_is_corrupted() {
        assert_eq!(fast().open::<Secret>("{}", "pw"), Err(StegoError::CorruptedImage));
        assert_eq!(fast().open::<Secret>("not json", "pw"), Err(StegoError::CorruptedImage));
    }
}

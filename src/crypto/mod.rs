// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Cryptographic layer.
//!
//! - [`aes`]: AES-256-CBC with a PBKDF2-SHA256 key, the default cipher.
//! - [`defense`]: an HMAC-authenticated JSON envelope with heavier key
//!   stretching, selected by strength.
//! - [`lattice`] and [`hash_sig`]: classical simulations of a lattice KEM
//!   and a hash-based signature. They reproduce the *shape* of those schemes
//!   and offer no post-quantum security.
//! - [`quantum`]: binds a KEM shared secret and a signature around one of
//!   the ciphers above.
//!
//! The KEM and the signature scheme sit behind the byte-oriented [`Kem`] and
//! [`SignatureScheme`] traits so a vetted implementation can be dropped in
//! without touching the envelope or embedding code.

pub mod aes;
pub mod defense;
pub mod hash_sig;
pub mod lattice;
pub mod quantum;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::stego::error::StegoError;

pub use self::aes::Aes256Crypto;
pub use defense::DefenseEnvelope;
pub use hash_sig::HashSignatureSimulator;
pub use lattice::LatticeKemSimulator;

type HmacSha256 = Hmac<Sha256>;

/// Symmetric cipher used for a password-protected payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EncryptionAlgorithm {
    /// [`Aes256Crypto`].
    #[default]
    Aes256,
    /// [`DefenseEnvelope`].
    Defense,
}

/// Key-stretching level. Drives PBKDF2 iterations of the defense envelope
/// and the classification label of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strength {
    #[default]
    Standard,
    High,
    Maximum,
}

impl Strength {
    pub fn classification(self) -> &'static str {
        match self {
            Strength::Standard => "CONFIDENTIAL",
            Strength::High => "SECRET",
            Strength::Maximum => "TOP_SECRET",
        }
    }
}

/// A KEM key pair as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KemKeyPair {
    pub public_key: Vec<u8>,
    pub secret_key: Vec<u8>,
}

/// Result of [`Kem::encapsulate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encapsulation {
    pub ciphertext: Vec<u8>,
    pub shared_secret: [u8; 32],
}

/// Result of [`Kem::decapsulate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decapsulation {
    pub message: Vec<u8>,
    pub shared_secret: [u8; 32],
}

/// Key encapsulation mechanism.
pub trait Kem: Send + Sync {
    /// Scheme identifier recorded in envelope metadata.
    fn name(&self) -> &'static str;

    /// Length of the message [`Kem::encapsulate`] accepts.
    fn message_len(&self) -> usize;

    /// Generate a key pair, deterministically when `seed` is given.
    fn generate_keypair(&self, seed: Option<[u8; 32]>) -> KemKeyPair;

    /// Encapsulate `message` to `public_key`.
    fn encapsulate(&self, public_key: &[u8], message: &[u8]) -> Result<Encapsulation, StegoError>;

    /// Recover the message and shared secret from `ciphertext`.
    fn decapsulate(&self, secret_key: &[u8], ciphertext: &[u8]) -> Result<Decapsulation, StegoError>;
}

/// A signing key pair as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKeyPair {
    pub verifying_key: Vec<u8>,
    pub signing_key: Vec<u8>,
}

/// Digital signature scheme.
pub trait SignatureScheme: Send + Sync {
    fn name(&self) -> &'static str;

    /// Generate a key pair, deterministically when `seed` is given.
    fn generate_keypair(&self, seed: Option<[u8; 32]>) -> SigningKeyPair;

    /// Sign `message`. Stateful schemes advance the key in place.
    fn sign(&self, signing_key: &mut Vec<u8>, message: &[u8]) -> Result<Vec<u8>, StegoError>;

    fn verify(&self, verifying_key: &[u8], message: &[u8], signature: &[u8]) -> bool;
}

/// Fill an array from the thread RNG.
pub(crate) fn random_bytes<const N: usize>() -> [u8; N] {
    let mut out = [0u8; N];
    rand::thread_rng().fill_bytes(&mut out);
    out
}

/// HMAC-SHA256 of the concatenation of `parts`.
pub(crate) fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

pub(crate) fn b64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub(crate) fn b64_decode(text: &str, err: StegoError) -> Result<Vec<u8>, StegoError> {
    STANDARD.decode(text).map_err(|_| err)
}

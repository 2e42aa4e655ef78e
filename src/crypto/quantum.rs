// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Quantum-resistant wrapping of a symmetric cipher.
//!
//! On seal, KEM and signing key pairs are derived from the password and a
//! fresh salt. A random KEM message is encapsulated to the KEM public key;
//! the shared secret is mixed into the password handed to the inner cipher,
//! and the cipher output is signed. On open, the signature is checked
//! against the stored verifying key before anything else, then the
//! password-derived verifying key must match the stored one, and only then
//! is the secret decapsulated and the inner cipher run.
//!
//! Security rests on the inner cipher; the KEM and signature are whatever
//! [`Kem`] and [`SignatureScheme`] implementations the caller plugs in.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::{b64_decode, b64_encode, random_bytes, Kem, SignatureScheme};
use crate::stego::error::StegoError;

const KEM_LABEL: &[u8] = b"chroma-pq-kem-v1";
const SIG_LABEL: &[u8] = b"chroma-pq-sig-v1";
const SALT_LEN: usize = 16;

/// Post-quantum parameters stored next to the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PqMetadata {
    pub kem: String,
    pub sig: String,
    pub salt: String,
    /// KEM ciphertext, base64.
    pub kct: String,
    /// Verifying key, base64.
    pub vk: String,
    /// Signature over the inner cipher output, base64.
    pub signature: String,
}

fn derive_seed(label: &[u8], password: &str, salt: &[u8]) -> [u8; 32] {
    Sha256::new()
        .chain_update(label)
        .chain_update(password.as_bytes())
        .chain_update(salt)
        .finalize()
        .into()
}

fn bind_password(password: &str, shared_secret: &[u8; 32]) -> Zeroizing<String> {
    let mut out = String::with_capacity(password.len() + 65);
    out.push_str(password);
    out.push(':');
    for b in shared_secret {
        out.push_str(&format!("{b:02x}"));
    }
    Zeroizing::new(out)
}

/// Run `inner` under a KEM-bound password and sign its output.
pub fn seal<F>(
    kem: &dyn Kem,
    signer: &dyn SignatureScheme,
    password: &str,
    inner: F,
) -> Result<(String, PqMetadata), StegoError>
where
    F: FnOnce(&str) -> Result<String, StegoError>,
{
    let salt: [u8; SALT_LEN] = random_bytes();
    let kem_keys = kem.generate_keypair(Some(derive_seed(KEM_LABEL, password, &salt)));
    let mut kem_message = vec![0u8; kem.message_len()];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut kem_message);
    let encapsulated = kem.encapsulate(&kem_keys.public_key, &kem_message)?;

    let bound = bind_password(password, &encapsulated.shared_secret);
    let output = inner(&bound)?;

    let mut sig_keys = signer.generate_keypair(Some(derive_seed(SIG_LABEL, password, &salt)));
    let signature = signer.sign(&mut sig_keys.signing_key, output.as_bytes())?;

    let meta = PqMetadata {
        kem: kem.name().to_string(),
        sig: signer.name().to_string(),
        salt: b64_encode(&salt),
        kct: b64_encode(&encapsulated.ciphertext),
        vk: b64_encode(&sig_keys.verifying_key),
        signature: b64_encode(&signature),
    };
    Ok((output, meta))
}

/// Verify `output` against `meta` and run `inner` under the recovered
/// password.
///
/// # Errors
/// - [`StegoError::UnsupportedAlgorithm`] if the scheme names differ from
///   the plugged-in implementations.
/// - [`StegoError::IntegrityViolation`] if the signature does not verify.
/// - [`StegoError::IncorrectPassword`] if the password derives another key.
pub fn open<T, F>(
    kem: &dyn Kem,
    signer: &dyn SignatureScheme,
    password: &str,
    meta: &PqMetadata,
    output: &str,
    inner: F,
) -> Result<T, StegoError>
where
    F: FnOnce(&str, &str) -> Result<T, StegoError>,
{
    if meta.kem != kem.name() || meta.sig != signer.name() {
        return Err(StegoError::UnsupportedAlgorithm(0));
    }
    let vk = b64_decode(&meta.vk, StegoError::CorruptedImage)?;
    let signature = b64_decode(&meta.signature, StegoError::IntegrityViolation)?;
    if !signer.verify(&vk, output.as_bytes(), &signature) {
        return Err(StegoError::IntegrityViolation);
    }

    let salt = b64_decode(&meta.salt, StegoError::CorruptedImage)?;
    let derived = signer.generate_keypair(Some(derive_seed(SIG_LABEL, password, &salt)));
    if derived.verifying_key.ct_eq(&vk).unwrap_u8() != 1 {
        return Err(StegoError::IncorrectPassword);
    }

    let kem_keys = kem.generate_keypair(Some(derive_seed(KEM_LABEL, password, &salt)));
    let kct = b64_decode(&meta.kct, StegoError::CorruptedImage)?;
    let decapsulated = kem.decapsulate(&kem_keys.secret_key, &kct)?;
    let bound = bind_password(password, &decapsulated.shared_secret);
    inner(output, &bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Aes256Crypto, HashSignatureSimulator, LatticeKemSimulator};

    fn seal_text(password: &str, text: &str) -> (String, PqMetadata) {
        let aes = Aes256Crypto::with_iterations(1_000);
        seal(&LatticeKemSimulator, &HashSignatureSimulator, password, |pw| aes.encrypt(text, pw)).unwrap()
    }

    fn open_text(password: &str, meta: &PqMetadata, output: &str) -> Result<String, StegoError> {
        let aes = Aes256Crypto::with_iterations(1_000);
        open(&LatticeKemSimulator, &HashSignatureSimulator, password, meta, output, |ct, pw| {
            aes.decrypt(ct, pw)
        })
    }

    #[test]
    fn roundtrip() {
        let (out, meta) = seal_text("pw", "quantum payload");
        assert_eq!(open_text("pw", &meta, &out).unwrap(), "quantum payload");
        assert_eq!(meta.kem, "lattice-sim-128");
    }

    #[test]
    fn wrong_password() {
        let (out, meta) = seal_text("pw", "x");
        assert_eq!(open_text("nope", &meta, &out), Err(StegoError::IncorrectPassword));
    }

    #[test]
    fn tampered_output_fails_signature() {
        let (out, meta) = seal_text("pw", "x");
        let mut forged = out.into_bytes();
        forged[10] = if forged[10] == b'A' { b'B' } else { b'A' };
        let forged = String::from_utf8(forged).unwrap();
        assert_eq!(open_text("pw", &meta, &forged), Err(StegoError::IntegrityViolation));
    }

    #[test]
    fn password_is_bound_to_shared_secret() {
        let bound = bind_password("pw", &[0xAB; 32]);
        assert!(bound.starts_with("pw:abab"));
        assert_eq!(bound.len(), 3 + 64);
    }
}

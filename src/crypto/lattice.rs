// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Ring-LWE shaped KEM simulator.
//!
//! Arithmetic is over `R_q = Z_q[x]/(x^n + 1)` with `n = 128`, `q = 3329`
//! and centred-binomial noise (`η = 2`). A 16-byte message is encoded one bit
//! per coefficient as `bit · ⌈q/2⌋`. Encapsulation coins are derived from
//! the public key and the message, so encapsulation is deterministic.
//!
//! This is a structural stand-in. The parameters are far too small for real
//! security and there is no Fujisaki-Okamoto transform; plug a vetted KEM
//! in through [`Kem`] for anything beyond demonstration.
//!
//! Wire formats (coefficients as BE u16):
//! - public key: `seed_a (32) ‖ t (256)`
//! - secret key: `s (256)`
//! - ciphertext: `u (256) ‖ v (256)`

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};

use super::{random_bytes, Decapsulation, Encapsulation, Kem, KemKeyPair};
use crate::stego::error::StegoError;

const N: usize = 128;
const Q: i64 = 3329;
const HALF_Q: i64 = (Q + 1) / 2;
const POLY_BYTES: usize = N * 2;
const SEED_LEN: usize = 32;

pub const PUBLIC_KEY_LEN: usize = SEED_LEN + POLY_BYTES;
pub const SECRET_KEY_LEN: usize = POLY_BYTES;
pub const CIPHERTEXT_LEN: usize = 2 * POLY_BYTES;
pub const MESSAGE_LEN: usize = N / 8;

type Poly = [i64; N];

fn reduce(v: i64) -> i64 {
    v.rem_euclid(Q)
}

fn add(a: &Poly, b: &Poly) -> Poly {
    let mut out = [0; N];
    for i in 0..N {
        out[i] = reduce(a[i] + b[i]);
    }
    out
}

fn sub(a: &Poly, b: &Poly) -> Poly {
    let mut out = [0; N];
    for i in 0..N {
        out[i] = reduce(a[i] - b[i]);
    }
    out
}

/// Negacyclic schoolbook product: `x^n = -1`.
fn mul(a: &Poly, b: &Poly) -> Poly {
    let mut acc = [0i64; N];
    for i in 0..N {
        for j in 0..N {
            let prod = a[i] * b[j];
            let k = i + j;
            if k < N {
                acc[k] += prod;
            } else {
                acc[k - N] -= prod;
            }
        }
    }
    acc.map(reduce)
}

/// Uniform polynomial expanded from a public seed.
fn expand_a(seed: &[u8; SEED_LEN]) -> Poly {
    let mut rng = ChaCha20Rng::from_seed(*seed);
    let mut out = [0; N];
    for c in out.iter_mut() {
        *c = rng.gen_range(0..Q as u32) as i64;
    }
    out
}

/// Centred binomial sample with `η = 2`: `(b0 + b1) - (b2 + b3)`.
fn sample_cbd(rng: &mut ChaCha20Rng) -> Poly {
    let mut out = [0; N];
    for chunk in out.chunks_mut(8) {
        let mut word = rng.next_u32();
        for c in chunk.iter_mut() {
            let bits = (word & 0xF) as i64;
            word >>= 4;
            let pos = (bits & 1) + ((bits >> 1) & 1);
            let neg = ((bits >> 2) & 1) + ((bits >> 3) & 1);
            *c = reduce(pos - neg);
        }
    }
    out
}

fn poly_to_bytes(p: &Poly, out: &mut Vec<u8>) {
    for &c in p {
        out.extend_from_slice(&(c as u16).to_be_bytes());
    }
}

fn poly_from_bytes(bytes: &[u8]) -> Result<Poly, StegoError> {
    if bytes.len() != POLY_BYTES {
        return Err(StegoError::CorruptedImage);
    }
    let mut out = [0; N];
    for (c, pair) in out.iter_mut().zip(bytes.chunks_exact(2)) {
        let v = u16::from_be_bytes([pair[0], pair[1]]) as i64;
        if v >= Q {
            return Err(StegoError::CorruptedImage);
        }
        *c = v;
    }
    Ok(out)
}

fn encode_message(msg: &[u8]) -> Poly {
    let mut out = [0; N];
    for (i, c) in out.iter_mut().enumerate() {
        let bit = (msg[i / 8] >> (7 - i % 8)) & 1;
        *c = bit as i64 * HALF_Q;
    }
    out
}

/// A coefficient closer to `q/2` than to 0 decodes as 1.
fn decode_message(p: &Poly) -> Vec<u8> {
    let mut out = vec![0u8; MESSAGE_LEN];
    for (i, &c) in p.iter().enumerate() {
        if c > Q / 4 && c < 3 * Q / 4 {
            out[i / 8] |= 1 << (7 - i % 8);
        }
    }
    out
}

fn shared_secret(message: &[u8], ciphertext: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(message);
    h.update(ciphertext);
    h.finalize().into()
}

fn coins(public_key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(b"chroma-lattice-coins");
    h.update(public_key);
    h.update(message);
    h.finalize().into()
}

/// Classical simulation of a ring-LWE KEM.
#[derive(Debug, Default, Clone, Copy)]
pub struct LatticeKemSimulator;

impl LatticeKemSimulator {
    pub fn new() -> Self {
        Self
    }
}

impl Kem for LatticeKemSimulator {
    fn name(&self) -> &'static str {
        "lattice-sim-128"
    }

    fn message_len(&self) -> usize {
        MESSAGE_LEN
    }

    fn generate_keypair(&self, seed: Option<[u8; 32]>) -> KemKeyPair {
        let mut rng = ChaCha20Rng::from_seed(seed.unwrap_or_else(random_bytes));
        let mut seed_a = [0u8; SEED_LEN];
        rng.fill_bytes(&mut seed_a);
        let a = expand_a(&seed_a);
        let s = sample_cbd(&mut rng);
        let e = sample_cbd(&mut rng);
        let t = add(&mul(&a, &s), &e);

        let mut public_key = Vec::with_capacity(PUBLIC_KEY_LEN);
        public_key.extend_from_slice(&seed_a);
        poly_to_bytes(&t, &mut public_key);
        let mut secret_key = Vec::with_capacity(SECRET_KEY_LEN);
        poly_to_bytes(&s, &mut secret_key);
        KemKeyPair { public_key, secret_key }
    }

    fn encapsulate(&self, public_key: &[u8], message: &[u8]) -> Result<Encapsulation, StegoError> {
        if message.len() != MESSAGE_LEN {
            return Err(StegoError::InvalidInput("KEM message must be 16 bytes"));
        }
        if public_key.len() != PUBLIC_KEY_LEN {
            return Err(StegoError::CorruptedImage);
        }
        let mut seed_a = [0u8; SEED_LEN];
        seed_a.copy_from_slice(&public_key[..SEED_LEN]);
        let a = expand_a(&seed_a);
        let t = poly_from_bytes(&public_key[SEED_LEN..])?;

        let mut rng = ChaCha20Rng::from_seed(coins(public_key, message));
        let r = sample_cbd(&mut rng);
        let e1 = sample_cbd(&mut rng);
        let e2 = sample_cbd(&mut rng);
        let u = add(&mul(&a, &r), &e1);
        let v = add(&add(&mul(&t, &r), &e2), &encode_message(message));

        let mut ciphertext = Vec::with_capacity(CIPHERTEXT_LEN);
        poly_to_bytes(&u, &mut ciphertext);
        poly_to_bytes(&v, &mut ciphertext);
        let shared_secret = shared_secret(message, &ciphertext);
        Ok(Encapsulation { ciphertext, shared_secret })
    }

    fn decapsulate(&self, secret_key: &[u8], ciphertext: &[u8]) -> Result<Decapsulation, StegoError> {
        if ciphertext.len() != CIPHERTEXT_LEN {
            return Err(StegoError::CorruptedImage);
        }
        let s = poly_from_bytes(secret_key)?;
        let u = poly_from_bytes(&ciphertext[..POLY_BYTES])?;
        let v = poly_from_bytes(&ciphertext[POLY_BYTES..])?;
        let message = decode_message(&sub(&v, &mul(&s, &u)));
        let shared_secret = shared_secret(&message, ciphertext);
        Ok(Decapsulation { message, shared_secret })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MSG: [u8; MESSAGE_LEN] = *b"sixteen byte msg";

    #[test]
    fn encapsulate_decapsulate_agree() {
        let kem = LatticeKemSimulator::new();
        for _ in 0..8 {
            let kp = kem.generate_keypair(None);
            let enc = kem.encapsulate(&kp.public_key, &MSG).unwrap();
            let dec = kem.decapsulate(&kp.secret_key, &enc.ciphertext).unwrap();
            assert_eq!(dec.message, MSG);
            assert_eq!(dec.shared_secret, enc.shared_secret);
        }
    }

    #[test]
    fn seeded_keygen_is_deterministic() {
        let kem = LatticeKemSimulator::new();
        let a = kem.generate_keypair(Some([9; 32]));
        let b = kem.generate_keypair(Some([9; 32]));
        assert_eq!(a, b);
        assert_eq!(a.public_key.len(), PUBLIC_KEY_LEN);
        assert_eq!(a.secret_key.len(), SECRET_KEY_LEN);
        assert_ne!(a, kem.generate_keypair(Some([10; 32])));
    }

    #[test]
    fn encapsulation_is_deterministic() {
        let kem = LatticeKemSimulator::new();
        let kp = kem.generate_keypair(Some([1; 32]));
        let x = kem.encapsulate(&kp.public_key, &MSG).unwrap();
        let y = kem.encapsulate(&kp.public_key, &MSG).unwrap();
        assert_eq!(x, y);
        assert_eq!(x.ciphertext.len(), CIPHERTEXT_LEN);
    }

    #[test]
    fn wrong_secret_key_yields_other_secret() {
        let kem = LatticeKemSimulator::new();
        let kp = kem.generate_keypair(Some([1; 32]));
        let other = kem.generate_keypair(Some([2; 32]));
        let enc = kem.encapsulate(&kp.public_key, &MSG).unwrap();
        let dec = kem.decapsulate(&other.secret_key, &enc.ciphertext).unwrap();
        assert_ne!(dec.shared_secret, enc.shared_secret);
    }

    #[test]
    fn negacyclic_wraparound() {
        let mut x = [0; N];
        x[N - 1] = 1;
        let sq = mul(&x, &x);
        // x^(2n-2) = -x^(n-2)
        assert_eq!(sq[N - 2], Q - 1);
        assert_eq!(sq.iter().filter(|&&c| c != 0).count(), 1);
    }

    #[test]
    fn malformed_inputs_rejected() {
        let kem = LatticeKemSimulator::new();
        let kp = kem.generate_keypair(None);
        assert!(kem.encapsulate(&kp.public_key, b"short").is_err());
        assert_eq!(kem.encapsulate(&kp.public_key[1..], &MSG), Err(StegoError::CorruptedImage));
        assert_eq!(kem.decapsulate(&kp.secret_key, &[0u8; 10]), Err(StegoError::CorruptedImage));
        assert_eq!(kem.decapsulate(&kp.secret_key, &[0xFF; CIPHERTEXT_LEN]), Err(StegoError::CorruptedImage));
    }

    #[test]
    fn cbd_range() {
        let mut rng = ChaCha20Rng::from_seed([3; 32]);
        let p = sample_cbd(&mut rng);
        assert!(p.iter().all(|&c| c <= 2 || c >= Q - 2));
    }
}

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Hash-based signature simulator: Winternitz one-time signatures (`w = 16`)
//! under a height-4 Merkle tree of SHA-256 hashes.
//!
//! Sixteen one-time keys hang off one root. The signing key tracks the next
//! unused leaf and refuses to sign once all leaves are spent. Like the
//! lattice KEM this is a structural stand-in, not a vetted XMSS/SPHINCS+.
//!
//! Formats:
//! - verifying key: Merkle root (32)
//! - signing key: `master seed (32) ‖ next leaf (BE u32)`
//! - signature: `leaf (BE u32) ‖ 67 chain values (32 each) ‖ 4 auth nodes (32 each)`

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::{random_bytes, SignatureScheme, SigningKeyPair};
use crate::stego::error::StegoError;

const HASH_LEN: usize = 32;
const W: u32 = 16;
/// Base-16 digits of a 256-bit digest.
const LEN1: usize = 64;
/// Base-16 digits of the checksum (max 64 × 15 = 960 < 16³).
const LEN2: usize = 3;
const CHAINS: usize = LEN1 + LEN2;
const TREE_HEIGHT: usize = 4;
const LEAVES: usize = 1 << TREE_HEIGHT;

const SIGNING_KEY_LEN: usize = HASH_LEN + 4;
pub const SIGNATURE_LEN: usize = 4 + CHAINS * HASH_LEN + TREE_HEIGHT * HASH_LEN;

type Hash = [u8; HASH_LEN];

fn sha256(parts: &[&[u8]]) -> Hash {
    let mut h = Sha256::new();
    for p in parts {
        h.update(p);
    }
    h.finalize().into()
}

fn chain_secret(seed: &Hash, leaf: usize, chain: usize) -> Hash {
    sha256(&[b"wots-sk", seed, &(leaf as u32).to_be_bytes(), &(chain as u16).to_be_bytes()])
}

/// Apply the chain function `steps` times starting at position `start`.
fn chain(mut value: Hash, leaf: usize, chain: usize, start: u32, steps: u32) -> Hash {
    for pos in start..start + steps {
        value = sha256(&[
            &[0x02],
            &(leaf as u32).to_be_bytes(),
            &(chain as u16).to_be_bytes(),
            &[pos as u8],
            &value,
        ]);
    }
    value
}

/// Message digits followed by checksum digits, each in `0..W`.
fn digits(message: &[u8]) -> [u32; CHAINS] {
    let digest = sha256(&[b"wots-msg", message]);
    let mut out = [0u32; CHAINS];
    for (i, byte) in digest.iter().enumerate() {
        out[2 * i] = (*byte >> 4) as u32;
        out[2 * i + 1] = (*byte & 0x0F) as u32;
    }
    let checksum: u32 = out[..LEN1].iter().map(|d| W - 1 - d).sum();
    for i in 0..LEN2 {
        out[LEN1 + i] = (checksum >> (4 * (LEN2 - 1 - i))) & 0x0F;
    }
    out
}

fn leaf_hash(chain_ends: &[Hash]) -> Hash {
    let mut h = Sha256::new();
    h.update([0x00u8]);
    for end in chain_ends {
        h.update(end);
    }
    h.finalize().into()
}

fn node_hash(left: &Hash, right: &Hash) -> Hash {
    sha256(&[&[0x01], left, right])
}

fn leaf_public(seed: &Hash, leaf: usize) -> Hash {
    let ends: Vec<Hash> = (0..CHAINS)
        .map(|c| chain(chain_secret(seed, leaf, c), leaf, c, 0, W - 1))
        .collect();
    leaf_hash(&ends)
}

/// Every level of the Merkle tree, leaves first; the last level is the root.
fn tree_levels(seed: &Hash) -> Vec<Vec<Hash>> {
    let mut levels = vec![(0..LEAVES).map(|i| leaf_public(seed, i)).collect::<Vec<_>>()];
    while levels[levels.len() - 1].len() > 1 {
        let prev = &levels[levels.len() - 1];
        let next = prev.chunks(2).map(|pair| node_hash(&pair[0], &pair[1])).collect();
        levels.push(next);
    }
    levels
}

fn parse_signing_key(key: &[u8]) -> Result<(Hash, usize), StegoError> {
    if key.len() != SIGNING_KEY_LEN {
        return Err(StegoError::InvalidInput("malformed signing key"));
    }
    let mut seed = [0u8; HASH_LEN];
    seed.copy_from_slice(&key[..HASH_LEN]);
    let next = u32::from_be_bytes([key[32], key[33], key[34], key[35]]) as usize;
    Ok((seed, next))
}

/// Classical Merkle/Winternitz signature simulator.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashSignatureSimulator;

impl HashSignatureSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Remaining one-time leaves in `signing_key`.
    pub fn remaining(signing_key: &[u8]) -> usize {
        parse_signing_key(signing_key).map_or(0, |(_, next)| LEAVES.saturating_sub(next))
    }
}

impl SignatureScheme for HashSignatureSimulator {
    fn name(&self) -> &'static str {
        "wots-merkle-sim-h4"
    }

    fn generate_keypair(&self, seed: Option<[u8; 32]>) -> SigningKeyPair {
        let seed = seed.unwrap_or_else(random_bytes);
        let levels = tree_levels(&seed);
        let root = levels[TREE_HEIGHT][0];
        let mut signing_key = Vec::with_capacity(SIGNING_KEY_LEN);
        signing_key.extend_from_slice(&seed);
        signing_key.extend_from_slice(&0u32.to_be_bytes());
        SigningKeyPair { verifying_key: root.to_vec(), signing_key }
    }

    fn sign(&self, signing_key: &mut Vec<u8>, message: &[u8]) -> Result<Vec<u8>, StegoError> {
        let (seed, leaf) = parse_signing_key(signing_key)?;
        if leaf >= LEAVES {
            return Err(StegoError::InvalidInput("signing key exhausted"));
        }
        let levels = tree_levels(&seed);

        let mut sig = Vec::with_capacity(SIGNATURE_LEN);
        sig.extend_from_slice(&(leaf as u32).to_be_bytes());
        for (c, &d) in digits(message).iter().enumerate() {
            sig.extend_from_slice(&chain(chain_secret(&seed, leaf, c), leaf, c, 0, d));
        }
        let mut idx = leaf;
        for level in levels.iter().take(TREE_HEIGHT) {
            sig.extend_from_slice(&level[idx ^ 1]);
            idx >>= 1;
        }

        signing_key[HASH_LEN..].copy_from_slice(&((leaf + 1) as u32).to_be_bytes());
        Ok(sig)
    }

    fn verify(&self, verifying_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        if verifying_key.len() != HASH_LEN || signature.len() != SIGNATURE_LEN {
            return false;
        }
        let leaf = u32::from_be_bytes([signature[0], signature[1], signature[2], signature[3]]) as usize;
        if leaf >= LEAVES {
            return false;
        }
        let body = &signature[4..];
        let ends: Vec<Hash> = digits(message)
            .iter()
            .enumerate()
            .map(|(c, &d)| {
                let mut value = [0u8; HASH_LEN];
                value.copy_from_slice(&body[c * HASH_LEN..(c + 1) * HASH_LEN]);
                chain(value, leaf, c, d, W - 1 - d)
            })
            .collect();

        let mut node = leaf_hash(&ends);
        let auth = &body[CHAINS * HASH_LEN..];
        let mut idx = leaf;
        for sibling in auth.chunks_exact(HASH_LEN) {
            let mut sib = [0u8; HASH_LEN];
            sib.copy_from_slice(sibling);
            node = if idx & 1 == 0 { node_hash(&node, &sib) } else { node_hash(&sib, &node) };
            idx >>= 1;
        }
        node[..].ct_eq(verifying_key).into()
    }
}

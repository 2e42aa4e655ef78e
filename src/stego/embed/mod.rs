// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Embedding strategies.
//!
//! Each [`Algorithm`] has exactly one [`EmbeddingStrategy`] implementation,
//! looked up by the 4-bit id stored in the binary header. Strategies write
//! only outside the header region and never touch alpha bytes. A strategy
//! checks capacity before its first write, so a failed embed leaves the
//! buffer untouched except in the frequency-domain verify path, which the
//! pipeline runs on a private copy.
//!
//! | id | strategy | header nibble |
//! |---|---|---|
//! | 0000 | [`lsb`] | 1 |
//! | 0001 | [`dct`] | 1 |
//! | 0010 | [`dwt`] | 1 |
//! | 0011 | [`multibit`] | bits per byte, 1–8 |
//! | 0100 | [`mobile`] | copies per bit, 3 |
//! | 0101 | [`chaotic_lsb`] | bits per byte, 1–3 |
//! | 0110 | [`hybrid`] | 1 |
//! | 0111 | [`adaptive`] | bits 0–1: bits per byte, bits 2–3: redundancy code |

pub mod adaptive;
pub mod blocks;
pub mod chaotic_lsb;
pub mod dct;
pub mod dwt;
pub mod hybrid;
pub mod lsb;
pub mod mobile;
pub mod multibit;

use serde::{Deserialize, Serialize};

use crate::chaos::ChaoticConfig;
use crate::image::PixelBuffer;
use crate::stego::error::StegoError;
use crate::stego::header::HEADER_BYTES;

/// Embedding algorithm, identified by its 4-bit header id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Algorithm {
    Lsb = 0,
    Dct = 1,
    Dwt = 2,
    MultibitLsb = 3,
    MobileOptimized = 4,
    ChaoticLsb = 5,
    HybridDctDwt = 6,
    /// Let the strategy selector choose.
    #[default]
    AdaptiveHybrid = 7,
}

impl Algorithm {
    pub const ALL: [Algorithm; 8] = [
        Algorithm::Lsb,
        Algorithm::Dct,
        Algorithm::Dwt,
        Algorithm::MultibitLsb,
        Algorithm::MobileOptimized,
        Algorithm::ChaoticLsb,
        Algorithm::HybridDctDwt,
        Algorithm::AdaptiveHybrid,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    /// # Errors
    /// [`StegoError::UnsupportedAlgorithm`] for ids 8–15.
    pub fn from_id(id: u8) -> Result<Self, StegoError> {
        Self::ALL.get(id as usize).copied().ok_or(StegoError::UnsupportedAlgorithm(id))
    }

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Lsb => "lsb",
            Algorithm::Dct => "dct",
            Algorithm::Dwt => "dwt",
            Algorithm::MultibitLsb => "multibit-lsb",
            Algorithm::MobileOptimized => "mobile-optimized",
            Algorithm::ChaoticLsb => "chaotic-lsb",
            Algorithm::HybridDctDwt => "hybrid-dct-dwt",
            Algorithm::AdaptiveHybrid => "adaptive-hybrid",
        }
    }

    /// Whether embedding positions depend on the chaotic seed.
    pub fn is_keyed(self) -> bool {
        matches!(self, Algorithm::ChaoticLsb | Algorithm::HybridDctDwt | Algorithm::AdaptiveHybrid)
    }
}

/// Per-call parameters shared by encoder and decoder.
#[derive(Debug, Clone, Copy)]
pub struct EmbedContext<'a> {
    /// The 4-bit header parameter.
    pub nibble: u8,
    pub chaotic: &'a ChaoticConfig,
    /// Seeds the chaotic generator when `chaotic.use_password` is set.
    pub password: Option<&'a str>,
}

/// One embedding algorithm.
pub trait EmbeddingStrategy: Sync {
    fn algorithm(&self) -> Algorithm;

    /// Whether `nibble` is a meaningful header parameter.
    fn accepts_nibble(&self, nibble: u8) -> bool;

    /// Payload bits the cover holds at `nibble`.
    fn capacity_bits(&self, image: &PixelBuffer, nibble: u8) -> usize;

    /// Write `bits` into `image`.
    ///
    /// # Errors
    /// [`StegoError::CapacityExceeded`] before any write if the bits do not
    /// fit; [`StegoError::EmbeddingFailed`] if a block cannot hold its bit.
    fn embed(&self, image: &mut PixelBuffer, bits: &[u8], ctx: &EmbedContext<'_>) -> Result<(), StegoError>;

    /// Read back `bit_len` payload bits.
    fn extract(&self, image: &PixelBuffer, bit_len: usize, ctx: &EmbedContext<'_>) -> Result<Vec<u8>, StegoError>;
}

static REGISTRY: [&dyn EmbeddingStrategy; 8] = [
    &lsb::Lsb,
    &dct::Dct,
    &dwt::Dwt,
    &multibit::MultibitLsb,
    &mobile::MobileOptimized,
    &chaotic_lsb::ChaoticLsb,
    &hybrid::HybridDctDwt,
    &adaptive::AdaptiveHybrid,
];

/// The strategy registered for `algorithm`.
pub fn strategy(algorithm: Algorithm) -> &'static dyn EmbeddingStrategy {
    REGISTRY[algorithm.id() as usize]
}

/// Colour bytes available to byte-oriented strategies.
pub(crate) fn payload_carriers(image: &PixelBuffer) -> Vec<usize> {
    image.carrier_indices(HEADER_BYTES)
}

pub(crate) fn payload_carrier_count(image: &PixelBuffer) -> usize {
    image.carrier_count(HEADER_BYTES)
}

pub(crate) fn ensure_fits(needed_bits: usize, capacity_bits: usize) -> Result<(), StegoError> {
    if needed_bits > capacity_bits {
        Err(StegoError::CapacityExceeded)
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::image::PixelBuffer;

    /// Smooth mid-range RGBA test image with some texture.
    pub fn cover(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            let r = 64 + ((x * 7 + y * 3) % 128) as u8;
            let g = 64 + ((x * 5 + y * 11) % 128) as u8;
            let b = 64 + ((x ^ y) % 128) as u8;
            [r, g, b, 255]
        })
    }

    pub fn bits(n: usize, seed: u32) -> Vec<u8> {
        let mut state = seed | 1;
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state & 1) as u8
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_roundtrip() {
        for alg in Algorithm::ALL {
            assert_eq!(Algorithm::from_id(alg.id()).unwrap(), alg);
            assert_eq!(strategy(alg).algorithm(), alg);
        }
        assert_eq!(Algorithm::from_id(8), Err(StegoError::UnsupportedAlgorithm(8)));
    }

    #[test]
    fn serde_names_match_table() {
        for alg in Algorithm::ALL {
            let json = serde_json::to_string(&alg).unwrap();
            assert_eq!(json, format!("\"{}\"", alg.name()));
        }
    }
}

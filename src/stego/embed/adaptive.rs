// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Adaptive hybrid: chaotic LSB with whole-payload repetition.
//!
//! The strategy selector picks bits per byte and a redundancy factor from
//! the cover's texture and packs both into the header nibble: bits 0–1 hold
//! bits per byte (1–3), bits 2–3 a redundancy code. The payload is written
//! as sequential copies (copy `j` of bit `i` at expanded index
//! `j * len + i`) and recovered by majority vote, with copy 0 breaking
//! ties.

use super::chaotic_lsb::{self, MAX_BITS_PER_BYTE};
use super::{ensure_fits, Algorithm, EmbedContext, EmbeddingStrategy};
use crate::image::PixelBuffer;
use crate::stego::error::StegoError;

/// Redundancy factor for each 2-bit code.
const REDUNDANCY: [usize; 4] = [1, 2, 3, 6];

pub struct AdaptiveHybrid;

/// Pack bits per byte and redundancy into a header nibble.
///
/// Returns `None` for unsupported combinations.
pub fn pack_nibble(bits_per_byte: u8, redundancy: usize) -> Option<u8> {
    if !(1..=MAX_BITS_PER_BYTE).contains(&bits_per_byte) {
        return None;
    }
    let code = REDUNDANCY.iter().position(|&r| r == redundancy)? as u8;
    Some(bits_per_byte | (code << 2))
}

/// Inverse of [`pack_nibble`].
pub fn unpack_nibble(nibble: u8) -> Option<(u8, usize)> {
    let bits_per_byte = nibble & 0b11;
    if bits_per_byte == 0 {
        return None;
    }
    Some((bits_per_byte, REDUNDANCY[((nibble >> 2) & 0b11) as usize]))
}

fn params(nibble: u8) -> Result<(u8, usize), StegoError> {
    unpack_nibble(nibble).ok_or(StegoError::InvalidInput("header parameter out of range for algorithm"))
}

fn repeat(bits: &[u8], redundancy: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(bits.len() * redundancy);
    for _ in 0..redundancy {
        out.extend_from_slice(bits);
    }
    out
}

fn vote(copies: &[u8], len: usize, redundancy: usize) -> Vec<u8> {
    (0..len)
        .map(|i| {
            let ones = (0..redundancy).filter(|&j| copies[j * len + i] == 1).count();
            match (ones * 2).cmp(&redundancy) {
                std::cmp::Ordering::Greater => 1,
                std::cmp::Ordering::Less => 0,
                std::cmp::Ordering::Equal => copies[i],
            }
        })
        .collect()
}

impl EmbeddingStrategy for AdaptiveHybrid {
    fn algorithm(&self) -> Algorithm {
        Algorithm::AdaptiveHybrid
    }

    fn accepts_nibble(&self, nibble: u8) -> bool {
        unpack_nibble(nibble).is_some()
    }

    fn capacity_bits(&self, image: &PixelBuffer, nibble: u8) -> usize {
        match unpack_nibble(nibble) {
            Some((cap, redundancy)) => chaotic_lsb::capacity(image, cap) / redundancy,
            None => 0,
        }
    }

    fn embed(&self, image: &mut PixelBuffer, bits: &[u8], ctx: &EmbedContext<'_>) -> Result<(), StegoError> {
        let (cap, redundancy) = params(ctx.nibble)?;
        ensure_fits(bits.len(), self.capacity_bits(image, ctx.nibble))?;
        chaotic_lsb::embed_bits(image, &repeat(bits, redundancy), cap, ctx)
    }

    fn extract(&self, image: &PixelBuffer, bit_len: usize, ctx: &EmbedContext<'_>) -> Result<Vec<u8>, StegoError> {
        let (cap, redundancy) = params(ctx.nibble)?;
        ensure_fits(bit_len, self.capacity_bits(image, ctx.nibble))?;
        let copies = chaotic_lsb::extract_bits(image, bit_len * redundancy, cap, ctx)?;
        Ok(vote(&copies, bit_len, redundancy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaos::ChaoticConfig;
    use crate::stego::embed::test_support::{bits, cover};

    #[test]
    fn nibble_packing() {
        assert_eq!(pack_nibble(2, 3), Some(0b1010));
        assert_eq!(unpack_nibble(0b1010), Some((2, 3)));
        assert_eq!(pack_nibble(3, 6), Some(0b1111));
        assert_eq!(pack_nibble(1, 1), Some(1));
        assert_eq!(pack_nibble(0, 1), None);
        assert_eq!(pack_nibble(2, 4), None);
        assert_eq!(unpack_nibble(0b0100), None);
    }

    #[test]
    fn roundtrip_every_combination() {
        let cfg = ChaoticConfig::default();
        for cap in 1..=MAX_BITS_PER_BYTE {
            for redundancy in REDUNDANCY {
                let nibble = pack_nibble(cap, redundancy).unwrap();
                let ctx = EmbedContext { nibble, chaotic: &cfg, password: Some("adaptive") };
                let mut img = cover(48, 48);
                let payload = bits(120, cap as u32 * 7 + redundancy as u32);
                AdaptiveHybrid.embed(&mut img, &payload, &ctx).unwrap();
                assert_eq!(AdaptiveHybrid.extract(&img, 120, &ctx).unwrap(), payload, "{cap} x{redundancy}");
            }
        }
    }

    #[test]
    fn vote_corrects_one_bad_copy_and_ties_take_first() {
        let good = [1u8, 0, 1];
        let mut copies = repeat(&good, 3);
        copies[3] ^= 1;
        copies[8] ^= 1;
        assert_eq!(vote(&copies, 3, 3), good);

        let tied = [1u8, 0, 0, 1];
        assert_eq!(vote(&tied, 2, 2), vec![1, 0]);
    }

    #[test]
    fn capacity_divides_by_redundancy() {
        let img = cover(48, 48);
        let base = chaotic_lsb::capacity(&img, 2);
        assert_eq!(AdaptiveHybrid.capacity_bits(&img, pack_nibble(2, 6).unwrap()), base / 6);
        assert_eq!(AdaptiveHybrid.capacity_bits(&img, 0), 0);
    }
}

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Redundant LSB for covers that get lightly re-processed on phones.
//!
//! Each bit is written to bit 0 of [`REDUNDANCY`] consecutive carrier bytes,
//! followed by one untouched spacer byte. Extraction takes the majority of
//! the copies, so an isolated flipped copy is corrected. This is the only
//! strategy that recovers from noise instead of failing.

use super::{ensure_fits, payload_carrier_count, payload_carriers, Algorithm, EmbedContext, EmbeddingStrategy};
use crate::image::PixelBuffer;
use crate::stego::error::StegoError;

/// Copies written per payload bit.
pub const REDUNDANCY: usize = 3;
const STRIDE: usize = REDUNDANCY + 1;

pub struct MobileOptimized;

impl EmbeddingStrategy for MobileOptimized {
    fn algorithm(&self) -> Algorithm {
        Algorithm::MobileOptimized
    }

    fn accepts_nibble(&self, nibble: u8) -> bool {
        nibble as usize == REDUNDANCY
    }

    fn capacity_bits(&self, image: &PixelBuffer, _nibble: u8) -> usize {
        payload_carrier_count(image) / STRIDE
    }

    fn embed(&self, image: &mut PixelBuffer, bits: &[u8], _ctx: &EmbedContext<'_>) -> Result<(), StegoError> {
        ensure_fits(bits.len(), self.capacity_bits(image, REDUNDANCY as u8))?;
        let carriers = payload_carriers(image);
        let data = image.data_mut();
        for (group, &bit) in carriers.chunks_exact(STRIDE).zip(bits) {
            for &idx in &group[..REDUNDANCY] {
                data[idx] = (data[idx] & !1) | bit;
            }
        }
        Ok(())
    }

    fn extract(&self, image: &PixelBuffer, bit_len: usize, _ctx: &EmbedContext<'_>) -> Result<Vec<u8>, StegoError> {
        ensure_fits(bit_len, self.capacity_bits(image, REDUNDANCY as u8))?;
        let data = image.data();
        Ok(payload_carriers(image)
            .chunks_exact(STRIDE)
            .take(bit_len)
            .map(|group| {
                let ones: usize = group[..REDUNDANCY].iter().map(|&i| (data[i] & 1) as usize).sum();
                u8::from(ones * 2 > REDUNDANCY)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaos::ChaoticConfig;
    use crate::stego::embed::test_support::{bits, cover};

    fn ctx(cfg: &ChaoticConfig) -> EmbedContext<'_> {
        EmbedContext { nibble: REDUNDANCY as u8, chaotic: cfg, password: None }
    }

    #[test]
    fn majority_vote_corrects_single_flips() {
        let cfg = ChaoticConfig::default();
        let mut img = cover(24, 24);
        let payload = bits(300, 11);
        MobileOptimized.embed(&mut img, &payload, &ctx(&cfg)).unwrap();

        // Flip one copy of every bit; spacers and other copies stay intact.
        let carriers = payload_carriers(&img);
        for (k, group) in carriers.chunks_exact(STRIDE).take(payload.len()).enumerate() {
            img.data_mut()[group[k % REDUNDANCY]] ^= 1;
        }
        assert_eq!(MobileOptimized.extract(&img, payload.len(), &ctx(&cfg)).unwrap(), payload);
    }

    #[test]
    fn spacer_bytes_untouched() {
        let cfg = ChaoticConfig::default();
        let original = cover(24, 24);
        let mut img = original.clone();
        MobileOptimized.embed(&mut img, &bits(100, 5), &ctx(&cfg)).unwrap();
        for group in payload_carriers(&img).chunks_exact(STRIDE).take(100) {
            assert_eq!(img.data()[group[REDUNDANCY]], original.data()[group[REDUNDANCY]]);
        }
    }

    #[test]
    fn only_three_copies_accepted() {
        assert!(MobileOptimized.accepts_nibble(3));
        assert!(!MobileOptimized.accepts_nibble(1));
    }
}

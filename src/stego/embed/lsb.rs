// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Plain LSB: one payload bit in bit 0 of each carrier byte, in order.

use super::{ensure_fits, payload_carrier_count, payload_carriers, Algorithm, EmbedContext, EmbeddingStrategy};
use crate::image::PixelBuffer;
use crate::stego::error::StegoError;

pub struct Lsb;

impl EmbeddingStrategy for Lsb {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Lsb
    }

    fn accepts_nibble(&self, nibble: u8) -> bool {
        nibble == 1
    }

    fn capacity_bits(&self, image: &PixelBuffer, _nibble: u8) -> usize {
        payload_carrier_count(image)
    }

    fn embed(&self, image: &mut PixelBuffer, bits: &[u8], _ctx: &EmbedContext<'_>) -> Result<(), StegoError> {
        ensure_fits(bits.len(), payload_carrier_count(image))?;
        let carriers = payload_carriers(image);
        let data = image.data_mut();
        for (&idx, &bit) in carriers.iter().zip(bits) {
            data[idx] = (data[idx] & !1) | bit;
        }
        Ok(())
    }

    fn extract(&self, image: &PixelBuffer, bit_len: usize, _ctx: &EmbedContext<'_>) -> Result<Vec<u8>, StegoError> {
        ensure_fits(bit_len, payload_carrier_count(image))?;
        let data = image.data();
        Ok(payload_carriers(image).iter().take(bit_len).map(|&i| data[i] & 1).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaos::ChaoticConfig;
    use crate::stego::embed::test_support::{bits, cover};
    use crate::stego::header::HEADER_BYTES;

    #[test]
    fn roundtrip_skips_header_and_alpha() {
        let cfg = ChaoticConfig::default();
        let ctx = EmbedContext { nibble: 1, chaotic: &cfg, password: None };
        let original = cover(16, 16);
        let mut img = original.clone();
        let payload = bits(500, 7);
        Lsb.embed(&mut img, &payload, &ctx).unwrap();
        assert_eq!(Lsb.extract(&img, 500, &ctx).unwrap(), payload);
        assert_eq!(&img.data()[..HEADER_BYTES], &original.data()[..HEADER_BYTES]);
        for i in (3..img.data().len()).step_by(4) {
            assert_eq!(img.data()[i], original.data()[i]);
        }
    }

    #[test]
    fn capacity_counts_colour_bytes() {
        // 10x10: 400 bytes, 360 after the header, 270 of them colour.
        assert_eq!(Lsb.capacity_bits(&cover(10, 10), 1), 270);
        let cfg = ChaoticConfig::default();
        let ctx = EmbedContext { nibble: 1, chaotic: &cfg, password: None };
        let mut img = cover(10, 10);
        assert_eq!(Lsb.embed(&mut img, &bits(271, 1), &ctx), Err(StegoError::CapacityExceeded));
        assert_eq!(img, cover(10, 10));
    }
}

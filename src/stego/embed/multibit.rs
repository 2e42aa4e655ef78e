// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Multi-bit LSB: the low `capacity` bits of each carrier byte hold one
//! payload symbol, `byte = (byte & !mask) | symbol` with
//! `mask = (1 << capacity) - 1`.

use super::{ensure_fits, payload_carrier_count, payload_carriers, Algorithm, EmbedContext, EmbeddingStrategy};
use crate::bits::{chunk_symbols, unchunk_symbols};
use crate::image::PixelBuffer;
use crate::stego::error::StegoError;

pub struct MultibitLsb;

fn mask(capacity: u8) -> u8 {
    ((1u16 << capacity) - 1) as u8
}

impl EmbeddingStrategy for MultibitLsb {
    fn algorithm(&self) -> Algorithm {
        Algorithm::MultibitLsb
    }

    fn accepts_nibble(&self, nibble: u8) -> bool {
        (1..=8).contains(&nibble)
    }

    fn capacity_bits(&self, image: &PixelBuffer, nibble: u8) -> usize {
        payload_carrier_count(image) * nibble as usize
    }

    fn embed(&self, image: &mut PixelBuffer, bits: &[u8], ctx: &EmbedContext<'_>) -> Result<(), StegoError> {
        let cap = ctx.nibble;
        ensure_fits(bits.len(), self.capacity_bits(image, cap))?;
        let m = mask(cap);
        let symbols = chunk_symbols(bits, cap as usize);
        let carriers = payload_carriers(image);
        let data = image.data_mut();
        for (&idx, &sym) in carriers.iter().zip(&symbols) {
            data[idx] = (data[idx] & !m) | (sym & m);
        }
        Ok(())
    }

    fn extract(&self, image: &PixelBuffer, bit_len: usize, ctx: &EmbedContext<'_>) -> Result<Vec<u8>, StegoError> {
        let cap = ctx.nibble;
        ensure_fits(bit_len, self.capacity_bits(image, cap))?;
        let m = mask(cap);
        let n_symbols = (bit_len + cap as usize - 1) / cap as usize;
        let data = image.data();
        let symbols: Vec<u8> = payload_carriers(image)
            .iter()
            .take(n_symbols)
            .map(|&i| data[i] & m)
            .collect();
        Ok(unchunk_symbols(&symbols, cap as usize, bit_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaos::ChaoticConfig;
    use crate::stego::embed::test_support::{bits, cover};

    #[test]
    fn every_capacity_roundtrips() {
        let cfg = ChaoticConfig::default();
        for cap in 1..=8u8 {
            let ctx = EmbedContext { nibble: cap, chaotic: &cfg, password: None };
            let mut img = cover(20, 20);
            let payload = bits(800 + cap as usize, cap as u32);
            MultibitLsb.embed(&mut img, &payload, &ctx).unwrap();
            assert_eq!(MultibitLsb.extract(&img, payload.len(), &ctx).unwrap(), payload, "cap {cap}");
        }
    }

    #[test]
    fn mask_values() {
        assert_eq!(mask(1), 0b1);
        assert_eq!(mask(3), 0b111);
        assert_eq!(mask(8), 0xFF);
    }

    #[test]
    fn change_bounded_by_mask() {
        let cfg = ChaoticConfig::default();
        let ctx = EmbedContext { nibble: 2, chaotic: &cfg, password: None };
        let original = cover(20, 20);
        let mut img = original.clone();
        MultibitLsb.embed(&mut img, &bits(400, 3), &ctx).unwrap();
        for (a, b) in img.data().iter().zip(original.data()) {
            assert!((*a as i16 - *b as i16).abs() <= 3);
        }
    }
}

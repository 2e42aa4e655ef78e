// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Haar DWT embedding: one bit per colour channel of every usable block,
//! in coefficient (1, 1) of a detail subband. The subband rotates through
//! LH, HL and HH by the block's ordinal among usable blocks.

use super::blocks::{channel_units, embed_units, extract_units, BlockGrid, Codec, Unit, COLOUR_CHANNELS};
use super::{ensure_fits, Algorithm, EmbedContext, EmbeddingStrategy};
use crate::image::PixelBuffer;
use crate::stego::error::StegoError;
use crate::transform::DetailBand;

pub struct Dwt;

fn units(grid: &BlockGrid, n_bits: usize) -> Vec<Unit> {
    let blocks = grid
        .usable()
        .iter()
        .enumerate()
        .map(|(ordinal, &b)| (b, Codec::Dwt(DetailBand::for_block(ordinal))));
    let mut units = channel_units(blocks);
    units.truncate(n_bits);
    units
}

impl EmbeddingStrategy for Dwt {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Dwt
    }

    fn accepts_nibble(&self, nibble: u8) -> bool {
        nibble == 1
    }

    fn capacity_bits(&self, image: &PixelBuffer, _nibble: u8) -> usize {
        BlockGrid::new(image).usable().len() * COLOUR_CHANNELS
    }

    fn embed(&self, image: &mut PixelBuffer, bits: &[u8], _ctx: &EmbedContext<'_>) -> Result<(), StegoError> {
        let grid = BlockGrid::new(image);
        ensure_fits(bits.len(), grid.usable().len() * COLOUR_CHANNELS)?;
        embed_units(image, &grid, &units(&grid, bits.len()), bits)
    }

    fn extract(&self, image: &PixelBuffer, bit_len: usize, _ctx: &EmbedContext<'_>) -> Result<Vec<u8>, StegoError> {
        let grid = BlockGrid::new(image);
        ensure_fits(bit_len, grid.usable().len() * COLOUR_CHANNELS)?;
        Ok(extract_units(image, &grid, &units(&grid, bit_len)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaos::ChaoticConfig;
    use crate::stego::embed::test_support::{bits, cover};

    #[test]
    fn roundtrip_partial_payload() {
        let cfg = ChaoticConfig::default();
        let ctx = EmbedContext { nibble: 1, chaotic: &cfg, password: None };
        let original = cover(64, 64);
        let mut img = original.clone();
        let payload = bits(100, 23);
        Dwt.embed(&mut img, &payload, &ctx).unwrap();
        assert_eq!(Dwt.extract(&img, 100, &ctx).unwrap(), payload);
        // Blocks past the payload are untouched.
        let last_row = &img.data()[img.data().len() - 64 * 4..];
        assert_eq!(last_row, &original.data()[original.data().len() - 64 * 4..]);
    }

    #[test]
    fn bands_rotate_over_usable_blocks() {
        let grid = BlockGrid::new(&cover(64, 64));
        let u = units(&grid, 9);
        let bands: Vec<Codec> = u.iter().step_by(3).map(|unit| unit.codec).collect();
        assert_eq!(
            bands,
            vec![Codec::Dwt(DetailBand::Lh), Codec::Dwt(DetailBand::Hl), Codec::Dwt(DetailBand::Hh)]
        );
    }
}

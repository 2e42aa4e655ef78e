// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! DCT embedding: one bit per colour channel of every usable 8×8 block,
//! carried by the parity of the quantised mid-frequency coefficient at
//! row 3, column 4.

use super::blocks::{channel_units, embed_units, extract_units, BlockGrid, Codec, Unit, COLOUR_CHANNELS};
use super::{ensure_fits, Algorithm, EmbedContext, EmbeddingStrategy};
use crate::image::PixelBuffer;
use crate::stego::error::StegoError;

pub struct Dct;

fn units(grid: &BlockGrid, n_bits: usize) -> Vec<Unit> {
    let mut units = channel_units(grid.usable().iter().map(|&b| (b, Codec::Dct)));
    units.truncate(n_bits);
    units
}

impl EmbeddingStrategy for Dct {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Dct
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

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Hybrid DCT/DWT: payload blocks are drawn chaotically from the usable
//! blocks, three bits per block. The k-th selected block uses the DCT codec
//! for even k and the DWT codec for odd k, with the DWT subband rotating by
//! `k / 2`.

use super::blocks::{channel_units, embed_units, extract_units, BlockGrid, Codec, Unit, COLOUR_CHANNELS};
use super::{ensure_fits, Algorithm, EmbedContext, EmbeddingStrategy};
use crate::chaos::generate_embedding_positions;
use crate::image::PixelBuffer;
use crate::stego::error::StegoError;
use crate::transform::DetailBand;

pub struct HybridDctDwt;

fn capacity(grid: &BlockGrid) -> usize {
    (grid.usable().len() / 4) * COLOUR_CHANNELS
}

fn units(grid: &BlockGrid, n_bits: usize, ctx: &EmbedContext<'_>) -> Result<Vec<Unit>, StegoError> {
    let n_blocks = (n_bits + COLOUR_CHANNELS - 1) / COLOUR_CHANNELS;
    let usable = grid.usable();
    let picks = generate_embedding_positions(usable.len(), n_blocks, ctx.password, ctx.chaotic)?;
    let blocks = picks.into_iter().enumerate().map(|(k, p)| {
        let codec = if k % 2 == 0 { Codec::Dct } else { Codec::Dwt(DetailBand::for_block(k / 2)) };
        (usable[p], codec)
    });
    let mut units = channel_units(blocks);
    units.truncate(n_bits);
    Ok(units)
}

impl EmbeddingStrategy for HybridDctDwt {
    fn algorithm(&self) -> Algorithm {
        Algorithm::HybridDctDwt
    }

    fn accepts_nibble(&self, nibble: u8) -> bool {
        nibble == 1
    }

    fn capacity_bits(&self, image: &PixelBuffer, _nibble: u8) -> usize {
        capacity(&BlockGrid::new(image))
    }

    fn embed(&self, image: &mut PixelBuffer, bits: &[u8], ctx: &EmbedContext<'_>) -> Result<(), StegoError> {
        let grid = BlockGrid::new(image);
        ensure_fits(bits.len(), capacity(&grid))?;
        let units = units(&grid, bits.len(), ctx)?;
        embed_units(image, &grid, &units, bits)
    }

    fn extract(&self, image: &PixelBuffer, bit_len: usize, ctx: &EmbedContext<'_>) -> Result<Vec<u8>, StegoError> {
        let grid = BlockGrid::new(image);
        ensure_fits(bit_len, capacity(&grid))?;
        let units = units(&grid, bit_len, ctx)?;
        Ok(extract_units(image, &grid, &units))
    }
}

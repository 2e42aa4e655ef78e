// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! 8×8 block geometry and single-coefficient block codecs shared by the
//! DCT, DWT and hybrid strategies.
//!
//! One embedding unit is one colour channel of one block and carries one
//! bit. Blocks holding any header pixel are reserved. Partial blocks at the
//! right and bottom edges are ignored.
//!
//! After quantising the coefficient, the block is reconstructed, rounded to
//! pixel bytes and transformed again; the bit must survive that round trip.
//! If it does not (clamping near 0 or 255, or rounding across a decision
//! boundary), the next-nearest parity-correct levels are tried before the
//! unit fails with [`StegoError::EmbeddingFailed`].
//!
//! All units are computed against the unmodified cover and only written
//! back once every unit succeeded. With the `parallel` feature the units
//! are computed on rayon workers; the unit list (and with it every chaotic
//! position) is fixed before the fan-out.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::image::{PixelBuffer, CHANNELS};
use crate::stego::error::StegoError;
use crate::stego::header::HEADER_BYTES;
use crate::transform::{
    dct2d, dwt2d, idct2d, idwt2d, parity_candidates, read_parity, to_pixel, Block, DetailBand,
    BLOCK, BLOCK_LEN,
};

/// Colour channels per block.
pub const COLOUR_CHANNELS: usize = 3;

/// DCT coefficient (row 3, column 4) carrying the bit.
const DCT_COEFF: usize = 3 * BLOCK + 4;
const DCT_STEP: f64 = 16.0;

/// Coefficient (1, 1) of the 4×4 detail subband.
const DWT_COEFF: usize = 4 + 1;
const DWT_STEP: f64 = 12.0;

/// Quantisation levels tried per unit.
const CANDIDATES: usize = 6;

/// How a unit's bit is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Codec {
    Dct,
    Dwt(DetailBand),
}

fn round_block(samples: &Block) -> [u8; BLOCK_LEN] {
    let mut out = [0u8; BLOCK_LEN];
    for (o, &s) in out.iter_mut().zip(samples.iter()) {
        *o = to_pixel(s);
    }
    out
}

fn as_samples(pixels: &[u8; BLOCK_LEN]) -> Block {
    let mut out = [0.0; BLOCK_LEN];
    for (o, &p) in out.iter_mut().zip(pixels.iter()) {
        *o = p as f64;
    }
    out
}

impl Codec {
    /// New pixel values carrying `bit`, or `None` if no candidate survives
    /// rounding.
    fn embed(self, samples: &Block, bit: u8) -> Option<[u8; BLOCK_LEN]> {
        match self {
            Codec::Dct => {
                let coeffs = dct2d(samples);
                parity_candidates(coeffs[DCT_COEFF], DCT_STEP, bit, CANDIDATES)
                    .into_iter()
                    .map(|level| {
                        let mut c = coeffs;
                        c[DCT_COEFF] = level;
                        round_block(&idct2d(&c))
                    })
                    .find(|px| self.extract(&as_samples(px)) == bit)
            }
            Codec::Dwt(band) => {
                let bands = dwt2d(samples);
                parity_candidates(bands.band(band)[DWT_COEFF], DWT_STEP, bit, CANDIDATES)
                    .into_iter()
                    .map(|level| {
                        let mut b = bands;
                        b.band_mut(band)[DWT_COEFF] = level;
                        round_block(&idwt2d(&b))
                    })
                    .find(|px| self.extract(&as_samples(px)) == bit)
            }
        }
    }

    fn extract(self, samples: &Block) -> u8 {
        match self {
            Codec::Dct => read_parity(dct2d(samples)[DCT_COEFF], DCT_STEP),
            Codec::Dwt(band) => read_parity(dwt2d(samples).band(band)[DWT_COEFF], DWT_STEP),
        }
    }
}

/// One bit-carrying (block, channel) pair.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Unit {
    pub block: usize,
    pub channel: usize,
    pub codec: Codec,
}

/// The block grid of a cover and its non-reserved blocks.
#[derive(Debug, Clone)]
pub struct BlockGrid {
    width: usize,
    blocks_wide: usize,
    usable: Vec<usize>,
}

impl BlockGrid {
    pub fn new(image: &PixelBuffer) -> Self {
        let width = image.width() as usize;
        let blocks_wide = width / BLOCK;
        let blocks_tall = image.height() as usize / BLOCK;
        let mut reserved = vec![false; blocks_wide * blocks_tall];
        if width > 0 {
            for p in 0..HEADER_BYTES / CHANNELS {
                let (bx, by) = ((p % width) / BLOCK, (p / width) / BLOCK);
                if bx < blocks_wide && by < blocks_tall {
                    reserved[by * blocks_wide + bx] = true;
                }
            }
        }
        let usable = (0..reserved.len()).filter(|&b| !reserved[b]).collect();
        Self { width, blocks_wide, usable }
    }

    /// Indices of blocks that may carry payload, in raster order.
    pub fn usable(&self) -> &[usize] {
        &self.usable
    }

    fn origin(&self, block: usize) -> (usize, usize) {
        ((block % self.blocks_wide) * BLOCK, (block / self.blocks_wide) * BLOCK)
    }

    fn read(&self, image: &PixelBuffer, unit: &Unit) -> Block {
        let (x0, y0) = self.origin(unit.block);
        let data = image.data();
        let mut out = [0.0; BLOCK_LEN];
        for r in 0..BLOCK {
            for c in 0..BLOCK {
                out[r * BLOCK + c] = data[((y0 + r) * self.width + x0 + c) * CHANNELS + unit.channel] as f64;
            }
        }
        out
    }

    fn write(&self, image: &mut PixelBuffer, unit: &Unit, pixels: &[u8; BLOCK_LEN]) {
        let (x0, y0) = self.origin(unit.block);
        let width = self.width;
        let data = image.data_mut();
        for r in 0..BLOCK {
            for c in 0..BLOCK {
                data[((y0 + r) * width + x0 + c) * CHANNELS + unit.channel] = pixels[r * BLOCK + c];
            }
        }
    }
}

/// Units covering every colour channel of `blocks`, in order.
pub(crate) fn channel_units(blocks: impl IntoIterator<Item = (usize, Codec)>) -> Vec<Unit> {
    blocks
        .into_iter()
        .flat_map(|(block, codec)| (0..COLOUR_CHANNELS).map(move |channel| Unit { block, channel, codec }))
        .collect()
}

/// Embed `bits[i]` into `units[i]`. Nothing is written unless every unit
/// succeeds.
pub(crate) fn embed_units(
    image: &mut PixelBuffer,
    grid: &BlockGrid,
    units: &[Unit],
    bits: &[u8],
) -> Result<(), StegoError> {
    let cover: &PixelBuffer = image;
    let work = |(unit, &bit): (&Unit, &u8)| unit.codec.embed(&grid.read(cover, unit), bit);

    #[cfg(feature = "parallel")]
    let results: Option<Vec<[u8; BLOCK_LEN]>> = units.par_iter().zip(bits.par_iter()).map(work).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Option<Vec<[u8; BLOCK_LEN]>> = units.iter().zip(bits.iter()).map(work).collect();

    let results = results.ok_or(StegoError::EmbeddingFailed)?;
    for (unit, pixels) in units.iter().zip(&results) {
        grid.write(image, unit, pixels);
    }
    Ok(())
}

pub(crate) fn extract_units(image: &PixelBuffer, grid: &BlockGrid, units: &[Unit]) -> Vec<u8> {
    let work = |unit: &Unit| unit.codec.extract(&grid.read(image, unit));

    #[cfg(feature = "parallel")]
    let bits = units.par_iter().map(work).collect();
    #[cfg(not(feature = "parallel"))]
    let bits = units.iter().map(work).collect();

    bits
}

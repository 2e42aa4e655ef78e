// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Chaotic LSB: 1–3 bits per carrier byte at positions drawn from the
//! chaotic generator, each symbol XOR-whitened with the chaotic keystream.
//!
//! Positions are drawn over the carrier bytes, so the 25% saturation
//! ceiling caps capacity at a quarter of the carriers times the bits per
//! byte.

use super::{ensure_fits, payload_carrier_count, payload_carriers, Algorithm, EmbedContext, EmbeddingStrategy};
use crate::bits::{chunk_symbols, unchunk_symbols};
use crate::chaos::{generate_embedding_positions, generate_key_stream, MAX_KEY_STREAM_LEN};
use crate::image::PixelBuffer;
use crate::stego::error::StegoError;

/// Largest bits-per-byte setting.
pub const MAX_BITS_PER_BYTE: u8 = 3;

pub struct ChaoticLsb;

fn mask(cap: u8) -> u8 {
    (1u8 << cap) - 1
}

pub(crate) fn capacity(image: &PixelBuffer, cap: u8) -> usize {
    (payload_carrier_count(image) / 4) * cap as usize
}

/// Raw byte indices and keystream for `n_symbols` symbols.
fn keyed_positions(
    image: &PixelBuffer,
    n_symbols: usize,
    ctx: &EmbedContext<'_>,
) -> Result<(Vec<usize>, Vec<u8>), StegoError> {
    if n_symbols == 0 {
        return Ok((Vec::new(), Vec::new()));
    }
    let carriers = payload_carriers(image);
    let positions = generate_embedding_positions(carriers.len(), n_symbols, ctx.password, ctx.chaotic)?;
    let stream = generate_key_stream(n_symbols.min(MAX_KEY_STREAM_LEN), ctx.password, ctx.chaotic)?;
    Ok((positions.into_iter().map(|p| carriers[p]).collect(), stream))
}

/// Embed `bits` at `cap` bits per byte.
pub(crate) fn embed_bits(
    image: &mut PixelBuffer,
    bits: &[u8],
    cap: u8,
    ctx: &EmbedContext<'_>,
) -> Result<(), StegoError> {
    ensure_fits(bits.len(), capacity(image, cap))?;
    let symbols = chunk_symbols(bits, cap as usize);
    let (indices, stream) = keyed_positions(image, symbols.len(), ctx)?;
    let m = mask(cap);
    let data = image.data_mut();
    for (i, (&idx, &sym)) in indices.iter().zip(&symbols).enumerate() {
        let whitened = (sym ^ stream[i % stream.len()]) & m;
        data[idx] = (data[idx] & !m) | whitened;
    }
    Ok(())
}

/// Extract `bit_len` bits embedded at `cap` bits per byte.
pub(crate) fn extract_bits(
    image: &PixelBuffer,
    bit_len: usize,
    cap: u8,
    ctx: &EmbedContext<'_>,
) -> Result<Vec<u8>, StegoError> {
    ensure_fits(bit_len, capacity(image, cap))?;
    let n_symbols = (bit_len + cap as usize - 1) / cap as usize;
    let (indices, stream) = keyed_positions(image, n_symbols, ctx)?;
    let m = mask(cap);
    let data = image.data();
    let symbols: Vec<u8> = indices
        .iter()
        .enumerate()
        .map(|(i, &idx)| (data[idx] ^ stream[i % stream.len()]) & m)
        .collect();
    Ok(unchunk_symbols(&symbols, cap as usize, bit_len))
}

impl EmbeddingStrategy for ChaoticLsb {
    fn algorithm(&self) -> Algorithm {
        Algorithm::ChaoticLsb
    }

    fn accepts_nibble(&self, nibble: u8) -> bool {
        (1..=MAX_BITS_PER_BYTE).contains(&nibble)
    }

    fn capacity_bits(&self, image: &PixelBuffer, nibble: u8) -> usize {
        capacity(image, nibble)
    }

    fn embed(&self, image: &mut PixelBuffer, bits: &[u8], ctx: &EmbedContext<'_>) -> Result<(), StegoError> {
        embed_bits(image, bits, ctx.nibble, ctx)
    }

    fn extract(&self, image: &PixelBuffer, bit_len: usize, ctx: &EmbedContext<'_>) -> Result<Vec<u8>, StegoError> {
        extract_bits(image, bit_len, ctx.nibble, ctx)
    }
}

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Bit-vector helpers shared by the compression and embedding layers.
//!
//! A "bit vector" is a `Vec<u8>` holding one 0/1 value per element, MSB
//! first within each source byte.

/// Convert bytes to a bit vector (MSB first within each byte).
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit_pos in (0..8).rev() {
            bits.push((byte >> bit_pos) & 1);
        }
    }
    bits
}

/// Convert a bit vector (MSB first) back to bytes.
/// Pads the last byte with zero bits if `bits.len()` is not a multiple of 8.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((bits.len() + 7) / 8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit & 1) << (7 - i);
        }
        bytes.push(byte);
    }
    bytes
}

/// Write the low `width` bits of `value` MSB first.
pub fn push_uint(bits: &mut Vec<u8>, value: u32, width: u32) {
    for shift in (0..width).rev() {
        bits.push(((value >> shift) & 1) as u8);
    }
}

/// Read `bits` (MSB first) as an unsigned integer.
pub fn read_uint(bits: &[u8]) -> u32 {
    bits.iter().fold(0u32, |acc, &b| (acc << 1) | (b & 1) as u32)
}

/// Group a bit vector into `width`-bit symbols, zero-padding the last one.
pub fn chunk_symbols(bits: &[u8], width: usize) -> Vec<u8> {
    bits.chunks(width)
        .map(|chunk| {
            let mut sym = 0u8;
            for i in 0..width {
                sym = (sym << 1) | chunk.get(i).copied().unwrap_or(0);
            }
            sym
        })
        .collect()
}

/// Inverse of [`chunk_symbols`], truncated to `bit_len` bits.
pub fn unchunk_symbols(symbols: &[u8], width: usize, bit_len: usize) -> Vec<u8> {
    let mut bits = Vec::with_capacity(symbols.len() * width);
    for &sym in symbols {
        for shift in (0..width).rev() {
            bits.push((sym >> shift) & 1);
        }
    }
    bits.truncate(bit_len);
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_to_bytes_partial_byte() {
        let bits = vec![1u8, 0, 1, 1, 0];
        assert_eq!(bits_to_bytes(&bits), vec![0xB0]);
    }

    #[test]
    fn uint_msb_first() {
        let mut bits = Vec::new();
        push_uint(&mut bits, 0b1011, 4);
        assert_eq!(bits, vec![1, 0, 1, 1]);
        assert_eq!(read_uint(&bits), 11);
    }

    #[test]
    fn symbols_pad_and_truncate() {
        let bits = vec![1, 1, 0, 1, 0, 1, 1];
        let syms = chunk_symbols(&bits, 3);
        assert_eq!(syms, vec![0b110, 0b101, 0b100]);
        assert_eq!(unchunk_symbols(&syms, 3, bits.len()), bits);
    }
}

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! The unencrypted 40-bit binary header.
//!
//! Stored one bit per byte in bit 0 of raw buffer bytes `0..40` (alpha
//! bytes included), MSB first:
//!
//! ```text
//! bytes  0..32  payload length in bits (u32)
//! bytes 32..36  algorithm id
//! bytes 36..40  algorithm parameter nibble
//! ```
//!
//! The header is read before anything else and tells the decoder which
//! strategy to dispatch to, so decoding never re-runs image analysis.

use crate::bits::{push_uint, read_uint};
use crate::stego::error::StegoError;

/// Raw bytes occupied by the header.
pub const HEADER_BYTES: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryHeader {
    pub payload_bits: u32,
    pub algorithm_id: u8,
    pub nibble: u8,
}

impl BinaryHeader {
    pub fn new(payload_bits: u32, algorithm_id: u8, nibble: u8) -> Self {
        Self { payload_bits, algorithm_id: algorithm_id & 0x0F, nibble: nibble & 0x0F }
    }

    pub fn to_bits(&self) -> Vec<u8> {
        let mut bits = Vec::with_capacity(HEADER_BYTES);
        push_uint(&mut bits, self.payload_bits, 32);
        push_uint(&mut bits, self.algorithm_id as u32, 4);
        push_uint(&mut bits, self.nibble as u32, 4);
        bits
    }

    /// Write the header into bit 0 of `data[0..40]`.
    ///
    /// # Errors
    /// [`StegoError::CapacityExceeded`] if `data` is shorter than the header.
    pub fn write(&self, data: &mut [u8]) -> Result<(), StegoError> {
        if data.len() < HEADER_BYTES {
            return Err(StegoError::CapacityExceeded);
        }
        for (byte, bit) in data.iter_mut().zip(self.to_bits()) {
            *byte = (*byte & !1) | bit;
        }
        Ok(())
    }

    /// # Errors
    /// [`StegoError::NoHiddenMessage`] if `data` is shorter than the header.
    pub fn read(data: &[u8]) -> Result<Self, StegoError> {
        if data.len() < HEADER_BYTES {
            return Err(StegoError::NoHiddenMessage);
        }
        let bits: Vec<u8> = data[..HEADER_BYTES].iter().map(|b| b & 1).collect();
        Ok(Self {
            payload_bits: read_uint(&bits[..32]),
            algorithm_id: read_uint(&bits[32..36]) as u8,
            nibble: read_uint(&bits[36..40]) as u8,
        })
    }
}

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Payload compression.
//!
//! Three codecs over text: [`huffman`], [`rle`], and a hybrid that runs RLE
//! and then Huffman-codes the RLE output. The adaptive selector tries the
//! codecs allowed by the compression level and keeps whichever yields the
//! fewest bits (payload plus header).
//!
//! Compressed data travels as a self-describing blob:
//!
//! ```text
//! [1 byte ] tag: 0 none, 1 huffman, 2 rle, 3 hybrid
//! [2 bytes] header length (BE u16)
//! [N bytes] header (Huffman frequency table, UTF-8)
//! [4 bytes] payload bit length (BE u32)
//! [M bytes] payload bits, packed MSB first
//! ```

pub mod huffman;
pub mod rle;

use serde::{Deserialize, Serialize};

use crate::bits::{bits_to_bytes, bytes_to_bits};
use crate::stego::error::StegoError;

/// Upper bound on decompressed output, in characters.
pub const MAX_DECOMPRESSED_CHARS: usize = 100_000;

/// Compression requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionAlgorithm {
    None,
    Huffman,
    Rle,
    /// Pick the smallest of the codecs allowed by the level.
    #[default]
    Hybrid,
}

/// Codec actually applied, recorded in the blob tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionTag {
    None = 0,
    Huffman = 1,
    Rle = 2,
    Hybrid = 3,
}

impl CompressionTag {
    fn from_u8(v: u8) -> Result<Self, StegoError> {
        match v {
            0 => Ok(Self::None),
            1 => Ok(Self::Huffman),
            2 => Ok(Self::Rle),
            3 => Ok(Self::Hybrid),
            _ => Err(StegoError::CorruptedImage),
        }
    }
}

/// The output of [`compress`]: tag, header and payload bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedData {
    pub tag: CompressionTag,
    pub header: String,
    pub bits: Vec<u8>,
}

/// Summary carried in envelope metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionInfo {
    #[serde(rename = "alg")]
    pub tag: CompressionTag,
    #[serde(rename = "len")]
    pub original_chars: usize,
    #[serde(rename = "bits")]
    pub compressed_bits: usize,
}

impl CompressedData {
    /// Total cost in bits, counting the header.
    pub fn cost_bits(&self) -> usize {
        self.bits.len() + self.header.len() * 8
    }

    /// Serialize into the tagged blob format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StegoError> {
        let header_len: u16 = self
            .header
            .len()
            .try_into()
            .map_err(|_| StegoError::InvalidInput("compression header too long"))?;
        let bit_len: u32 = self
            .bits
            .len()
            .try_into()
            .map_err(|_| StegoError::InvalidInput("compressed payload too long"))?;
        let packed = bits_to_bytes(&self.bits);
        let mut out = Vec::with_capacity(7 + self.header.len() + packed.len());
        out.push(self.tag as u8);
        out.extend_from_slice(&header_len.to_be_bytes());
        out.extend_from_slice(self.header.as_bytes());
        out.extend_from_slice(&bit_len.to_be_bytes());
        out.extend_from_slice(&packed);
        Ok(out)
    }

    /// Parse a tagged blob.
    ///
    /// # Errors
    /// [`StegoError::CorruptedImage`] on truncation or an unknown tag.
    pub fn from_bytes(data: &[u8]) -> Result<Self, StegoError> {
        if data.len() < 3 {
            return Err(StegoError::CorruptedImage);
        }
        let tag = CompressionTag::from_u8(data[0])?;
        let header_len = u16::from_be_bytes([data[1], data[2]]) as usize;
        let mut cursor = 3;
        if data.len() < cursor + header_len + 4 {
            return Err(StegoError::CorruptedImage);
        }
        let header = std::str::from_utf8(&data[cursor..cursor + header_len])
            .map_err(|_| StegoError::CorruptedImage)?
            .to_string();
        cursor += header_len;
        let bit_len = u32::from_be_bytes([
            data[cursor],
            data[cursor + 1],
            data[cursor + 2],
            data[cursor + 3],
        ]) as usize;
        cursor += 4;
        let packed = &data[cursor..];
        if packed.len() != (bit_len + 7) / 8 {
            return Err(StegoError::CorruptedImage);
        }
        let mut bits = bytes_to_bits(packed);
        bits.truncate(bit_len);
        Ok(Self { tag, header, bits })
    }

    pub fn info(&self, original_chars: usize) -> CompressionInfo {
        CompressionInfo { tag: self.tag, original_chars, compressed_bits: self.bits.len() }
    }
}

fn utf8_bits(text: &str) -> Vec<u8> {
    bytes_to_bits(text.as_bytes())
}

fn bits_utf8(bits: &[u8]) -> Result<String, StegoError> {
    if bits.len() % 8 != 0 {
        return Err(StegoError::CorruptedImage);
    }
    String::from_utf8(bits_to_bytes(bits)).map_err(|_| StegoError::CorruptedImage)
}

fn encode_with(tag: CompressionTag, text: &str) -> CompressedData {
    match tag {
        CompressionTag::None => {
            CompressedData { tag, header: String::new(), bits: utf8_bits(text) }
        }
        CompressionTag::Huffman => {
            let enc = huffman::compress(text);
            CompressedData { tag, header: enc.header, bits: enc.bits }
        }
        CompressionTag::Rle => {
            CompressedData { tag, header: String::new(), bits: utf8_bits(&rle::compress(text)) }
        }
        CompressionTag::Hybrid => {
            let enc = huffman::compress(&rle::compress(text));
            CompressedData { tag, header: enc.header, bits: enc.bits }
        }
    }
}

/// Candidate codecs for the adaptive selector at `level` (1–9).
fn candidates(level: u8) -> &'static [CompressionTag] {
    use CompressionTag::*;
    match level {
        0..=3 => &[Rle],
        4..=6 => &[Rle, Huffman],
        _ => &[Rle, Huffman, Hybrid],
    }
}

/// Compress `text` under `algorithm`.
///
/// For [`CompressionAlgorithm::Hybrid`] every candidate allowed by `level`
/// is tried and the cheapest wins; ties keep the earlier candidate. Empty
/// input always produces an empty blob payload.
pub fn compress(text: &str, algorithm: CompressionAlgorithm, level: u8) -> CompressedData {
    match algorithm {
        CompressionAlgorithm::None => encode_with(CompressionTag::None, text),
        CompressionAlgorithm::Huffman => encode_with(CompressionTag::Huffman, text),
        CompressionAlgorithm::Rle => encode_with(CompressionTag::Rle, text),
        CompressionAlgorithm::Hybrid => {
            let mut best: Option<CompressedData> = None;
            for &tag in candidates(level) {
                let enc = encode_with(tag, text);
                if best.as_ref().map_or(true, |b| enc.cost_bits() < b.cost_bits()) {
                    best = Some(enc);
                }
            }
            // `candidates` is never empty.
            best.unwrap_or_else(|| encode_with(CompressionTag::None, text))
        }
    }
}

/// Invert [`compress`].
///
/// # Errors
/// [`StegoError::CorruptedImage`] if the data does not decode or would
/// exceed [`MAX_DECOMPRESSED_CHARS`].
pub fn decompress(data: &CompressedData) -> Result<String, StegoError> {
    let text = match data.tag {
        CompressionTag::None => bits_utf8(&data.bits)?,
        CompressionTag::Huffman => {
            huffman::decompress(&data.header, &data.bits, MAX_DECOMPRESSED_CHARS)?
        }
        CompressionTag::Rle => rle::decompress(&bits_utf8(&data.bits)?, MAX_DECOMPRESSED_CHARS)?,
        CompressionTag::Hybrid => {
            // The RLE layer may be up to twice the final text (escapes).
            let rle_text =
                huffman::decompress(&data.header, &data.bits, MAX_DECOMPRESSED_CHARS * 2)?;
            rle::decompress(&rle_text, MAX_DECOMPRESSED_CHARS)?
        }
    };
    if text.chars().count() > MAX_DECOMPRESSED_CHARS {
        return Err(StegoError::CorruptedImage);
    }
    Ok(text)
}

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Steganographic encoding and decoding pipelines.
//!
//! A message is compressed, optionally sealed under a password, framed and
//! then embedded with one of eight strategies ([`embed`]). A 40-bit header
//! ([`header`]) in the first pixels tells the decoder which strategy and
//! parameters were used, so only the password and the chaotic settings
//! have to be shared out of band.
//!
//! - [`Steganographer`] is the engine; it carries the pluggable KEM and
//!   signature scheme used for quantum-resistant sealing.
//! - [`encode`], [`encode_with_decoys`], [`decode`] and [`capacity`] run the
//!   default engine and audit through `tracing`.

pub mod audit;
pub mod embed;
pub mod envelope;
pub mod error;
pub mod header;
pub mod options;
mod pipeline;
pub mod strategy;

pub use audit::{AuditLevel, AuditRecord, AuditSink, MemoryAudit, NullAudit, TracingAudit};
pub use embed::{Algorithm, EmbeddingStrategy};
pub use error::StegoError;
pub use options::{
    CompressionOptions, DecodeOptions, EncryptionOptions, Expiry, ExpiryKind, SteganographyOptions,
};
pub use pipeline::{capacity, decode, encode, encode_with_decoys, DecodeOutcome, DecoyMessage, Steganographer};

/// Maximum pixel dimension (width or height) for encode.
/// Larger canvases are downsampled by the frontend before reaching Rust.
pub const MAX_DIMENSION: u32 = 8192;

/// Maximum total pixel count for encode (width × height).
pub const MAX_PIXELS: u32 = 16_000_000;

/// Validate image dimensions for encoding.
///
/// Called at the start of every encode.
///
/// # Errors
/// - [`StegoError::CapacityExceeded`] if the image cannot even hold the
///   header (fewer than 10 pixels).
/// - [`StegoError::InvalidInput`] if either dimension exceeds 8192 or the
///   total exceeds 16M pixels.
pub fn validate_encode_dimensions(width: u32, height: u32) -> Result<(), StegoError> {
    let pixels = width.checked_mul(height);
    if pixels.map_or(false, |p| (p as usize) * crate::image::CHANNELS < header::HEADER_BYTES) {
        return Err(StegoError::CapacityExceeded);
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION || pixels.map_or(true, |p| p > MAX_PIXELS) {
        return Err(StegoError::InvalidInput("image too large"));
    }
    Ok(())
}

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the steganography pipeline.
//!
//! [`StegoError`] covers every failure mode from buffer validation through
//! decompression, decryption and envelope checks. Capacity and header
//! failures are raised before any pixel is touched; integrity failures never
//! carry partial plaintext.

use core::fmt;

/// Errors that can occur during steganographic encoding or decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StegoError {
    /// The payload does not fit the cover with the chosen algorithm, or the
    /// chaotic position request exceeds the 25% saturation ceiling.
    CapacityExceeded,
    /// The header does not describe a plausible payload.
    NoHiddenMessage,
    /// The pixel buffer is malformed or the extracted frame cannot be parsed.
    CorruptedImage,
    /// Decryption failed: wrong password (or no frame decrypts under it).
    IncorrectPassword,
    /// The message carried an expiry that has passed.
    MessageExpired,
    /// A message decrypted, but none carried the requested decoy index.
    DecoyNotFound,
    /// HMAC or signature verification failed.
    IntegrityViolation,
    /// The header names an algorithm id this build does not implement.
    UnsupportedAlgorithm(u8),
    /// An argument was outside its documented range.
    InvalidInput(&'static str),
    /// A frequency-domain block could not hold its bit after reconstruction.
    EmbeddingFailed,
}

impl fmt::Display for StegoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded => write!(f, "message too large for this image"),
            Self::NoHiddenMessage => write!(f, "no hidden message found"),
            Self::CorruptedImage => write!(f, "image data is corrupted"),
            Self::IncorrectPassword => write!(f, "incorrect password"),
            Self::MessageExpired => write!(f, "message has expired"),
            Self::DecoyNotFound => write!(f, "no message with the requested decoy index"),
            Self::IntegrityViolation => write!(f, "integrity check failed (data was tampered with)"),
            Self::UnsupportedAlgorithm(id) => write!(f, "unsupported embedding algorithm id {id:#06b}"),
            Self::InvalidInput(what) => write!(f, "invalid input: {what}"),
            Self::EmbeddingFailed => write!(f, "cover image cannot hold the embedding"),
        }
    }
}

impl std::error::Error for StegoError {}

impl StegoError {
    /// Short stable code for collaborators that map errors to UI strings.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CapacityExceeded => "capacity_exceeded",
            Self::NoHiddenMessage => "no_hidden_message",
            Self::CorruptedImage => "corrupted_image",
            Self::IncorrectPassword => "incorrect_password",
            Self::MessageExpired => "message_expired",
            Self::DecoyNotFound => "decoy_not_found",
            Self::IntegrityViolation => "integrity_violation",
            Self::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Self::InvalidInput(_) => "invalid_input",
            Self::EmbeddingFailed => "embedding_failed",
        }
    }
}

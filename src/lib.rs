// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! # chroma-core
//!
//! Pure-Rust steganography engine for hiding text messages in RGBA pixel
//! buffers. The caller decodes the image (browser canvas, `image` crate, …)
//! and hands over raw pixels; the core returns modified pixels, the hidden
//! plaintext, or a typed [`StegoError`].
//!
//! - **Embedding**: eight strategies from plain LSB to a chaotic,
//!   repetition-coded hybrid chosen by cover statistics ([`stego::embed`],
//!   [`stego::strategy`]).
//! - **Compression**: Huffman, RLE and their combination, picked per
//!   message ([`compress`]).
//! - **Encryption**: AES-256-CBC with PBKDF2, an HMAC-authenticated envelope,
//!   and an optional post-quantum wrapper behind pluggable [`crypto::Kem`]
//!   and [`crypto::SignatureScheme`] traits ([`crypto`]).
//! - **Positions**: deterministic chaotic maps keyed by password or seed
//!   ([`chaos`]).
//!
//! The bundled lattice KEM and hash-based signature are classical
//! simulations of post-quantum constructions. They are not post-quantum
//! secure; security rests on the symmetric layer underneath.
//!
//! # Quick start
//!
//! ```rust
//! use chroma_core::{decode, encode, DecodeOptions, DecodeOutcome, PixelBuffer, SteganographyOptions};
//!
//! let cover = PixelBuffer::from_fn(64, 64, |x, y| [(x * 3) as u8, (y * 3) as u8, 128, 255]);
//! let options = SteganographyOptions { algorithm: chroma_core::Algorithm::Lsb, ..Default::default() };
//! let stego = encode(&cover, "secret message", None, &options).unwrap();
//! let decoded = decode(&stego, None, &DecodeOptions::default()).unwrap();
//! assert_eq!(decoded, DecodeOutcome::Plaintext("secret message".into()));
//! ```

pub mod bits;
pub mod chaos;
pub mod compress;
pub mod crypto;
pub mod image;
pub mod stego;
pub mod transform;

pub use chaos::{ChaoticConfig, MapType};
pub use compress::CompressionAlgorithm;
pub use crypto::{EncryptionAlgorithm, Kem, SignatureScheme, Strength};
pub use image::PixelBuffer;
pub use stego::{capacity, decode, encode, encode_with_decoys, DecodeOutcome, DecoyMessage, Steganographer};
pub use stego::{validate_encode_dimensions, MAX_DIMENSION, MAX_PIXELS};
pub use stego::{Algorithm, DecodeOptions, Expiry, ExpiryKind, SteganographyOptions, StegoError};
pub use stego::{AuditSink, MemoryAudit, NullAudit, TracingAudit};

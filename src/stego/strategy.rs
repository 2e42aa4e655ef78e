// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Adaptive strategy selection.
//!
//! The cover's luminance entropy and edge density pick a base plan:
//!
//! | condition | plan |
//! |---|---|
//! | entropy > 6 | hybrid DCT/DWT |
//! | entropy < 4 | chaotic LSB, 1 bit per byte |
//! | otherwise | chaotic LSB, 2 bits per byte |
//!
//! On a chaotic plan, edge density above 0.3 adds one bit per byte (up to 3)
//! and sets redundancy 3, and messages over 1000 characters double the
//! redundancy. Any redundancy above 1 turns the plan into adaptive-hybrid.
//! When the plan does not fit, cheaper plans are tried in order (lower
//! redundancy, then more bits per byte) before giving up.

use crate::compress::{compress, CompressionAlgorithm};
use crate::image::PixelBuffer;
use crate::stego::embed::adaptive::pack_nibble;
use crate::stego::embed::chaotic_lsb::MAX_BITS_PER_BYTE;
use crate::stego::embed::{strategy, Algorithm};
use crate::stego::error::StegoError;

const HIGH_ENTROPY: f64 = 6.0;
const LOW_ENTROPY: f64 = 4.0;
const EDGE_THRESHOLD: f64 = 32.0;
const EDGE_DENSITY: f64 = 0.3;
const LONG_MESSAGE_CHARS: usize = 1000;

/// Cover statistics driving the choice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageAnalysis {
    /// Shannon entropy of the luminance histogram, bits (0–8).
    pub entropy: f64,
    /// Fraction of pixels with `|gx| + |gy| > 32`.
    pub edge_density: f64,
}

/// Message statistics, reported alongside the choice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MessageAnalysis {
    pub chars: usize,
    /// Shannon entropy of the character distribution, bits per char.
    pub entropy: f64,
    /// `1 - compressed / uncompressed`, clamped to 0 when compression
    /// does not help.
    pub compressibility: f64,
}

/// An embedding configuration the selector can propose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub algorithm: Algorithm,
    pub bits_per_byte: u8,
    pub redundancy: usize,
}

impl Plan {
    fn hybrid() -> Self {
        Self { algorithm: Algorithm::HybridDctDwt, bits_per_byte: 1, redundancy: 1 }
    }

    fn chaotic(bits_per_byte: u8, redundancy: usize) -> Self {
        let algorithm = if redundancy > 1 { Algorithm::AdaptiveHybrid } else { Algorithm::ChaoticLsb };
        Self { algorithm, bits_per_byte, redundancy }
    }

    /// Header nibble for this plan.
    pub fn nibble(&self) -> u8 {
        match self.algorithm {
            Algorithm::AdaptiveHybrid => pack_nibble(self.bits_per_byte, self.redundancy).unwrap_or(1),
            Algorithm::ChaoticLsb => self.bits_per_byte,
            _ => 1,
        }
    }

    pub fn capacity_bits(&self, image: &PixelBuffer) -> usize {
        strategy(self.algorithm).capacity_bits(image, self.nibble())
    }
}

/// The outcome of [`select`].
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub plan: Plan,
    pub image: ImageAnalysis,
    pub capacity_bits: usize,
    /// Whether the preferred plan had to be given up for a cheaper one.
    pub fell_back: bool,
}

fn shannon(counts: impl IntoIterator<Item = usize>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    counts
        .into_iter()
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

pub fn analyze_image(image: &PixelBuffer) -> ImageAnalysis {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let mut luma = Vec::with_capacity(w * h);
    for y in 0..h {
        for x in 0..w {
            luma.push(image.luma(x, y));
        }
    }

    let mut histogram = [0usize; 256];
    for &l in &luma {
        histogram[(l.round() as usize).min(255)] += 1;
    }
    let entropy = shannon(histogram, luma.len());

    let mut edges = 0usize;
    let mut sampled = 0usize;
    for y in 0..h.saturating_sub(1) {
        for x in 0..w.saturating_sub(1) {
            let here = luma[y * w + x];
            let gx = luma[y * w + x + 1] - here;
            let gy = luma[(y + 1) * w + x] - here;
            if gx.abs() + gy.abs() > EDGE_THRESHOLD {
                edges += 1;
            }
            sampled += 1;
        }
    }
    let edge_density = if sampled == 0 { 0.0 } else { edges as f64 / sampled as f64 };
    ImageAnalysis { entropy, edge_density }
}

pub fn analyze_message(message: &str) -> MessageAnalysis {
    let mut counts = std::collections::HashMap::new();
    let mut chars = 0usize;
    for c in message.chars() {
        *counts.entry(c).or_insert(0usize) += 1;
        chars += 1;
    }
    let entropy = shannon(counts.into_values(), chars);
    let raw_bits = message.len() * 8;
    let compressed = compress(message, CompressionAlgorithm::Hybrid, 9).cost_bits();
    let compressibility = if raw_bits == 0 {
        0.0
    } else {
        (1.0 - compressed as f64 / raw_bits as f64).max(0.0)
    };
    MessageAnalysis { chars, entropy, compressibility }
}

/// The preferred plan followed by its fallbacks, most preferred first.
pub fn candidates(analysis: &ImageAnalysis, message_chars: usize) -> Vec<Plan> {
    let mut out = Vec::new();
    let base_cap = if analysis.entropy > HIGH_ENTROPY {
        out.push(Plan::hybrid());
        2
    } else if analysis.entropy < LOW_ENTROPY {
        1
    } else {
        2
    };

    let (mut cap, mut redundancy) = (base_cap, 1usize);
    if out.is_empty() {
        if analysis.edge_density > EDGE_DENSITY {
            cap = (cap + 1).min(MAX_BITS_PER_BYTE);
            redundancy = 3;
        }
        if message_chars > LONG_MESSAGE_CHARS {
            redundancy *= 2;
        }
    }

    for r in [6, 3, 2, 1].into_iter().filter(|&r| r <= redundancy) {
        out.push(Plan::chaotic(cap, r));
    }
    for c in cap + 1..=MAX_BITS_PER_BYTE {
        out.push(Plan::chaotic(c, 1));
    }
    out
}

/// Pick the first plan from [`candidates`] that holds `payload_bits`.
///
/// # Errors
/// [`StegoError::CapacityExceeded`] if no plan fits.
pub fn select(image: &PixelBuffer, payload_bits: usize, message_chars: usize) -> Result<Selection, StegoError> {
    let analysis = analyze_image(image);
    candidates(&analysis, message_chars)
        .into_iter()
        .enumerate()
        .map(|(i, plan)| (i, plan, plan.capacity_bits(image)))
        .find(|&(_, _, cap)| payload_bits <= cap)
        .map(|(i, plan, capacity_bits)| Selection { plan, image: analysis, capacity_bits, fell_back: i > 0 })
        .ok_or(StegoError::CapacityExceeded)
}

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Block transforms for frequency-domain embedding.
//!
//! - [`dct`]: orthonormal 8×8 DCT-II and its inverse.
//! - [`dwt`]: orthonormal Haar wavelet (1-D and single-level 2-D).
//!
//! Both operate on [`Block`]s of 64 `f64` samples in row-major order. The
//! parity quantiser below is what the DCT and DWT strategies use to force a
//! coefficient to carry one bit.

pub mod dct;
pub mod dwt;

pub use dct::{dct2d, idct2d};
pub use dwt::{dwt2d, haar_dwt, haar_idwt, idwt2d, DetailBand, Subbands};

/// Side length of a transform block.
pub const BLOCK: usize = 8;

/// Samples per transform block.
pub const BLOCK_LEN: usize = BLOCK * BLOCK;

/// One 8×8 block of samples or coefficients, row-major.
pub type Block = [f64; BLOCK_LEN];

/// Quantisation index of `coeff` at `step`, rounded to nearest.
fn level(coeff: f64, step: f64) -> i64 {
    (coeff / step).round() as i64
}

/// Replace `coeff` by the nearest multiple of `step` whose index parity is
/// `bit`.
pub fn quantize_parity(coeff: f64, step: f64, bit: u8) -> f64 {
    parity_candidates(coeff, step, bit, 1)[0]
}

/// The `count` nearest parity-correct levels for `coeff`, closest first.
///
/// Used to retry a block when rounding or clamping in the pixel domain
/// pushed the first choice back across a decision boundary.
pub fn parity_candidates(coeff: f64, step: f64, bit: u8, count: usize) -> Vec<f64> {
    debug_assert!(bit <= 1);
    let scaled = coeff / step;
    let mut k = scaled.round() as i64;
    if k.rem_euclid(2) != bit as i64 {
        k = if scaled >= k as f64 { k + 1 } else { k - 1 };
    }
    // Alternate outward from k, starting on the side `scaled` lies on.
    let toward = if scaled >= k as f64 { 2 } else { -2 };
    let mut out = Vec::with_capacity(count);
    let mut i = 0i64;
    while out.len() < count {
        let offset = if i % 2 == 1 { ((i + 1) / 2) * toward } else { -(i / 2) * toward };
        out.push((k + offset) as f64 * step);
        i += 1;
    }
    out
}

/// The bit carried by `coeff` under [`quantize_parity`].
pub fn read_parity(coeff: f64, step: f64) -> u8 {
    level(coeff, step).rem_euclid(2) as u8
}

/// Round and clamp a reconstructed sample to a pixel byte.
pub fn to_pixel(sample: f64) -> u8 {
    sample.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_roundtrip() {
        for &c in &[-40.3, -7.9, 0.0, 3.2, 15.9, 16.1, 99.0] {
            for bit in 0..=1u8 {
                let q = quantize_parity(c, 16.0, bit);
                assert_eq!(read_parity(q, 16.0), bit, "c={c} bit={bit}");
                assert!((q - c).abs() <= 24.0, "moved too far: {c} -> {q}");
            }
        }
    }

    #[test]
    fn parity_tolerates_small_noise() {
        let q = quantize_parity(37.0, 16.0, 1);
        assert_eq!(read_parity(q + 7.5, 16.0), 1);
        assert_eq!(read_parity(q - 7.5, 16.0), 1);
    }

    #[test]
    fn candidates_all_carry_bit() {
        let cands = parity_candidates(5.0, 12.0, 0, 5);
        assert_eq!(cands.len(), 5);
        for c in &cands {
            assert_eq!(read_parity(*c, 12.0), 0);
        }
        let mut uniq: Vec<i64> = cands.iter().map(|c| *c as i64).collect();
        uniq.sort();
        uniq.dedup();
        assert_eq!(uniq.len(), 5);
    }

    #[test]
    fn pixel_clamp() {
        assert_eq!(to_pixel(-3.0), 0);
        assert_eq!(to_pixel(255.6), 255);
        assert_eq!(to_pixel(127.5), 128);
    }
}

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Orthonormal Haar wavelet, 1-D and single-level 2-D over 8×8 blocks.

use std::f64::consts::FRAC_1_SQRT_2;

use super::{Block, BLOCK, BLOCK_LEN};

/// Side of one subband of an 8×8 block.
pub const SUB: usize = BLOCK / 2;

/// The four single-level subbands of an 8×8 block, each 4×4 row-major.
///
/// `lh` is horizontal-detail (top-right quadrant), `hl` vertical-detail
/// (bottom-left), `hh` diagonal-detail (bottom-right).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subbands {
    pub ll: [f64; SUB * SUB],
    pub lh: [f64; SUB * SUB],
    pub hl: [f64; SUB * SUB],
    pub hh: [f64; SUB * SUB],
}

/// Which detail subband a coefficient lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailBand {
    Lh,
    Hl,
    Hh,
}

impl DetailBand {
    /// Rotate through LH, HL, HH by block index.
    pub fn for_block(index: usize) -> Self {
        match index % 3 {
            0 => Self::Lh,
            1 => Self::Hl,
            _ => Self::Hh,
        }
    }
}

impl Subbands {
    pub fn band(&self, band: DetailBand) -> &[f64; SUB * SUB] {
        match band {
            DetailBand::Lh => &self.lh,
            DetailBand::Hl => &self.hl,
            DetailBand::Hh => &self.hh,
        }
    }

    pub fn band_mut(&mut self, band: DetailBand) -> &mut [f64; SUB * SUB] {
        match band {
            DetailBand::Lh => &mut self.lh,
            DetailBand::Hl => &mut self.hl,
            DetailBand::Hh => &mut self.hh,
        }
    }
}

/// One Haar level: `[approximations..., details...]`.
///
/// Odd-length input keeps its last sample as an approximation with no
/// matching detail.
pub fn haar_dwt(signal: &[f64]) -> Vec<f64> {
    let half = signal.len() / 2;
    let mut approx = Vec::with_capacity(half + 1);
    let mut detail = Vec::with_capacity(half);
    for pair in signal.chunks(2) {
        match *pair {
            [a, b] => {
                approx.push((a + b) * FRAC_1_SQRT_2);
                detail.push((a - b) * FRAC_1_SQRT_2);
            }
            [a] => approx.push(a),
            _ => unreachable!(),
        }
    }
    approx.extend(detail);
    approx
}

/// Inverse of [`haar_dwt`].
pub fn haar_idwt(coeffs: &[f64]) -> Vec<f64> {
    let n = coeffs.len();
    let half = n / 2;
    let approx_len = n - half;
    let (approx, detail) = coeffs.split_at(approx_len);
    let mut out = Vec::with_capacity(n);
    for i in 0..half {
        let a = approx[i];
        let d = detail[i];
        out.push((a + d) * FRAC_1_SQRT_2);
        out.push((a - d) * FRAC_1_SQRT_2);
    }
    if approx_len > half {
        out.push(approx[approx_len - 1]);
    }
    out
}

/// Single-level 2-D Haar transform of an 8×8 block.
pub fn dwt2d(pixels: &Block) -> Subbands {
    let mut work = *pixels;

    for row in 0..BLOCK {
        let t = haar_dwt(&work[row * BLOCK..(row + 1) * BLOCK]);
        work[row * BLOCK..(row + 1) * BLOCK].copy_from_slice(&t);
    }
    for col in 0..BLOCK {
        let column: Vec<f64> = (0..BLOCK).map(|r| work[r * BLOCK + col]).collect();
        let t = haar_dwt(&column);
        for (r, v) in t.into_iter().enumerate() {
            work[r * BLOCK + col] = v;
        }
    }

    let mut bands = Subbands {
        ll: [0.0; SUB * SUB],
        lh: [0.0; SUB * SUB],
        hl: [0.0; SUB * SUB],
        hh: [0.0; SUB * SUB],
    };
    for r in 0..SUB {
        for c in 0..SUB {
            bands.ll[r * SUB + c] = work[r * BLOCK + c];
            bands.lh[r * SUB + c] = work[r * BLOCK + c + SUB];
            bands.hl[r * SUB + c] = work[(r + SUB) * BLOCK + c];
            bands.hh[r * SUB + c] = work[(r + SUB) * BLOCK + c + SUB];
        }
    }
    bands
}

/// Inverse of [`dwt2d`].
pub fn idwt2d(bands: &Subbands) -> Block {
    let mut work = [0.0f64; BLOCK_LEN];
    for r in 0..SUB {
        for c in 0..SUB {
            work[r * BLOCK + c] = bands.ll[r * SUB + c];
            work[r * BLOCK + c + SUB] = bands.lh[r * SUB + c];
            work[(r + SUB) * BLOCK + c] = bands.hl[r * SUB + c];
            work[(r + SUB) * BLOCK + c + SUB] = bands.hh[r * SUB + c];
        }
    }

    for col in 0..BLOCK {
        let column: Vec<f64> = (0..BLOCK).map(|r| work[r * BLOCK + col]).collect();
        let t = haar_idwt(&column);
        for (r, v) in t.into_iter().enumerate() {
            work[r * BLOCK + col] = v;
        }
    }
    for row in 0..BLOCK {
        let t = haar_idwt(&work[row * BLOCK..(row + 1) * BLOCK]);
        work[row * BLOCK..(row + 1) * BLOCK].copy_from_slice(&t);
    }
    work
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haar_1d_inverse() {
        let s = [9.0, 7.0, 3.0, 5.0, 6.0, 10.0, 2.0, 6.0];
        let back = haar_idwt(&haar_dwt(&s));
        for (a, b) in s.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn haar_1d_odd_length() {
        let s = [1.0, 2.0, 3.0];
        let t = haar_dwt(&s);
        assert_eq!(t.len(), 3);
        let back = haar_idwt(&t);
        for (a, b) in s.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn dwt2d_inverse() {
        let mut px = [0.0; BLOCK_LEN];
        for (i, v) in px.iter_mut().enumerate() {
            *v = ((i * 53 + 11) % 251) as f64;
        }
        let back = idwt2d(&dwt2d(&px));
        for i in 0..BLOCK_LEN {
            assert!((px[i] - back[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn flat_block_has_no_detail() {
        let bands = dwt2d(&[42.0; BLOCK_LEN]);
        for band in [DetailBand::Lh, DetailBand::Hl, DetailBand::Hh] {
            assert!(bands.band(band).iter().all(|v| v.abs() < 1e-9));
        }
        // LL of a flat block holds 2 * value (orthonormal 2×2 average).
        assert!((bands.ll[0] - 84.0).abs() < 1e-9);
    }

    #[test]
    fn band_rotation() {
        assert_eq!(DetailBand::for_block(0), DetailBand::Lh);
        assert_eq!(DetailBand::for_block(1), DetailBand::Hl);
        assert_eq!(DetailBand::for_block(2), DetailBand::Hh);
        assert_eq!(DetailBand::for_block(3), DetailBand::Lh);
    }
}

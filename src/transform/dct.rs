// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Orthonormal 8×8 DCT-II / DCT-III.
//!
//! Separable row/column sums against a cached cosine table, with scaling
//! `1/√N` for the DC term and `√(2/N)` otherwise. The pair is exactly
//! inverse up to floating-point rounding.

use std::sync::OnceLock;

use super::{Block, BLOCK, BLOCK_LEN};

/// `COSINE[u][x] = cos((2x + 1) uπ / 2N)`
static COSINE: OnceLock<[[f64; BLOCK]; BLOCK]> = OnceLock::new();

/// Normalisation: `C(0) = 1/√N`, `C(u>0) = √(2/N)`.
static NORM: OnceLock<[f64; BLOCK]> = OnceLock::new();

fn cosine_table() -> &'static [[f64; BLOCK]; BLOCK] {
    COSINE.get_or_init(|| {
        let mut table = [[0.0f64; BLOCK]; BLOCK];
        for (u, row) in table.iter_mut().enumerate() {
            for (x, v) in row.iter_mut().enumerate() {
                *v = ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI
                    / (2 * BLOCK) as f64)
                    .cos();
            }
        }
        table
    })
}

fn norm_table() -> &'static [f64; BLOCK] {
    NORM.get_or_init(|| {
        let mut n = [(2.0 / BLOCK as f64).sqrt(); BLOCK];
        n[0] = 1.0 / (BLOCK as f64).sqrt();
        n
    })
}

/// Forward 2-D DCT of an 8×8 block in row-major order.
pub fn dct2d(pixels: &Block) -> Block {
    let cos = cosine_table();
    let c = norm_table();

    // Rows.
    let mut temp = [0.0f64; BLOCK_LEN];
    for row in 0..BLOCK {
        for u in 0..BLOCK {
            let mut sum = 0.0;
            for x in 0..BLOCK {
                sum += pixels[row * BLOCK + x] * cos[u][x];
            }
            temp[row * BLOCK + u] = c[u] * sum;
        }
    }

    // Columns.
    let mut coeffs = [0.0f64; BLOCK_LEN];
    for col in 0..BLOCK {
        for v in 0..BLOCK {
            let mut sum = 0.0;
            for y in 0..BLOCK {
                sum += temp[y * BLOCK + col] * cos[v][y];
            }
            coeffs[v * BLOCK + col] = c[v] * sum;
        }
    }
    coeffs
}

/// Inverse 2-D DCT of an 8×8 coefficient block in row-major order.
pub fn idct2d(coeffs: &Block) -> Block {
    let cos = cosine_table();
    let c = norm_table();

    // Columns.
    let mut temp = [0.0f64; BLOCK_LEN];
    for col in 0..BLOCK {
        for y in 0..BLOCK {
            let mut sum = 0.0;
            for v in 0..BLOCK {
                sum += c[v] * coeffs[v * BLOCK + col] * cos[v][y];
            }
            temp[y * BLOCK + col] = sum;
        }
    }

    // Rows.
    let mut pixels = [0.0f64; BLOCK_LEN];
    for row in 0..BLOCK {
        for x in 0..BLOCK {
            let mut sum = 0.0;
            for u in 0..BLOCK {
                sum += c[u] * temp[row * BLOCK + u] * cos[u][x];
            }
            pixels[row * BLOCK + x] = sum;
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Block {
        let mut b = [0.0; BLOCK_LEN];
        for (i, v) in b.iter_mut().enumerate() {
            *v = ((i * 37) % 256) as f64;
        }
        b
    }

    #[test]
    fn dct_idct_inverse() {
        let px = ramp();
        let back = idct2d(&dct2d(&px));
        for i in 0..BLOCK_LEN {
            assert!((px[i] - back[i]).abs() < 1e-9, "i={i}: {} vs {}", px[i], back[i]);
        }
    }

    #[test]
    fn flat_block_has_only_dc() {
        let px = [100.0; BLOCK_LEN];
        let c = dct2d(&px);
        // Orthonormal DC = N * mean = 8 * 100.
        assert!((c[0] - 800.0).abs() < 1e-9);
        for &v in &c[1..] {
            assert!(v.abs() < 1e-9);
        }
    }

    #[test]
    fn energy_preserved() {
        let px = ramp();
        let c = dct2d(&px);
        let e_px: f64 = px.iter().map(|v| v * v).sum();
        let e_c: f64 = c.iter().map(|v| v * v).sum();
        assert!((e_px - e_c).abs() / e_px < 1e-12);
    }
}

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! RGBA pixel buffer container.
//!
//! The core never decodes image files: collaborators hand over raw RGBA
//! pixels (as a browser canvas or the `image` crate produces them) and get
//! raw RGBA pixels back.

use crate::stego::error::StegoError;

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// Index of the alpha channel within a pixel.
pub const ALPHA: usize = 3;

/// An owned RGBA8 pixel buffer in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes.
    ///
    /// # Errors
    /// [`StegoError::CorruptedImage`] if `data.len() != width * height * 4`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, StegoError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|p| p.checked_mul(CHANNELS))
            .ok_or(StegoError::CorruptedImage)?;
        if data.len() != expected {
            return Err(StegoError::CorruptedImage);
        }
        Ok(Self { width, height, data })
    }

    /// A buffer filled by `f(x, y) -> [r, g, b, a]`.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Read one channel of the pixel at (x, y).
    pub fn channel(&self, x: usize, y: usize, ch: usize) -> u8 {
        self.data[(y * self.width as usize + x) * CHANNELS + ch]
    }

    /// Write one channel of the pixel at (x, y).
    pub fn set_channel(&mut self, x: usize, y: usize, ch: usize, value: u8) {
        let idx = (y * self.width as usize + x) * CHANNELS + ch;
        self.data[idx] = value;
    }

    /// Raw byte indices of colour (non-alpha) bytes at or after `start`.
    ///
    /// These are the carrier bytes for the byte-oriented strategies.
    pub fn carrier_indices(&self, start: usize) -> Vec<usize> {
        (start..self.data.len()).filter(|i| i % CHANNELS != ALPHA).collect()
    }

    /// Number of colour bytes at or after `start`, without allocating.
    pub fn carrier_count(&self, start: usize) -> usize {
        if start >= self.data.len() {
            return 0;
        }
        let total = self.data.len() - start;
        let alphas_before = |n: usize| (n + CHANNELS - 1 - ALPHA) / CHANNELS;
        total - (alphas_before(self.data.len()) - alphas_before(start))
    }

    /// BT.601 luma of the pixel at (x, y), in 0.0..=255.0.
    pub fn luma(&self, x: usize, y: usize) -> f64 {
        let r = self.channel(x, y, 0) as f64;
        let g = self.channel(x, y, 1) as f64;
        let b = self.channel(x, y, 2) as f64;
        0.299 * r + 0.587 * g + 0.114 * b
    }

    /// Peak signal-to-noise ratio against `other` over colour channels.
    ///
    /// Returns `f64::INFINITY` for identical buffers and `None` when the
    /// dimensions differ.
    pub fn psnr(&self, other: &PixelBuffer) -> Option<f64> {
        if self.width != other.width || self.height != other.height {
            return None;
        }
        let mut sse = 0.0f64;
        let mut n = 0usize;
        for (i, (&a, &b)) in self.data.iter().zip(other.data.iter()).enumerate() {
            if i % CHANNELS == ALPHA {
                continue;
            }
            let d = a as f64 - b as f64;
            sse += d * d;
            n += 1;
        }
        if sse == 0.0 || n == 0 {
            return Some(f64::INFINITY);
        }
        let mse = sse / n as f64;
        Some(10.0 * (255.0 * 255.0 / mse).log10())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(PixelBuffer::new(2, 2, vec![0; 15]), Err(StegoError::CorruptedImage));
        assert!(PixelBuffer::new(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn carrier_count_matches_indices() {
        let img = PixelBuffer::from_fn(7, 5, |x, y| [x as u8, y as u8, 0, 255]);
        for start in [0, 1, 3, 4, 40, 41, 43, 139, 140, 200] {
            assert_eq!(
                img.carrier_count(start),
                img.carrier_indices(start).len(),
                "start={start}"
            );
        }
    }

    #[test]
    fn carrier_indices_skip_alpha() {
        let img = PixelBuffer::from_fn(4, 4, |_, _| [1, 2, 3, 4]);
        assert!(img.carrier_indices(40).iter().all(|i| i % 4 != 3));
        assert_eq!(img.carrier_indices(40)[0], 40);
    }

    #[test]
    fn psnr_identical_is_infinite() {
        let img = PixelBuffer::from_fn(8, 8, |x, _| [x as u8 * 10, 0, 0, 255]);
        assert_eq!(img.psnr(&img), Some(f64::INFINITY));
        let mut other = img.clone();
        other.set_channel(0, 0, 0, 1);
        let p = img.psnr(&other).unwrap();
        assert!(p > 40.0 && p.is_finite());
    }
}

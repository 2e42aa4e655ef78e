// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Chaotic position and keystream generation.
//!
//! The encoder and the decoder each regenerate the same sequence of embedding
//! positions from the password (or a numeric seed), so nothing about the
//! positions is ever stored in the image.
//!
//! # Determinism
//!
//! Every map runs on plain `f64` arithmetic (add, multiply, compare) with no
//! transcendental functions, so orbits are bit-identical on every IEEE-754
//! platform. The seed is taken from SHA-256, which is platform-independent
//! by construction.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::stego::error::StegoError;

/// Fixed salt mixed into the password before hashing it into a seed.
const SEED_SALT: &[u8; 16] = b"chroma-chaos-v1\0";

/// Seed used when no password is available and none is configured.
pub const DEFAULT_SEED: f64 = 0.618_033_988_749_895;

/// Largest keystream [`generate_key_stream`] will produce.
pub const MAX_KEY_STREAM_LEN: usize = 1_048_576;

const LOGISTIC_R: f64 = 3.99;
const TENT_MU: f64 = 1.9999;
const HENON_A: f64 = 1.4;
const HENON_B: f64 = 0.3;
/// The Hénon attractor's x range lies inside [-1.5, 1.5].
const HENON_SPAN: f64 = 1.5;

/// Step between successive deterministic re-seeds of a collapsed orbit.
const RESEED_GAP: f64 = 0.381_966_011_250_105;

/// Which recurrence drives position selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MapType {
    /// `x ← r·x·(1−x)` with `r = 3.99`.
    #[default]
    Logistic,
    /// `x ← μ·min(x, 1−x)` with `μ = 1.9999`.
    Tent,
    /// Two-dimensional Hénon map, `a = 1.4`, `b = 0.3`.
    Henon,
    /// Arnold cat map scrambling of a square index grid.
    ArnoldCat,
}

/// Chaotic generator settings. Encoder and decoder must agree on all fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChaoticConfig {
    pub map_type: MapType,
    /// Numeric seed in (0, 1), used when no password seeds the map.
    pub seed: Option<f64>,
    /// Warm-up steps discarded before the first draw.
    pub iterations: u32,
    /// Derive the seed from the password when one is given.
    pub use_password: bool,
}

impl Default for ChaoticConfig {
    fn default() -> Self {
        Self { map_type: MapType::Logistic, seed: None, iterations: 100, use_password: true }
    }
}

impl ChaoticConfig {
    /// The same settings, but never seeded from a password.
    pub fn numeric(&self) -> Self {
        Self { use_password: false, ..*self }
    }
}

/// Map `n` into the open interval (0, 1).
fn to_unit(n: u32) -> f64 {
    (n as f64 + 1.0) / (u32::MAX as f64 + 3.0)
}

/// Derive the chaotic seed for `password` under `config`.
pub fn derive_seed(password: Option<&str>, config: &ChaoticConfig) -> f64 {
    match password {
        Some(pw) if config.use_password && !pw.is_empty() => {
            let mut hasher = Sha256::new();
            hasher.update(pw.as_bytes());
            hasher.update(SEED_SALT);
            let digest = hasher.finalize();
            to_unit(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
        }
        _ => sanitize_seed(config.seed.unwrap_or(DEFAULT_SEED)),
    }
}

fn sanitize_seed(seed: f64) -> f64 {
    if seed.is_finite() && seed > 0.0 && seed < 1.0 {
        seed
    } else {
        DEFAULT_SEED
    }
}

fn reseed(seed: f64, count: u32) -> f64 {
    let v = (seed + count as f64 * RESEED_GAP).fract();
    if v > 0.0 && v < 1.0 { v } else { 0.5 }
}

/// A one-dimensional view of a chaotic orbit yielding values in (0, 1).
struct Orbit {
    map: MapType,
    seed: f64,
    x: f64,
    y: f64,
    reseeds: u32,
}

impl Orbit {
    fn new(map: MapType, seed: f64) -> Self {
        let mut orbit = Self { map, seed, x: 0.0, y: 0.0, reseeds: 0 };
        orbit.restart(seed);
        orbit
    }

    fn restart(&mut self, start: f64) {
        match self.map {
            MapType::Henon => {
                self.x = start - 0.5;
                self.y = 0.0;
            }
            _ => self.x = start,
        }
    }

    fn collapse(&mut self) {
        self.reseeds += 1;
        let start = reseed(self.seed, self.reseeds);
        self.restart(start);
    }

    fn step(&mut self) -> f64 {
        loop {
            let prev = self.x;
            let value = match self.map {
                MapType::Logistic | MapType::ArnoldCat => {
                    self.x = LOGISTIC_R * self.x * (1.0 - self.x);
                    self.x
                }
                MapType::Tent => {
                    self.x = TENT_MU * self.x.min(1.0 - self.x);
                    self.x
                }
                MapType::Henon => {
                    let x = 1.0 - HENON_A * self.x * self.x + self.y;
                    self.y = HENON_B * self.x;
                    self.x = x;
                    (x + HENON_SPAN) / (2.0 * HENON_SPAN)
                }
            };
            let stuck = (self.x - prev).abs() < 1e-12;
            if value.is_finite() && value > 0.0 && value < 1.0 && !stuck {
                return value;
            }
            self.collapse();
        }
    }
}

/// Candidate positions from continuous maps: `floor(v × total)`.
fn draw_continuous(map: MapType, seed: f64, warmup: u32, count: usize, total: usize) -> Vec<usize> {
    let mut orbit = Orbit::new(map, seed);
    for _ in 0..warmup {
        orbit.step();
    }
    (0..count)
        .map(|_| ((orbit.step() * total as f64) as usize).min(total - 1))
        .collect()
}

/// Candidate positions from the Arnold cat map.
///
/// The index grid is `N×N` with `N = ceil(sqrt(total))`. Walking the grid
/// from a seed-dependent offset and sending each cell through
/// `1 + warmup % 16` rounds of `(x, y) ← (x + y, x + 2y) mod N` gives a
/// permutation; cells that land outside `0..total` are skipped.
fn draw_cat(seed: f64, warmup: u32, count: usize, total: usize) -> Vec<usize> {
    let mut n = 1usize;
    while n * n < total {
        n += 1;
    }
    let cells = n * n;
    let offset = ((seed * cells as f64) as usize).min(cells - 1);
    let rounds = 1 + warmup % 16;

    let mut out = Vec::with_capacity(count);
    for i in 0..cells {
        if out.len() == count {
            break;
        }
        let cell = (i + offset) % cells;
        let (mut x, mut y) = (cell % n, cell / n);
        for _ in 0..rounds {
            let nx = (x + y) % n;
            let ny = (x + 2 * y) % n;
            x = nx;
            y = ny;
        }
        let idx = y * n + x;
        if idx < total {
            out.push(idx);
        }
    }
    out
}

/// Keep the first occurrence of each index, truncate to `required`, then
/// fill any shortfall with the lowest indices not yet used.
fn dedupe_and_fill(candidates: &[usize], total: usize, required: usize) -> Vec<usize> {
    let mut used = vec![false; total];
    let mut out = Vec::with_capacity(required);
    for &idx in candidates {
        if out.len() == required {
            break;
        }
        if !used[idx] {
            used[idx] = true;
            out.push(idx);
        }
    }
    let mut next = 0usize;
    while out.len() < required {
        if !used[next] {
            used[next] = true;
            out.push(next);
        }
        next += 1;
    }
    out
}

/// Generate `required` unique positions in `0..total`.
///
/// # Errors
/// [`StegoError::CapacityExceeded`] if `required` exceeds a quarter of
/// `total`. The check runs before any other work.
pub fn generate_embedding_positions(
    total: usize,
    required: usize,
    password: Option<&str>,
    config: &ChaoticConfig,
) -> Result<Vec<usize>, StegoError> {
    if required.checked_mul(4).map_or(true, |r| r > total) {
        return Err(StegoError::CapacityExceeded);
    }
    if required == 0 {
        return Ok(Vec::new());
    }
    let seed = derive_seed(password, config);
    let draws = 2 * required;
    let candidates = match config.map_type {
        MapType::ArnoldCat => draw_cat(seed, config.iterations, draws, total),
        map => draw_continuous(map, seed, config.iterations, draws, total),
    };
    Ok(dedupe_and_fill(&candidates, total, required))
}

/// Logistic-map keystream of `length` bytes.
///
/// # Errors
/// [`StegoError::InvalidInput`] unless `0 < length <= MAX_KEY_STREAM_LEN`.
pub fn generate_key_stream(
    length: usize,
    password: Option<&str>,
    config: &ChaoticConfig,
) -> Result<Vec<u8>, StegoError> {
    if length == 0 || length > MAX_KEY_STREAM_LEN {
        return Err(StegoError::InvalidInput("key stream length out of range"));
    }
    let mut orbit = Orbit::new(MapType::Logistic, derive_seed(password, config));
    for _ in 0..config.iterations {
        orbit.step();
    }
    Ok((0..length).map(|_| ((orbit.step() * 256.0) as u32).min(255) as u8).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(map_type: MapType) -> ChaoticConfig {
        ChaoticConfig { map_type, ..ChaoticConfig::default() }
    }

    const MAPS: [MapType; 4] = [MapType::Logistic, MapType::Tent, MapType::Henon, MapType::ArnoldCat];

    #[test]
    fn positions_are_deterministic() {
        for map in MAPS {
            let a = generate_embedding_positions(10_000, 500, Some("pw"), &config(map)).unwrap();
            let b = generate_embedding_positions(10_000, 500, Some("pw"), &config(map)).unwrap();
            assert_eq!(a, b, "{map:?}");
        }
    }

    #[test]
    fn positions_unique_and_in_range() {
        for map in MAPS {
            let pos = generate_embedding_positions(4_000, 1_000, Some("x"), &config(map)).unwrap();
            assert_eq!(pos.len(), 1_000);
            let mut sorted = pos.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), 1_000, "{map:?}");
            assert!(pos.iter().all(|&p| p < 4_000));
        }
    }

    #[test]
    fn password_changes_positions() {
        let cfg = ChaoticConfig::default();
        let a = generate_embedding_positions(10_000, 100, Some("alpha"), &cfg).unwrap();
        let b = generate_embedding_positions(10_000, 100, Some("bravo"), &cfg).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn numeric_seed_used_without_password() {
        let cfg = ChaoticConfig { seed: Some(0.25), ..ChaoticConfig::default() };
        let a = generate_embedding_positions(1_000, 50, None, &cfg).unwrap();
        let b = generate_embedding_positions(1_000, 50, Some("ignored"), &cfg.numeric()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn quarter_ceiling_enforced() {
        let cfg = ChaoticConfig::default();
        assert!(generate_embedding_positions(100, 25, None, &cfg).is_ok());
        assert_eq!(
            generate_embedding_positions(100, 26, None, &cfg),
            Err(StegoError::CapacityExceeded)
        );
        assert_eq!(generate_embedding_positions(0, 1, None, &cfg), Err(StegoError::CapacityExceeded));
        assert_eq!(generate_embedding_positions(0, 0, None, &cfg).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn backfill_uses_lowest_unused() {
        let out = dedupe_and_fill(&[5, 5, 2, 5], 10, 5);
        assert_eq!(out, vec![5, 2, 0, 1, 3]);
    }

    #[test]
    fn seed_in_open_unit_interval() {
        assert!(to_unit(0) > 0.0);
        assert!(to_unit(u32::MAX) < 1.0);
        let s = derive_seed(Some("Str0ng!Pass"), &ChaoticConfig::default());
        assert!(s > 0.0 && s < 1.0);
        assert_eq!(derive_seed(None, &ChaoticConfig { seed: Some(7.0), ..ChaoticConfig::default() }), DEFAULT_SEED);
    }

    #[test]
    fn cat_map_is_a_permutation() {
        let all = draw_cat(0.3, 5, 50, 50);
        let mut sorted = all.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn tent_orbit_never_collapses() {
        let mut orbit = Orbit::new(MapType::Tent, 0.5);
        for _ in 0..10_000 {
            let v = orbit.step();
            assert!(v > 0.0 && v < 1.0);
        }
    }

    #[test]
    fn key_stream_bounds() {
        let cfg = ChaoticConfig::default();
        assert!(generate_key_stream(0, None, &cfg).is_err());
        assert!(generate_key_stream(MAX_KEY_STREAM_LEN + 1, None, &cfg).is_err());
        let ks = generate_key_stream(64, Some("pw"), &cfg).unwrap();
        assert_eq!(ks.len(), 64);
        assert_eq!(ks, generate_key_stream(64, Some("pw"), &cfg).unwrap());
        assert!(ks.iter().any(|&b| b != ks[0]));
    }
}

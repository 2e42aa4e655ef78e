// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Capacity of every algorithm on a synthetic cover.
//!
//! Usage: `cargo run --example capacity_demo -- [width] [height]`

use chroma_core::stego::strategy::{analyze_image, candidates};
use chroma_core::{capacity, Algorithm, PixelBuffer, SteganographyOptions};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let width = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(512u32);
    let height = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(512u32);

    let cover = PixelBuffer::from_fn(width, height, |x, y| {
        let v = ((x * 31) ^ (y * 17)) as u8;
        [v, v.wrapping_add(40), 255 - v, 255]
    });
    let analysis = analyze_image(&cover);
    println!(
        "{width}x{height}: entropy {:.2} bits, edge density {:.3}",
        analysis.entropy, analysis.edge_density
    );
    if let Some(plan) = candidates(&analysis, 0).first() {
        println!("Selector prefers {} ({plan:?})", plan.algorithm.name());
    }

    for algorithm in Algorithm::ALL {
        let options = SteganographyOptions { algorithm, capacity: 3, ..Default::default() };
        match capacity(&cover, &options) {
            Ok(bytes) => println!("{:>16}: {bytes:>8} bytes", algorithm.name()),
            Err(e) => println!("{:>16}: {e}", algorithm.name()),
        }
    }
}

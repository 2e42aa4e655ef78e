// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Example: hide a message in a raw RGBA dump and read it back.
//!
//! Usage: `cargo run --example encode_demo -- <in.rgba> <width> <height> <message> [password]`
//!        `cargo run --example encode_demo -- --decode <stego.rgba> <width> <height> [password]`
//!
//! Produce the input with e.g. `convert photo.png -depth 8 rgba:photo.rgba`.
use std::fs;
use std::time::Instant;

use chroma_core::{decode, encode, DecodeOptions, DecodeOutcome, PixelBuffer, SteganographyOptions};

fn load(path: &str, width: &str, height: &str) -> PixelBuffer {
    let dims = (width.parse::<u32>(), height.parse::<u32>());
    let (Ok(w), Ok(h)) = dims else {
        eprintln!("Width and height must be integers");
        std::process::exit(1);
    };
    let data = fs::read(path).unwrap_or_else(|e| {
        eprintln!("Error reading {path}: {e}");
        std::process::exit(1);
    });
    PixelBuffer::new(w, h, data).unwrap_or_else(|e| {
        eprintln!("{path}: {e}");
        std::process::exit(1);
    })
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 {
        eprintln!("Usage: encode_demo <in.rgba> <width> <height> <message> [password]");
        eprintln!("       encode_demo --decode <stego.rgba> <width> <height> [password]");
        std::process::exit(1);
    }

    if args[1] == "--decode" {
        let stego = load(&args[2], &args[3], &args[4]);
        let password = args.get(5).map(String::as_str);
        let start = Instant::now();
        match decode(&stego, password, &DecodeOptions::default()) {
            Ok(DecodeOutcome::Plaintext(text)) => println!("Decoded message: {text}"),
            Ok(DecodeOutcome::EncryptedPending) => println!("Message is encrypted; pass the password"),
            Err(e) => eprintln!("Decode failed: {e} ({})", e.code()),
        }
        eprintln!("[{:.2}s]", start.elapsed().as_secs_f64());
    } else {
        let cover = load(&args[1], &args[2], &args[3]);
        let message = &args[4];
        let password = args.get(5).map(String::as_str);

        let start = Instant::now();
        let stego = encode(&cover, message, password, &SteganographyOptions::default()).unwrap_or_else(|e| {
            eprintln!("Encode failed: {e}");
            std::process::exit(1);
        });
        let psnr = cover.psnr(&stego).unwrap_or(f64::INFINITY);

        let out_path = format!("{}.stego.rgba", args[1].trim_end_matches(".rgba"));
        fs::write(&out_path, stego.data()).unwrap_or_else(|e| {
            eprintln!("Could not write {out_path}: {e}");
            std::process::exit(1);
        });
        println!("Stego pixels written to: {out_path}");
        println!("PSNR {psnr:.1} dB [{:.2}s]", start.elapsed().as_secs_f64());
    }
}

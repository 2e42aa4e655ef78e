// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Round-trip integration tests for every embedding algorithm.

use chroma_core::{
    decode, encode, Algorithm, ChaoticConfig, DecodeOptions, DecodeOutcome, MapType, PixelBuffer,
    SteganographyOptions, StegoError,
};

/// Mid-range RGBA cover with some texture, opaque.
fn textured(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, |x, y| {
        let r = 64 + ((x * 7 + y * 3) % 128) as u8;
        let g = 64 + ((x * 5 + y * 11) % 128) as u8;
        let b = 64 + ((x ^ y) % 128) as u8;
        [r, g, b, 255]
    })
}

fn options(algorithm: Algorithm) -> SteganographyOptions {
    SteganographyOptions { algorithm, ..Default::default() }
}

fn decoded(img: &PixelBuffer, password: Option<&str>, opts: &DecodeOptions) -> String {
    match decode(img, password, opts).unwrap() {
        DecodeOutcome::Plaintext(text) => text,
        DecodeOutcome::EncryptedPending => panic!("message still encrypted"),
    }
}

#[test]
fn scenario_lsb_hello() {
    let cover = textured(100, 100);
    assert_eq!(cover.data().len(), 40_000);
    let stego = encode(&cover, "HELLO", None, &options(Algorithm::Lsb)).unwrap();
    assert_eq!(decoded(&stego, None, &DecodeOptions::default()), "HELLO");
}

#[test]
fn scenario_multibit_with_password() {
    let cover = textured(100, 100);
    let opts = SteganographyOptions { capacity: 3, ..options(Algorithm::MultibitLsb) };
    let stego = encode(&cover, "HELLO", Some("Str0ng!Pass"), &opts).unwrap();
    assert_eq!(decoded(&stego, Some("Str0ng!Pass"), &DecodeOptions::default()), "HELLO");
    assert_eq!(
        decode(&stego, Some("wrong"), &DecodeOptions::default()),
        Err(StegoError::IncorrectPassword)
    );
}

#[test]
fn every_multibit_capacity() {
    let cover = textured(64, 64);
    for capacity in 1..=8u8 {
        let opts = SteganographyOptions { capacity, ..options(Algorithm::MultibitLsb) };
        let message = format!("capacity {capacity} payload");
        let stego = encode(&cover, &message, None, &opts).unwrap();
        assert_eq!(decoded(&stego, None, &DecodeOptions::default()), message, "capacity {capacity}");
    }
}

#[test]
fn byte_strategies_roundtrip() {
    let cover = textured(96, 96);
    for algorithm in [Algorithm::Lsb, Algorithm::MultibitLsb, Algorithm::MobileOptimized, Algorithm::ChaoticLsb] {
        for password in [None, Some("pw-1")] {
            let stego = encode(&cover, "byte strategies", password, &options(algorithm)).unwrap();
            assert_eq!(
                decoded(&stego, password, &DecodeOptions::default()),
                "byte strategies",
                "{algorithm:?} {password:?}"
            );
        }
    }
}

#[test]
fn chaotic_maps_and_bits_per_byte() {
    let cover = textured(96, 96);
    for map_type in [MapType::Logistic, MapType::Tent, MapType::Henon, MapType::ArnoldCat] {
        let chaotic = ChaoticConfig { map_type, seed: Some(0.42), ..ChaoticConfig::default() };
        for capacity in 1..=3u8 {
            let opts = SteganographyOptions { capacity, chaotic, ..options(Algorithm::ChaoticLsb) };
            let stego = encode(&cover, "chaos", Some("key"), &opts).unwrap();
            let dec = DecodeOptions { chaotic, ..Default::default() };
            assert_eq!(decoded(&stego, Some("key"), &dec), "chaos", "{map_type:?} cap {capacity}");
        }
    }
}

#[test]
fn chaotic_needs_matching_config() {
    let cover = textured(96, 96);
    let chaotic = ChaoticConfig { map_type: MapType::Tent, ..ChaoticConfig::default() };
    let opts = SteganographyOptions { chaotic, ..options(Algorithm::ChaoticLsb) };
    let stego = encode(&cover, "config bound", None, &opts).unwrap();
    let mismatched = DecodeOptions::default();
    assert!(decode(&stego, None, &mismatched).is_err());
    let matching = DecodeOptions { chaotic, ..Default::default() };
    assert_eq!(decoded(&stego, None, &matching), "config bound");
}

#[test]
fn dct_and_dwt_roundtrip() {
    let cover = textured(256, 256);
    for algorithm in [Algorithm::Dct, Algorithm::Dwt] {
        let stego = encode(&cover, "HELLO", None, &options(algorithm)).unwrap();
        assert_eq!(decoded(&stego, None, &DecodeOptions::default()), "HELLO", "{algorithm:?}");
        let psnr = cover.psnr(&stego).unwrap();
        assert!(psnr > 30.0, "{algorithm:?} psnr {psnr}");
    }
}

#[test]
fn hybrid_roundtrip_with_password() {
    let cover = textured(768, 768);
    let stego = encode(&cover, "HELLO", Some("hybrid"), &options(Algorithm::HybridDctDwt)).unwrap();
    assert_eq!(decoded(&stego, Some("hybrid"), &DecodeOptions::default()), "HELLO");
}

#[test]
fn adaptive_selection_roundtrip() {
    for (w, h) in [(64, 64), (200, 150)] {
        let cover = textured(w, h);
        let stego = encode(&cover, "let the selector choose", None, &SteganographyOptions::default()).unwrap();
        assert_eq!(decoded(&stego, None, &DecodeOptions::default()), "let the selector choose");
    }
}

#[test]
fn adaptive_long_message_uses_repetition() {
    let cover = PixelBuffer::from_fn(200, 200, |x, y| {
        let v = 100 + ((x / 16 + y / 16) % 2) as u8 * 20;
        [v, v, v, 255]
    });
    let message: String = (0..1200).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    let stego = encode(&cover, &message, None, &SteganographyOptions::default()).unwrap();
    // Low entropy, long message: chaotic LSB with doubled redundancy.
    let header = chroma_core::stego::header::BinaryHeader::read(stego.data()).unwrap();
    assert_eq!(header.algorithm_id, Algorithm::AdaptiveHybrid.id());
    assert_eq!(decoded(&stego, None, &DecodeOptions::default()), message);
}

#[test]
fn alpha_and_input_untouched() {
    let cover = PixelBuffer::from_fn(64, 64, |x, y| [100, 120, 140, (x * 4 + y) as u8]);
    let before = cover.clone();
    let stego = encode(&cover, "alpha stays", None, &options(Algorithm::MultibitLsb)).unwrap();
    assert_eq!(cover, before);
    for i in (40 + 3..stego.data().len()).step_by(4) {
        assert_eq!(stego.data()[i], cover.data()[i]);
    }
}

#[test]
fn unicode_message() {
    let cover = textured(128, 128);
    let message = "Grüße aus 東京 🌸";
    let stego = encode(&cover, message, Some("ü-pass"), &options(Algorithm::Lsb)).unwrap();
    assert_eq!(decoded(&stego, Some("ü-pass"), &DecodeOptions::default()), message);
}

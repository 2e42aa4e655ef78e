// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Per-call configuration for encode and decode.
//!
//! Options deserialise from the camelCase JSON that web collaborators send,
//! with every field optional. [`SteganographyOptions::validate`] is run by
//! every public entry point before any work starts.

use serde::{Deserialize, Serialize};

use crate::chaos::ChaoticConfig;
use crate::compress::CompressionAlgorithm;
use crate::crypto::{EncryptionAlgorithm, Strength};
use crate::stego::embed::Algorithm;
use crate::stego::error::StegoError;

/// Highest decoy slot.
pub const MAX_DECOY_INDEX: u8 = 3;

/// Upper bound on chaotic warm-up iterations.
pub const MAX_CHAOTIC_ITERATIONS: u32 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncryptionOptions {
    pub algorithm: EncryptionAlgorithm,
    pub strength: Strength,
    /// Wrap the cipher with the KEM and signature scheme.
    pub quantum_resistant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressionOptions {
    pub algorithm: CompressionAlgorithm,
    /// 1–9; higher levels try more codecs.
    pub level: u8,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self { algorithm: CompressionAlgorithm::Hybrid, level: 6 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryKind {
    /// `value` is a lifetime in seconds from encode time.
    Time,
    /// `value` is the number of permitted views.
    Views,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expiry {
    #[serde(rename = "type")]
    pub kind: ExpiryKind,
    pub value: u64,
}

/// Options for one encode call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SteganographyOptions {
    /// [`Algorithm::AdaptiveHybrid`] hands the choice to the strategy
    /// selector.
    pub algorithm: Algorithm,
    pub encryption: EncryptionOptions,
    pub compression: CompressionOptions,
    pub chaotic: ChaoticConfig,
    /// 1–100. Sets the PSNR below which a warning is audited.
    pub quality: u8,
    /// Bits per byte for the multi-bit and chaotic strategies, 1–8.
    pub capacity: u8,
    pub expiry: Option<Expiry>,
    /// Mark this message as decoy number `decoy_index`.
    pub is_decoy: bool,
    pub decoy_index: Option<u8>,
    /// Audit per-stage detail.
    pub debug: bool,
}

impl Default for SteganographyOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            encryption: EncryptionOptions::default(),
            compression: CompressionOptions::default(),
            chaotic: ChaoticConfig::default(),
            quality: 90,
            capacity: 1,
            expiry: None,
            is_decoy: false,
            decoy_index: None,
            debug: false,
        }
    }
}

pub(crate) fn validate_chaotic(chaotic: &ChaoticConfig) -> Result<(), StegoError> {
    if let Some(seed) = chaotic.seed {
        if !(seed > 0.0 && seed < 1.0) {
            return Err(StegoError::InvalidInput("chaotic seed must lie in (0, 1)"));
        }
    }
    if chaotic.iterations > MAX_CHAOTIC_ITERATIONS {
        return Err(StegoError::InvalidInput("too many chaotic iterations"));
    }
    Ok(())
}

pub(crate) fn validate_decoy_index(index: u8) -> Result<(), StegoError> {
    if (1..=MAX_DECOY_INDEX).contains(&index) {
        Ok(())
    } else {
        Err(StegoError::InvalidInput("decoy index must be 1-3"))
    }
}

impl SteganographyOptions {
    /// Parse collaborator JSON and validate it.
    ///
    /// # Errors
    /// [`StegoError::InvalidInput`] on malformed JSON or out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, StegoError> {
        let options: Self =
            serde_json::from_str(json).map_err(|_| StegoError::InvalidInput("malformed options JSON"))?;
        options.validate()?;
        Ok(options)
    }

    /// Check every range constraint.
    pub fn validate(&self) -> Result<(), StegoError> {
        if !(1..=8).contains(&self.capacity) {
            return Err(StegoError::InvalidInput("capacity must be 1-8"));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(StegoError::InvalidInput("quality must be 1-100"));
        }
        if !(1..=9).contains(&self.compression.level) {
            return Err(StegoError::InvalidInput("compression level must be 1-9"));
        }
        validate_chaotic(&self.chaotic)?;
        match (self.is_decoy, self.decoy_index) {
            (true, None) => return Err(StegoError::InvalidInput("decoy message needs a decoy index")),
            (_, Some(i)) => validate_decoy_index(i)?,
            (false, None) => {}
        }
        if self.expiry.is_some_and(|e| e.value == 0) {
            return Err(StegoError::InvalidInput("expiry value must be positive"));
        }
        Ok(())
    }

    /// PSNR in dB the encoder aims to stay above.
    pub fn target_psnr(&self) -> f64 {
        30.0 + self.quality as f64 / 5.0
    }

    /// Index written into the message metadata.
    pub(crate) fn frame_index(&self) -> Option<u8> {
        if self.is_decoy {
            self.decoy_index
        } else {
            None
        }
    }
}

/// Options for one decode call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecodeOptions {
    /// Must match the encoder's chaotic configuration.
    pub chaotic: ChaoticConfig,
    /// Only accept the message with this decoy index.
    pub decoy_index: Option<u8>,
    /// Unix seconds used for expiry checks; the system clock if `None`.
    pub now: Option<u64>,
    /// Views of this message the caller has already recorded.
    pub views: u32,
    pub debug: bool,
}

impl DecodeOptions {
    pub fn validate(&self) -> Result<(), StegoError> {
        validate_chaotic(&self.chaotic)?;
        if let Some(i) = self.decoy_index {
            validate_decoy_index(i)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaos::MapType;

    #[test]
    fn defaults_are_valid() {
        let o = SteganographyOptions::default();
        assert!(o.validate().is_ok());
        assert_eq!(o.algorithm, Algorithm::AdaptiveHybrid);
        assert_eq!(o.compression.level, 6);
        assert!((o.target_psnr() - 48.0).abs() < 1e-9);
        assert!(DecodeOptions::default().validate().is_ok());
    }

    #[test]
    fn parses_collaborator_json() {
        let o = SteganographyOptions::from_json(
            r#"{
                "algorithm": "chaotic-lsb",
                "encryption": {"algorithm": "defense", "strength": "high", "quantumResistant": true},
                "compression": {"algorithm": "huffman", "level": 9},
                "chaotic": {"mapType": "arnoldCat", "seed": 0.25, "iterations": 50},
                "capacity": 3,
                "expiry": {"type": "views", "value": 2},
                "isDecoy": true,
                "decoyIndex": 2
            }"#,
        )
        .unwrap();
        assert_eq!(o.algorithm, Algorithm::ChaoticLsb);
        assert_eq!(o.encryption.algorithm, EncryptionAlgorithm::Defense);
        assert!(o.encryption.quantum_resistant);
        assert_eq!(o.chaotic.map_type, MapType::ArnoldCat);
        assert_eq!(o.chaotic.seed, Some(0.25));
        assert!(o.chaotic.use_password);
        assert_eq!(o.expiry, Some(Expiry { kind: ExpiryKind::Views, value: 2 }));
        assert_eq!(o.frame_index(), Some(2));
        assert_eq!(o.quality, 90);
    }

    #[test]
    fn rejects_out_of_range() {
        let bad = [
            r#"{"capacity": 9}"#,
            r#"{"capacity": 0}"#,
            r#"{"quality": 0}"#,
            r#"{"compression": {"level": 10}}"#,
            r#"{"chaotic": {"seed": 1.0}}"#,
            r#"{"chaotic": {"iterations": 2000000}}"#,
            r#"{"isDecoy": true}"#,
            r#"{"decoyIndex": 4}"#,
            r#"{"expiry": {"type": "time", "value": 0}}"#,
            r#"{"algorithm": "steghide"}"#,
            "not json",
        ];
        for json in bad {
            assert!(
                matches!(SteganographyOptions::from_json(json), Err(StegoError::InvalidInput(_))),
                "{json}"
            );
        }
    }

    #[test]
    fn decoy_index_ignored_unless_decoy() {
        let o = SteganographyOptions { decoy_index: Some(1), ..Default::default() };
        assert!(o.validate().is_ok());
        assert_eq!(o.frame_index(), None);
    }
}

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Message envelope and payload framing.
//!
//! Every message becomes one NUL-terminated frame:
//!
//! ```text
//! RAW: {..EnvelopeMetadata..} :: base64(compressed blob) \0
//! ENC: {"v":1,"enc":{..EncryptionMetadata..}} :: cipher output \0
//! ```
//!
//! (without the spaces). A RAW frame omits what the blob already records
//! (compression info) and the default classification. An ENC frame exposes
//! only how it was encrypted; the full [`EnvelopeMetadata`] and the
//! compressed blob travel inside the sealed [`MessageEnvelope`]. Decoy
//! messages are further frames appended to the same stream.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::compress::CompressionInfo;
use crate::crypto::quantum::PqMetadata;
use crate::crypto::{b64_decode, b64_encode, EncryptionAlgorithm, Strength};
use crate::stego::error::StegoError;
use crate::stego::options::{Expiry, ExpiryKind};

/// Envelope format version.
pub const FORMAT_VERSION: u8 = 1;

/// Classification of messages stored without a password.
pub const UNCLASSIFIED: &str = "UNCLASSIFIED";

const RAW_PREFIX: &[u8] = b"RAW:";
const ENC_PREFIX: &[u8] = b"ENC:";
const SEPARATOR: &[u8] = b"::";
const TERMINATOR: u8 = 0;

/// Absolute expiry recorded at encode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExpiryStamp {
    /// Expired once the clock passes `at` (unix seconds).
    Time { at: u64 },
    /// Expired once `max` views have been recorded.
    Views { max: u64 },
}

impl ExpiryStamp {
    pub fn new(expiry: &Expiry, encoded_at: u64) -> Self {
        match expiry.kind {
            ExpiryKind::Time => Self::Time { at: encoded_at.saturating_add(expiry.value) },
            ExpiryKind::Views => Self::Views { max: expiry.value },
        }
    }

    pub fn is_expired(&self, now: u64, views: u32) -> bool {
        match *self {
            Self::Time { at } => now > at,
            Self::Views { max } => u64::from(views) >= max,
        }
    }
}

fn unclassified() -> String {
    UNCLASSIFIED.to_string()
}

fn is_unclassified(cls: &str) -> bool {
    cls == UNCLASSIFIED
}

/// Per-message metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMetadata {
    pub v: u8,
    /// Decoy slot; `None` for the main message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idx: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<ExpiryStamp>,
    /// Encode time, unix seconds.
    pub ts: u64,
    #[serde(default = "unclassified", skip_serializing_if = "is_unclassified")]
    pub cls: String,
    /// Carried in sealed envelopes; RAW frames leave it to the blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmp: Option<CompressionInfo>,
}

/// How an ENC frame was sealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    pub alg: EncryptionAlgorithm,
    pub strength: Strength,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pq: Option<PqMetadata>,
}

/// The sealed plaintext of an ENC frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    pub metadata: EnvelopeMetadata,
    /// Compressed blob, base64.
    pub message: String,
    pub timestamp: u64,
    pub classification: String,
}

impl MessageEnvelope {
    pub fn new(metadata: EnvelopeMetadata, blob: &[u8]) -> Self {
        Self {
            timestamp: metadata.ts,
            classification: metadata.cls.clone(),
            message: b64_encode(blob),
            metadata,
        }
    }

    /// The compressed blob.
    pub fn blob(&self) -> Result<Vec<u8>, StegoError> {
        b64_decode(&self.message, StegoError::CorruptedImage)
    }
}

#[derive(Serialize, Deserialize)]
struct EncHeader {
    v: u8,
    enc: EncryptionMetadata,
}

/// One parsed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Raw { meta: EnvelopeMetadata, blob: Vec<u8> },
    Encrypted { enc: EncryptionMetadata, ciphertext: String },
}

fn frame_bytes<H: Serialize>(prefix: &[u8], header: &H, body: &[u8]) -> Result<Vec<u8>, StegoError> {
    let json = serde_json::to_vec(header).map_err(|_| StegoError::InvalidInput("frame header"))?;
    let mut out = Vec::with_capacity(prefix.len() + json.len() + SEPARATOR.len() + body.len() + 1);
    out.extend_from_slice(prefix);
    out.extend_from_slice(&json);
    out.extend_from_slice(SEPARATOR);
    out.extend_from_slice(body);
    out.push(TERMINATOR);
    Ok(out)
}

/// Split `segment` into its leading JSON header and the bytes after `::`.
fn split_header<H: DeserializeOwned>(segment: &[u8]) -> Result<(H, &[u8]), StegoError> {
    let mut stream = serde_json::Deserializer::from_slice(segment).into_iter::<H>();
    let header = match stream.next() {
        Some(Ok(h)) => h,
        _ => return Err(StegoError::CorruptedImage),
    };
    let rest = &segment[stream.byte_offset()..];
    let body = rest.strip_prefix(SEPARATOR).ok_or(StegoError::CorruptedImage)?;
    Ok((header, body))
}

impl Frame {
    /// Serialise the frame including its terminator.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StegoError> {
        match self {
            Frame::Raw { meta, blob } => frame_bytes(RAW_PREFIX, meta, b64_encode(blob).as_bytes()),
            Frame::Encrypted { enc, ciphertext } => {
                if ciphertext.as_bytes().contains(&TERMINATOR) {
                    return Err(StegoError::InvalidInput("ciphertext contains NUL"));
                }
                frame_bytes(
                    ENC_PREFIX,
                    &EncHeader { v: FORMAT_VERSION, enc: enc.clone() },
                    ciphertext.as_bytes(),
                )
            }
        }
    }

    /// Parse one segment (without its terminator).
    ///
    /// # Errors
    /// [`StegoError::CorruptedImage`] for an unknown prefix, malformed JSON,
    /// a missing separator or an unsupported version.
    pub fn parse(segment: &[u8]) -> Result<Self, StegoError> {
        if let Some(rest) = segment.strip_prefix(RAW_PREFIX) {
            let (meta, body): (EnvelopeMetadata, _) = split_header(rest)?;
            if meta.v != FORMAT_VERSION {
                return Err(StegoError::CorruptedImage);
            }
            let text = std::str::from_utf8(body).map_err(|_| StegoError::CorruptedImage)?;
            let blob = b64_decode(text, StegoError::CorruptedImage)?;
            Ok(Frame::Raw { meta, blob })
        } else if let Some(rest) = segment.strip_prefix(ENC_PREFIX) {
            let (header, body): (EncHeader, _) = split_header(rest)?;
            if header.v != FORMAT_VERSION {
                return Err(StegoError::CorruptedImage);
            }
            let ciphertext = std::str::from_utf8(body).map_err(|_| StegoError::CorruptedImage)?;
            Ok(Frame::Encrypted { enc: header.enc, ciphertext: ciphertext.to_string() })
        } else {
            Err(StegoError::CorruptedImage)
        }
    }
}

/// Non-empty NUL-delimited segments of an extracted stream.
pub fn segments(stream: &[u8]) -> impl Iterator<Item = &[u8]> {
    stream.split(|&b| b == TERMINATOR).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::{compress, CompressionAlgorithm};

    fn meta(idx: Option<u8>) -> EnvelopeMetadata {
        let c = compress("hello hello", CompressionAlgorithm::Hybrid, 6);
        EnvelopeMetadata {
            v: FORMAT_VERSION,
            idx,
            exp: Some(ExpiryStamp::Views { max: 3 }),
            ts: 1_700_000_000,
            cls: UNCLASSIFIED.to_string(),
            cmp: Some(c.info(11)),
        }
    }

    #[test]
    fn raw_frame_layout_and_parse() {
        let frame = Frame::Raw { meta: meta(None), blob: vec![1, 2, 3, 250] };
        let bytes = frame.to_bytes().unwrap();
        assert!(bytes.starts_with(b"RAW:{\"v\":1,"));
        assert_eq!(*bytes.last().unwrap(), 0);
        assert_eq!(Frame::parse(&bytes[..bytes.len() - 1]).unwrap(), frame);
    }

    #[test]
    fn raw_frame_omits_derivable_fields() {
        let meta = EnvelopeMetadata { exp: None, cmp: None, ..meta(None) };
        let frame = Frame::Raw { meta, blob: vec![1, 2, 3] };
        let bytes = frame.to_bytes().unwrap();
        assert_eq!(bytes, b"RAW:{\"v\":1,\"ts\":1700000000}::AQID\0");
        assert_eq!(Frame::parse(&bytes[..bytes.len() - 1]).unwrap(), frame);
    }

    #[test]
    fn enc_frame_hides_metadata() {
        let frame = Frame::Encrypted {
            enc: EncryptionMetadata { alg: EncryptionAlgorithm::Aes256, strength: Strength::Standard, pq: None },
            ciphertext: "QUJDRA==::tail".to_string(),
        };
        let bytes = frame.to_bytes().unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.starts_with("ENC:"));
        assert!(!text.contains("\"ts\""));
        // Only the first separator after the JSON splits the frame.
        assert_eq!(Frame::parse(&bytes[..bytes.len() - 1]).unwrap(), frame);
    }

    #[test]
    fn segments_split_concatenated_frames() {
        let a = Frame::Raw { meta: meta(None), blob: vec![9] }.to_bytes().unwrap();
        let b = Frame::Raw { meta: meta(Some(2)), blob: vec![8] }.to_bytes().unwrap();
        let mut stream = a.clone();
        stream.extend_from_slice(&b);
        stream.extend_from_slice(&[0, 0]);
        let parsed: Vec<Frame> = segments(&stream).map(|s| Frame::parse(s).unwrap()).collect();
        assert_eq!(parsed.len(), 2);
        match &parsed[1] {
            Frame::Raw { meta, .. } => assert_eq!(meta.idx, Some(2)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_segments_rejected() {
        for seg in [&b"XYZ:{}::"[..], b"RAW:{\"v\":1", b"RAW:{\"v\":2,\"ts\":0}::AAAA", b"ENC:not json::x"] {
            assert_eq!(Frame::parse(seg), Err(StegoError::CorruptedImage));
        }
        let mut bytes = Frame::Raw { meta: meta(None), blob: vec![1] }.to_bytes().unwrap();
        bytes.pop();
        let idx = bytes.windows(2).rposition(|w| w == b"::").unwrap();
        bytes.remove(idx);
        assert_eq!(Frame::parse(&bytes), Err(StegoError::CorruptedImage));
    }

    #[test]
    fn expiry_rules() {
        let t = ExpiryStamp::new(&Expiry { kind: ExpiryKind::Time, value: 60 }, 1000);
        assert_eq!(t, ExpiryStamp::Time { at: 1060 });
        assert!(!t.is_expired(1060, 0));
        assert!(t.is_expired(1061, 0));
        let v = ExpiryStamp::new(&Expiry { kind: ExpiryKind::Views, value: 2 }, 1000);
        assert!(!v.is_expired(0, 1));
        assert!(v.is_expired(0, 2));
    }

    #[test]
    fn envelope_carries_blob() {
        let env = MessageEnvelope::new(meta(Some(1)), &[7, 7, 7]);
        assert_eq!(env.blob().unwrap(), vec![7, 7, 7]);
        assert_eq!(env.classification, UNCLASSIFIED);
        let json = serde_json::to_string(&env).unwrap();
        assert_eq!(serde_json::from_str::<MessageEnvelope>(&json).unwrap(), env);
    }
}

// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Encode/decode orchestration.
//!
//! Encode:
//! 1. Compress the plaintext and build its metadata.
//! 2. Seal metadata and blob when a password is given (AES-256 or the
//!    defense envelope, optionally wrapped by the KEM and signature scheme).
//! 3. Frame the result, appending decoy frames if any.
//! 4. Pick the algorithm (the strategy selector for adaptive-hybrid) and
//!    check capacity.
//! 5. Write the header and embed into a private copy of the pixels.
//! 6. Extract again and compare before returning the copy.
//!
//! Decode reverses the chain. Keyed algorithms are tried with the password
//! seed first, then with the numeric seed that decoy encodes use.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::bits::{bits_to_bytes, bytes_to_bits};
use crate::compress::{compress, decompress, CompressedData, MAX_DECOMPRESSED_CHARS};
use crate::crypto::quantum::{self, PqMetadata};
use crate::crypto::{
    Aes256Crypto, DefenseEnvelope, EncryptionAlgorithm, HashSignatureSimulator, Kem, LatticeKemSimulator,
    SignatureScheme,
};
use crate::image::PixelBuffer;
use crate::stego::audit::{Audit, AuditSink, TracingAudit};
use crate::stego::embed::{ensure_fits, strategy, Algorithm, EmbedContext};
use crate::stego::envelope::{
    segments, EncryptionMetadata, EnvelopeMetadata, ExpiryStamp, Frame, MessageEnvelope, FORMAT_VERSION,
    UNCLASSIFIED,
};
use crate::stego::error::StegoError;
use crate::stego::header::{BinaryHeader, HEADER_BYTES};
use crate::stego::options::{validate_decoy_index, DecodeOptions, EncryptionOptions, SteganographyOptions, MAX_DECOY_INDEX};
use crate::stego::strategy::{analyze_image, analyze_message, candidates, select};

/// Result of a successful decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Plaintext(String),
    /// The image holds an encrypted message and no password was given.
    EncryptedPending,
}

/// A decoy stored next to the real message, revealed by its own password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoyMessage {
    pub message: String,
    pub password: String,
    /// Slot 1–3.
    pub index: u8,
}

/// Frames read from one stream: the main message and its decoys.
const MAX_FRAMES: usize = 1 + MAX_DECOY_INDEX as usize;

/// Embedding choice written to the header.
#[derive(Debug, Clone, Copy)]
struct Choice {
    algorithm: Algorithm,
    nibble: u8,
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Header nibble for an explicitly requested algorithm.
fn explicit_nibble(algorithm: Algorithm, capacity: u8) -> u8 {
    match algorithm {
        Algorithm::MultibitLsb => capacity,
        Algorithm::ChaoticLsb => capacity.min(3),
        Algorithm::MobileOptimized => 3,
        _ => 1,
    }
}

/// Higher wins when several frames fail for different reasons.
fn severity(err: &StegoError) -> u8 {
    match err {
        StegoError::IntegrityViolation => 5,
        StegoError::MessageExpired => 4,
        StegoError::DecoyNotFound => 3,
        StegoError::IncorrectPassword => 2,
        StegoError::CorruptedImage => 1,
        _ => 0,
    }
}

fn keep_worst(current: &mut Option<StegoError>, err: StegoError) {
    if current.as_ref().map_or(true, |c| severity(&err) > severity(c)) {
        *current = Some(err);
    }
}

/// The steganography engine with its pluggable post-quantum primitives.
pub struct Steganographer {
    kem: Box<dyn Kem>,
    signer: Box<dyn SignatureScheme>,
}

impl Default for Steganographer {
    fn default() -> Self {
        Self::new()
    }
}

impl Steganographer {
    /// An engine using the bundled lattice KEM and hash-signature
    /// simulators.
    pub fn new() -> Self {
        Self::with_post_quantum(Box::new(LatticeKemSimulator::new()), Box::new(HashSignatureSimulator::new()))
    }

    pub fn with_post_quantum(kem: Box<dyn Kem>, signer: Box<dyn SignatureScheme>) -> Self {
        Self { kem, signer }
    }

    /// Hide `message` in a copy of `image`.
    ///
    /// # Errors
    /// - [`StegoError::InvalidInput`] for invalid options or a message
    ///   longer than 100 000 characters.
    /// - [`StegoError::CapacityExceeded`] if the framed payload does not fit.
    /// - [`StegoError::EmbeddingFailed`] if a frequency-domain block cannot
    ///   hold its bit or the read-back differs.
    pub fn encode(
        &self,
        image: &PixelBuffer,
        message: &str,
        password: Option<&str>,
        options: &SteganographyOptions,
        sink: &dyn AuditSink,
    ) -> Result<PixelBuffer, StegoError> {
        options.validate()?;
        let audit = Audit::new(sink, options.debug);
        let now = unix_now();
        let password = password.filter(|p| !p.is_empty());
        let frame = self.build_frame(message, password, options, options.frame_index(), now, &audit)?;
        self.embed_stream(image, &frame, password, options, message.chars().count(), &audit)
    }

    /// Hide `message` together with up to three decoys.
    ///
    /// Each decoy is sealed under its own password and revealed by it. The
    /// stream is positioned with the numeric chaotic seed so every password
    /// finds it.
    ///
    /// # Errors
    /// As [`Steganographer::encode`], plus [`StegoError::InvalidInput`] for
    /// more than three decoys, duplicate or out-of-range indices, or an
    /// empty password.
    pub fn encode_with_decoys(
        &self,
        image: &PixelBuffer,
        message: &str,
        password: &str,
        decoys: &[DecoyMessage],
        options: &SteganographyOptions,
        sink: &dyn AuditSink,
    ) -> Result<PixelBuffer, StegoError> {
        options.validate()?;
        if password.is_empty() || decoys.iter().any(|d| d.password.is_empty()) {
            return Err(StegoError::InvalidInput("decoy encoding needs passwords"));
        }
        if decoys.len() > MAX_DECOY_INDEX as usize {
            return Err(StegoError::InvalidInput("at most three decoys"));
        }
        for (i, d) in decoys.iter().enumerate() {
            validate_decoy_index(d.index)?;
            if decoys[..i].iter().any(|o| o.index == d.index) {
                return Err(StegoError::InvalidInput("duplicate decoy index"));
            }
        }

        let audit = Audit::new(sink, options.debug);
        let now = unix_now();
        let mut stream = self.build_frame(message, Some(password), options, None, now, &audit)?;
        let mut chars = message.chars().count();
        for d in decoys {
            stream.extend(self.build_frame(&d.message, Some(&d.password), options, Some(d.index), now, &audit)?);
            chars += d.message.chars().count();
        }
        audit.info("decoy", &format!("{} decoy frame(s) appended", decoys.len()));
        self.embed_stream(image, &stream, None, options, chars, &audit)
    }

    /// Recover the message hidden in `image`.
    ///
    /// # Errors
    /// - [`StegoError::NoHiddenMessage`] if the header is implausible or no
    ///   frame is found.
    /// - [`StegoError::UnsupportedAlgorithm`] for an unknown algorithm id.
    /// - [`StegoError::IncorrectPassword`], [`StegoError::IntegrityViolation`],
    ///   [`StegoError::MessageExpired`] or [`StegoError::DecoyNotFound`] as
    ///   the frames dictate, the most severe one winning.
    pub fn decode(
        &self,
        image: &PixelBuffer,
        password: Option<&str>,
        options: &DecodeOptions,
        sink: &dyn AuditSink,
    ) -> Result<DecodeOutcome, StegoError> {
        options.validate()?;
        let audit = Audit::new(sink, options.debug);
        let password = password.filter(|p| !p.is_empty());

        // 1. Header and length plausibility.
        let header = BinaryHeader::read(image.data())?;
        let bit_len = header.payload_bits as usize;
        if bit_len == 0 || bit_len % 8 != 0 || bit_len > image.data().len() * 8 {
            return Err(StegoError::NoHiddenMessage);
        }
        let algorithm = Algorithm::from_id(header.algorithm_id)?;
        let strat = strategy(algorithm);
        if !strat.accepts_nibble(header.nibble) || bit_len > strat.capacity_bits(image, header.nibble) {
            return Err(StegoError::NoHiddenMessage);
        }
        audit.debug("header", || {
            format!("algorithm={} nibble={:#06b} bits={bit_len}", algorithm.name(), header.nibble)
        });

        // 2. Extract under each candidate seed.
        let mut seeds = vec![options.chaotic];
        if algorithm.is_keyed() && password.is_some() && options.chaotic.use_password {
            seeds.push(options.chaotic.numeric());
        }
        let now = options.now.unwrap_or_else(unix_now);
        let mut worst = None;
        for chaotic in &seeds {
            let ctx = EmbedContext { nibble: header.nibble, chaotic, password };
            let stream = bits_to_bytes(&strat.extract(image, bit_len, &ctx)?);
            match self.read_stream(&stream, password, options, now, &audit) {
                Ok(outcome) => {
                    audit.info("decode", &format!("message recovered with {}", algorithm.name()));
                    return Ok(outcome);
                }
                Err(e) => keep_worst(&mut worst, e),
            }
        }
        let err = worst.unwrap_or(StegoError::NoHiddenMessage);
        audit.warn("decode", &err.to_string());
        Err(err)
    }

    /// Payload bytes `image` can hold under `options`.
    ///
    /// For adaptive-hybrid this is the capacity of the selector's preferred
    /// plan for a short message; frame overhead is not subtracted.
    pub fn capacity(&self, image: &PixelBuffer, options: &SteganographyOptions) -> Result<usize, StegoError> {
        options.validate()?;
        if image.data().len() < HEADER_BYTES {
            return Ok(0);
        }
        let bits = match options.algorithm {
            Algorithm::AdaptiveHybrid => candidates(&analyze_image(image), 0)
                .first()
                .map_or(0, |plan| plan.capacity_bits(image)),
            alg => strategy(alg).capacity_bits(image, explicit_nibble(alg, options.capacity)),
        };
        Ok(bits / 8)
    }

    fn build_frame(
        &self,
        message: &str,
        password: Option<&str>,
        options: &SteganographyOptions,
        idx: Option<u8>,
        now: u64,
        audit: &Audit<'_>,
    ) -> Result<Vec<u8>, StegoError> {
        let chars = message.chars().count();
        if chars > MAX_DECOMPRESSED_CHARS {
            return Err(StegoError::InvalidInput("message longer than 100000 characters"));
        }

        let compressed = compress(message, options.compression.algorithm, options.compression.level);
        let blob = compressed.to_bytes()?;
        audit.debug("compress", || {
            let stats = analyze_message(message);
            format!(
                "{:?}: {} chars -> {} bytes (entropy {:.2}, compressibility {:.2})",
                compressed.tag,
                chars,
                blob.len(),
                stats.entropy,
                stats.compressibility
            )
        });

        let cls = match password {
            Some(_) => options.encryption.strength.classification(),
            None => UNCLASSIFIED,
        };
        let metadata = EnvelopeMetadata {
            v: FORMAT_VERSION,
            idx,
            exp: options.expiry.map(|e| ExpiryStamp::new(&e, now)),
            ts: now,
            cls: cls.to_string(),
            cmp: password.map(|_| compressed.info(chars)),
        };

        let frame = match password {
            None => Frame::Raw { meta: metadata, blob },
            Some(pw) => {
                let envelope = MessageEnvelope::new(metadata, &blob);
                let (ciphertext, pq) = self.seal(&envelope, pw, &options.encryption)?;
                audit.debug("encrypt", || {
                    format!(
                        "{:?}/{:?} quantum={}",
                        options.encryption.algorithm,
                        options.encryption.strength,
                        pq.is_some()
                    )
                });
                let enc = EncryptionMetadata {
                    alg: options.encryption.algorithm,
                    strength: options.encryption.strength,
                    pq,
                };
                Frame::Encrypted { enc, ciphertext }
            }
        };
        frame.to_bytes()
    }

    fn seal(
        &self,
        envelope: &MessageEnvelope,
        password: &str,
        encryption: &EncryptionOptions,
    ) -> Result<(String, Option<PqMetadata>), StegoError> {
        let inner = |pw: &str| -> Result<String, StegoError> {
            match encryption.algorithm {
                EncryptionAlgorithm::Aes256 => {
                    let json = serde_json::to_string(envelope)
                        .map_err(|_| StegoError::InvalidInput("unserialisable message"))?;
                    Aes256Crypto::new().encrypt(&json, pw)
                }
                EncryptionAlgorithm::Defense => DefenseEnvelope::new(encryption.strength).seal(envelope, pw),
            }
        };
        if encryption.quantum_resistant {
            let (ciphertext, meta) = quantum::seal(self.kem.as_ref(), self.signer.as_ref(), password, inner)?;
            Ok((ciphertext, Some(meta)))
        } else {
            Ok((inner(password)?, None))
        }
    }

    fn unseal(&self, enc: &EncryptionMetadata, ciphertext: &str, password: &str) -> Result<MessageEnvelope, StegoError> {
        let inner = |output: &str, pw: &str| -> Result<MessageEnvelope, StegoError> {
            match enc.alg {
                EncryptionAlgorithm::Aes256 => {
                    let json = Aes256Crypto::new().decrypt(output, pw)?;
                    // Garbage that happens to unpad cleanly lands here.
                    serde_json::from_str(&json).map_err(|_| StegoError::IncorrectPassword)
                }
                EncryptionAlgorithm::Defense => DefenseEnvelope::new(enc.strength).open(output, pw),
            }
        };
        match &enc.pq {
            Some(meta) => quantum::open(self.kem.as_ref(), self.signer.as_ref(), password, meta, ciphertext, inner),
            None => inner(ciphertext, password),
        }
    }

    /// Find the message in an extracted stream.
    ///
    /// Frames beyond the first [`MAX_FRAMES`] are ignored. With a requested
    /// decoy index only the frame carrying that index is accepted. Without one, the main frame wins and a decoy frame that
    /// opened under the password is returned otherwise.
    fn read_stream(
        &self,
        stream: &[u8],
        password: Option<&str>,
        options: &DecodeOptions,
        now: u64,
        audit: &Audit<'_>,
    ) -> Result<DecodeOutcome, StegoError> {
        let mut worst = None;
        let mut parsed_any = false;
        let mut pending = false;
        let mut decoy_fallback = None;

        let frames = segments(stream).filter_map(|segment| Frame::parse(segment).ok());
        for frame in frames.take(MAX_FRAMES) {
            parsed_any = true;

            let (meta, blob) = match frame {
                Frame::Raw { meta, blob } => (meta, blob),
                Frame::Encrypted { enc, ciphertext } => {
                    let Some(pw) = password else {
                        pending = true;
                        continue;
                    };
                    match self.unseal(&enc, &ciphertext, pw).and_then(|env| env.blob().map(|blob| (blob, env))) {
                        Ok((blob, env)) => (env.metadata, blob),
                        Err(e) => {
                            keep_worst(&mut worst, e);
                            continue;
                        }
                    }
                }
            };

            if meta.exp.is_some_and(|exp| exp.is_expired(now, options.views)) {
                audit.debug("expiry", || format!("frame idx={:?} expired", meta.idx));
                keep_worst(&mut worst, StegoError::MessageExpired);
                continue;
            }
            let accept_now = match (options.decoy_index, meta.idx) {
                (Some(want), Some(got)) if want == got => true,
                (Some(_), _) => {
                    keep_worst(&mut worst, StegoError::DecoyNotFound);
                    continue;
                }
                (None, None) => true,
                (None, Some(_)) => false,
            };

            let text = match CompressedData::from_bytes(&blob).and_then(|c| decompress(&c)) {
                Ok(text) => text,
                Err(e) => {
                    keep_worst(&mut worst, e);
                    continue;
                }
            };
            if accept_now {
                return Ok(DecodeOutcome::Plaintext(text));
            }
            if decoy_fallback.is_none() {
                decoy_fallback = Some(text);
            }
        }

        if let Some(text) = decoy_fallback {
            return Ok(DecodeOutcome::Plaintext(text));
        }
        if pending {
            return Ok(DecodeOutcome::EncryptedPending);
        }
        match worst {
            Some(e) => Err(e),
            None if parsed_any || password.is_none() => Err(StegoError::NoHiddenMessage),
            None => Err(StegoError::IncorrectPassword),
        }
    }

    fn embed_stream(
        &self,
        image: &PixelBuffer,
        stream: &[u8],
        key_password: Option<&str>,
        options: &SteganographyOptions,
        message_chars: usize,
        audit: &Audit<'_>,
    ) -> Result<PixelBuffer, StegoError> {
        super::validate_encode_dimensions(image.width(), image.height())?;
        let bits = bytes_to_bits(stream);
        let payload_bits = u32::try_from(bits.len()).map_err(|_| StegoError::CapacityExceeded)?;

        // Choose and check capacity before touching any pixel.
        let choice = match options.algorithm {
            Algorithm::AdaptiveHybrid => {
                let selection = select(image, bits.len(), message_chars)?;
                audit.debug("select", || {
                    format!(
                        "entropy={:.2} edges={:.3} -> {:?} (fallback: {})",
                        selection.image.entropy, selection.image.edge_density, selection.plan, selection.fell_back
                    )
                });
                Choice { algorithm: selection.plan.algorithm, nibble: selection.plan.nibble() }
            }
            algorithm => {
                let nibble = explicit_nibble(algorithm, options.capacity);
                ensure_fits(bits.len(), strategy(algorithm).capacity_bits(image, nibble))?;
                Choice { algorithm, nibble }
            }
        };
        let strat = strategy(choice.algorithm);
        let ctx = EmbedContext { nibble: choice.nibble, chaotic: &options.chaotic, password: key_password };

        let mut out = image.clone();
        BinaryHeader::new(payload_bits, choice.algorithm.id(), choice.nibble).write(out.data_mut())?;
        strat.embed(&mut out, &bits, &ctx)?;

        if strat.extract(&out, bits.len(), &ctx)? != bits {
            audit.warn("verify", "read-back differs from the embedded payload");
            return Err(StegoError::EmbeddingFailed);
        }

        if let Some(psnr) = image.psnr(&out) {
            if psnr < options.target_psnr() {
                audit.warn("quality", &format!("PSNR {psnr:.1} dB below target {:.1} dB", options.target_psnr()));
            } else {
                audit.debug("quality", || format!("PSNR {psnr:.1} dB"));
            }
        }
        audit.info(
            "encode",
            &format!("{} bits embedded with {}", payload_bits, choice.algorithm.name()),
        );
        Ok(out)
    }
}

/// [`Steganographer::encode`] with the default engine, audited through
/// `tracing`.
pub fn encode(
    image: &PixelBuffer,
    message: &str,
    password: Option<&str>,
    options: &SteganographyOptions,
) -> Result<PixelBuffer, StegoError> {
    Steganographer::new().encode(image, message, password, options, &TracingAudit)
}

/// [`Steganographer::encode_with_decoys`] with the default engine.
pub fn encode_with_decoys(
    image: &PixelBuffer,
    message: &str,
    password: &str,
    decoys: &[DecoyMessage],
    options: &SteganographyOptions,
) -> Result<PixelBuffer, StegoError> {
    Steganographer::new().encode_with_decoys(image, message, password, decoys, options, &TracingAudit)
}

/// [`Steganographer::decode`] with the default engine.
pub fn decode(
    image: &PixelBuffer,
    password: Option<&str>,
    options: &DecodeOptions,
) -> Result<DecodeOutcome, StegoError> {
    Steganographer::new().decode(image, password, options, &TracingAudit)
}

/// [`Steganographer::capacity`] with the default engine.
pub fn capacity(image: &PixelBuffer, options: &SteganographyOptions) -> Result<usize, StegoError> {
    Steganographer::new().capacity(image, options)
}

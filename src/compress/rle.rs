// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Run-length coding: `<count><char>` per run, count omitted for a run of 1.
//!
//! A backslash escapes the next character, which is how literal backslashes
//! and literal ASCII digits survive next to the decimal counts.

use crate::stego::error::StegoError;

fn push_escaped(out: &mut String, c: char) {
    if c == '\\' || c.is_ascii_digit() {
        out.push('\\');
    }
    out.push(c);
}

/// Run-length encode `text`.
pub fn compress(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let mut run = 1usize;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }
        if run > 1 {
            out.push_str(&run.to_string());
        }
        push_escaped(&mut out, c);
    }
    out
}

/// Decode run-length text, refusing to grow past `max_chars` characters.
///
/// # Errors
/// [`StegoError::CorruptedImage`] on a dangling count or escape, or when the
/// expansion exceeds `max_chars`.
pub fn decompress(encoded: &str, max_chars: usize) -> Result<String, StegoError> {
    let mut out = String::with_capacity(encoded.len());
    let mut produced = 0usize;
    let mut chars = encoded.chars();
    let mut count: Option<usize> = None;

    while let Some(c) = chars.next() {
        if let Some(d) = c.to_digit(10) {
            let next = count
                .unwrap_or(0)
                .checked_mul(10)
                .and_then(|n| n.checked_add(d as usize))
                .ok_or(StegoError::CorruptedImage)?;
            count = Some(next);
            continue;
        }
        let symbol = if c == '\\' {
            chars.next().ok_or(StegoError::CorruptedImage)?
        } else {
            c
        };
        let run = count.take().unwrap_or(1);
        if run == 0 {
            return Err(StegoError::CorruptedImage);
        }
        produced = produced.checked_add(run).ok_or(StegoError::CorruptedImage)?;
        if produced > max_chars {
            return Err(StegoError::CorruptedImage);
        }
        out.extend(std::iter::repeat(symbol).take(run));
    }

    if count.is_some() {
        return Err(StegoError::CorruptedImage);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_and_singles() {
        assert_eq!(compress("aaaaaaaa"), "8a");
        assert_eq!(compress("HELLO"), "HE2LO");
        assert_eq!(compress(""), "");
    }

    #[test]
    fn escapes_backslash_and_digits() {
        let text = r"a\\\b111 2";
        let enc = compress(text);
        assert_eq!(enc, r"a3\\b3\1 \2");
        assert_eq!(decompress(&enc, 1000).unwrap(), text);
    }

    #[test]
    fn unicode_runs() {
        let text = "世世世界é";
        assert_eq!(decompress(&compress(text), 1000).unwrap(), text);
    }

    #[test]
    fn dangling_count_rejected() {
        assert_eq!(decompress("3a4", 1000), Err(StegoError::CorruptedImage));
        assert_eq!(decompress("ab\\", 1000), Err(StegoError::CorruptedImage));
    }

    #[test]
    fn expansion_capped() {
        assert_eq!(decompress("99999999a", 1000), Err(StegoError::CorruptedImage));
        assert_eq!(decompress("0a", 1000), Err(StegoError::CorruptedImage));
    }
}

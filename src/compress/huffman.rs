// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only

//! Frequency-table Huffman coding over Unicode scalar values.
//!
//! The serialised header is the frequency table itself, as comma-separated
//! `hex(code point):hex(count)` pairs sorted by code point. Encoder and
//! decoder rebuild the identical tree from it: the node list is stably sorted
//! by frequency, the two lowest nodes are merged, the merged node is appended
//! and the list is re-sorted, until one root remains. The first-popped node
//! becomes the `0` branch.

use std::collections::BTreeMap;

use crate::stego::error::StegoError;

/// Huffman-coded text: frequency-table header plus code bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanEncoded {
    pub header: String,
    pub bits: Vec<u8>,
}

enum Node {
    Leaf { symbol: char, freq: u64 },
    Internal { freq: u64, zero: usize, one: usize },
}

impl Node {
    fn freq(&self) -> u64 {
        match self {
            Node::Leaf { freq, .. } | Node::Internal { freq, .. } => *freq,
        }
    }
}

/// Arena-allocated tree; `root` indexes into `nodes`.
struct Tree {
    nodes: Vec<Node>,
    root: usize,
}

fn frequency_table(text: &str) -> Vec<(char, u64)> {
    let mut freq: BTreeMap<char, u64> = BTreeMap::new();
    for c in text.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }
    freq.into_iter().collect()
}

fn build_tree(table: &[(char, u64)]) -> Option<Tree> {
    if table.is_empty() {
        return None;
    }
    let mut nodes: Vec<Node> = table
        .iter()
        .map(|&(symbol, freq)| Node::Leaf { symbol, freq })
        .collect();
    let mut queue: Vec<usize> = (0..nodes.len()).collect();
    queue.sort_by_key(|&i| nodes[i].freq());

    while queue.len() > 1 {
        let zero = queue.remove(0);
        let one = queue.remove(0);
        let freq = nodes[zero].freq().saturating_add(nodes[one].freq());
        nodes.push(Node::Internal { freq, zero, one });
        queue.push(nodes.len() - 1);
        queue.sort_by_key(|&i| nodes[i].freq());
    }

    Some(Tree { root: queue[0], nodes })
}

fn assign_codes(tree: &Tree) -> BTreeMap<char, Vec<u8>> {
    let mut codes = BTreeMap::new();
    if let Node::Leaf { symbol, .. } = tree.nodes[tree.root] {
        // Single-symbol input: one-bit code per occurrence.
        codes.insert(symbol, vec![0]);
        return codes;
    }
    let mut stack = vec![(tree.root, Vec::new())];
    while let Some((idx, prefix)) = stack.pop() {
        match tree.nodes[idx] {
            Node::Leaf { symbol, .. } => {
                codes.insert(symbol, prefix);
            }
            Node::Internal { zero, one, .. } => {
                let mut p0 = prefix.clone();
                p0.push(0);
                let mut p1 = prefix;
                p1.push(1);
                stack.push((one, p1));
                stack.push((zero, p0));
            }
        }
    }
    codes
}

fn serialize_table(table: &[(char, u64)]) -> String {
    table
        .iter()
        .map(|&(c, n)| format!("{:x}:{:x}", c as u32, n))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a frequency table whose counts sum to at most `max_total`.
fn parse_table(header: &str, max_total: u64) -> Result<(Vec<(char, u64)>, u64), StegoError> {
    if header.is_empty() {
        return Ok((Vec::new(), 0));
    }
    let mut table = Vec::new();
    let mut total = 0u64;
    let mut last: Option<char> = None;
    for pair in header.split(',') {
        let (code, count) = pair.split_once(':').ok_or(StegoError::CorruptedImage)?;
        let code = u32::from_str_radix(code, 16).map_err(|_| StegoError::CorruptedImage)?;
        let symbol = char::from_u32(code).ok_or(StegoError::CorruptedImage)?;
        let count = u64::from_str_radix(count, 16).map_err(|_| StegoError::CorruptedImage)?;
        if count == 0 || last.map_or(false, |l| l >= symbol) {
            return Err(StegoError::CorruptedImage);
        }
        total = total
            .checked_add(count)
            .filter(|&t| t <= max_total)
            .ok_or(StegoError::CorruptedImage)?;
        last = Some(symbol);
        table.push((symbol, count));
    }
    Ok((table, total))
}

/// Huffman-compress `text`. Empty input yields an empty header and no bits.
pub fn compress(text: &str) -> HuffmanEncoded {
    let table = frequency_table(text);
    let Some(tree) = build_tree(&table) else {
        return HuffmanEncoded { header: String::new(), bits: Vec::new() };
    };
    let codes = assign_codes(&tree);
    let mut bits = Vec::new();
    for c in text.chars() {
        bits.extend_from_slice(&codes[&c]);
    }
    HuffmanEncoded { header: serialize_table(&table), bits }
}

/// Decode `bits` against the tree rebuilt from `header`.
///
/// Output is capped at `max_chars` characters.
///
/// # Errors
/// [`StegoError::CorruptedImage`] on a malformed header, trailing partial
/// code, or output exceeding `max_chars`.
pub fn decompress(header: &str, bits: &[u8], max_chars: usize) -> Result<String, StegoError> {
    let (table, total) = parse_table(header, max_chars as u64)?;
    let Some(tree) = build_tree(&table) else {
        return if bits.is_empty() { Ok(String::new()) } else { Err(StegoError::CorruptedImage) };
    };

    let mut out = String::with_capacity((total as usize).min(bits.len()));
    let mut emitted = 0u64;

    if let Node::Leaf { symbol, .. } = tree.nodes[tree.root] {
        for _ in bits {
            out.push(symbol);
        }
        emitted = bits.len() as u64;
    } else {
        let mut node = tree.root;
        for &bit in bits {
            node = match tree.nodes[node] {
                Node::Internal { zero, one, .. } => if bit == 0 { zero } else { one },
                Node::Leaf { .. } => unreachable!("walk resets at leaves"),
            };
            if let Node::Leaf { symbol, .. } = tree.nodes[node] {
                out.push(symbol);
                emitted += 1;
                if emitted > total {
                    return Err(StegoError::CorruptedImage);
                }
                node = tree.root;
            }
        }
        if node != tree.root {
            return Err(StegoError::CorruptedImage);
        }
    }

    if emitted != total {
        return Err(StegoError::CorruptedImage);
    }
    Ok(out)
}

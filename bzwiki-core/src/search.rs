//! Sharded substring search (C7): the blob is split at record boundaries
//! into up to 64 shards, each scanned by its own rayon task. Matching is
//! case-insensitive and punctuation-insensitive: the needle has whitespace
//! stripped, and non-alphanumeric haystack runs are skipped while matching
//! the remaining needle runes, with a digit guard so a query can't
//! accidentally match into a record's trailing ascii chunk index.

use std::ops::Range;

use regex::Regex;

use crate::blob::{RECORD_DELIM, TITLE_DELIM};
use crate::error::SearchError;

const TITLE_DELIM_CHAR: char = '\n';

#[derive(Clone)]
pub struct SearchOptions {
    pub shard_count: usize,
    pub ignore_rx: Option<Regex>,
    pub max_results: usize,
}

impl SearchOptions {
    pub fn new(shard_count: usize, ignore_rx: Option<&str>, max_results: usize) -> Result<Self, SearchError> {
        let ignore_rx = ignore_rx.map(Regex::new).transpose()?;
        Ok(Self {
            shard_count: shard_count.clamp(1, 64),
            ignore_rx,
            max_results,
        })
    }
}

pub struct SearchOutcome {
    /// Total matches across the whole blob, before pagination.
    pub total: usize,
    pub page: Vec<String>,
}

pub fn search(blob: &[u8], query: &str, page: usize, opts: &SearchOptions) -> SearchOutcome {
    let needle: Vec<char> = query.chars().filter(|c| !c.is_whitespace()).collect();
    if needle.is_empty() {
        return SearchOutcome { total: 0, page: Vec::new() };
    }
    let needle_lower: Vec<char> = needle.iter().map(|c| c.to_ascii_lowercase()).collect();
    let needle_upper: Vec<char> = needle.iter().map(|c| c.to_ascii_uppercase()).collect();

    let shards = compute_shards(blob, opts.shard_count);
    let k = shards.len();

    // One rayon task per shard, each writing only to its own result vector;
    // a bounded channel sized for all K sends merges them on this thread,
    // matching spec's "K sends, K receives" completion-channel requirement.
    let (tx, rx) = crossbeam_channel::bounded(k);
    rayon::scope(|s| {
        for range in shards {
            let tx = tx.clone();
            let needle_lower = &needle_lower;
            let needle_upper = &needle_upper;
            let ignore_rx = opts.ignore_rx.as_ref();
            s.spawn(move |_| {
                let found = scan_shard(blob, range, needle_lower, needle_upper, ignore_rx);
                let _ = tx.send(found);
            });
        }
        drop(tx);
    });

    let mut merged: Vec<String> = rx.into_iter().flatten().collect();
    merged.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

    let total = merged.len();
    let start = page.saturating_mul(opts.max_results.max(1));
    let page_items = if start >= total {
        Vec::new()
    } else {
        let end = (start + opts.max_results.max(1)).min(total);
        merged[start..end].to_vec()
    };

    SearchOutcome { total, page: page_items }
}

/// Splits `blob` into `k` record-aligned ranges. Boundary `i` (`1..k`) is
/// the first `TITLE_DELIM` at or before `i * len / k`.
fn compute_shards(blob: &[u8], k: usize) -> Vec<Range<usize>> {
    let len = blob.len();
    if len == 0 {
        return vec![0..0; k.max(1)];
    }
    let mut cuts = Vec::with_capacity(k + 1);
    cuts.push(0usize);
    for i in 1..k {
        let target = (i * len) / k;
        let mut pos = target.min(len - 1);
        while pos > 0 && blob[pos] != TITLE_DELIM {
            pos -= 1;
        }
        cuts.push(pos);
    }
    cuts.push(len);
    cuts.windows(2).map(|w| w[0]..w[1]).collect()
}

fn scan_shard(
    blob: &[u8],
    range: Range<usize>,
    needle_lower: &[char],
    needle_upper: &[char],
    ignore_rx: Option<&Regex>,
) -> Vec<String> {
    let n = needle_lower.len();
    let mut results = Vec::new();
    let hay_bytes = &blob[range.clone()];
    let hay = match std::str::from_utf8(hay_bytes) {
        Ok(s) => s,
        Err(_) => return results,
    };
    let chars: Vec<(usize, char)> = hay.char_indices().collect();
    let len_chars = chars.len();

    let mut ci = 0usize;
    while ci < len_chars {
        let (byte_pos, ch) = chars[ci];

        if ch.is_ascii_digit() {
            if let Some(skip_to) = index_run_end(&chars, ci) {
                ci = skip_to;
                continue;
            }
        }

        if fold_eq(ch, needle_lower[0], needle_upper[0]) {
            let mut cj = ci + 1;
            let mut s = 1;
            while s < n {
                while cj < len_chars
                    && !chars[cj].1.is_alphanumeric()
                    && chars[cj].1 != RECORD_DELIM as char
                    && chars[cj].1 != TITLE_DELIM_CHAR
                {
                    cj += 1;
                }
                if cj >= len_chars || chars[cj].1 == RECORD_DELIM as char || chars[cj].1 == TITLE_DELIM_CHAR {
                    break;
                }
                let c2 = chars[cj].1;
                if fold_eq(c2, needle_lower[s], needle_upper[s]) {
                    cj += 1;
                    s += 1;
                } else {
                    break;
                }
            }
            if s >= n {
                let abs_pos = range.start + byte_pos;
                if let Some(title) = recover_title(blob, abs_pos) {
                    let keep = ignore_rx.map(|rx| !rx.is_match(&title)).unwrap_or(true);
                    if keep {
                        results.push(title);
                    }
                }
                let mut k = ci;
                while k < len_chars && chars[k].1 != TITLE_DELIM_CHAR {
                    k += 1;
                }
                ci = if k < len_chars { k + 1 } else { len_chars };
                continue;
            }
        }

        ci += 1;
    }

    results
}

fn fold_eq(c: char, lower: char, upper: char) -> bool {
    c == lower || c == upper
}

/// If the digit run starting at `start` reaches a `TITLE_DELIM` without
/// hitting a non-digit character first, it's a record's ascii chunk index,
/// not title text: returns the char index just past that delimiter.
fn index_run_end(chars: &[(usize, char)], start: usize) -> Option<usize> {
    let mut k = start;
    while k < chars.len() {
        let c = chars[k].1;
        if c == TITLE_DELIM_CHAR {
            return Some(k + 1);
        }
        if !c.is_ascii_digit() {
            return None;
        }
        k += 1;
    }
    Some(chars.len())
}

fn recover_title(blob: &[u8], pos: usize) -> Option<String> {
    let mut start = pos;
    while start > 0 && blob[start - 1] != TITLE_DELIM {
        start -= 1;
    }
    let mut end = start;
    while end < blob.len() && blob[end] != RECORD_DELIM {
        end += 1;
    }
    if end >= blob.len() {
        return None;
    }
    std::str::from_utf8(&blob[start..end]).ok().map(|s| s.to_string())
}

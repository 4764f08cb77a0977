//! Preset id generation.
//!
//! Ids are derived from the display name so they stay readable:
//! - Unicode is decomposed (NFKD) and combining marks are dropped
//! - ASCII letters and digits are kept, lowercased
//! - Whitespace, `-` and `_` become `-`
//! - Any other non-ASCII character becomes `-u<hex>-`
//! - Repeated hyphens collapse, edges are trimmed
//!
//! The result is always ASCII, 2-50 characters and starts with a letter.

use crate::types::FrontmatterPreset;
use crate::validation::{PRESET_ID_MAX_LEN, is_valid_preset_id};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

const FALLBACK_ID: &str = "preset";
const MAX_SUFFIX_ATTEMPTS: u32 = 10_000;

fn is_combining_mark(c: char) -> bool {
    ('\u{0300}'..='\u{036F}').contains(&c)
}

/// Turn a display name into a preset id candidate (uniqueness not checked).
pub fn slugify_preset_name(name: &str) -> String {
    let mut raw = String::with_capacity(name.len());
    for c in name.nfkd() {
        if c.is_ascii_alphanumeric() {
            raw.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            raw.push('-');
        } else if is_combining_mark(c) {
            continue;
        } else if !c.is_ascii() {
            raw.push_str(&format!("-u{:x}-", c as u32));
        }
        // Remaining ASCII punctuation is dropped.
    }

    let mut slug = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    let mut slug = slug.trim_matches('-').to_string();

    if slug.is_empty() {
        return FALLBACK_ID.to_string();
    }
    if !slug.starts_with(|c: char| c.is_ascii_alphabetic()) {
        slug = format!("preset-{}", slug);
    }
    if slug.len() < 2 {
        return FALLBACK_ID.to_string();
    }

    truncate_id(&slug, PRESET_ID_MAX_LEN).to_string()
}

fn truncate_id(id: &str, max_len: usize) -> &str {
    if id.len() <= max_len {
        return id;
    }
    // Slugs are ASCII, so byte slicing is on a char boundary.
    id[..max_len].trim_end_matches('-')
}

/// Generate an id for `name` that no preset in `existing` uses.
///
/// Deterministic for a given name and store: the slug itself when free,
/// otherwise the slug with `-2`, `-3`, ... appended.
pub fn generate_unique_preset_id(name: &str, existing: &[FrontmatterPreset]) -> String {
    let taken: HashSet<&str> = existing.iter().map(|p| p.id.as_str()).collect();
    unique_id_from_base(&slugify_preset_name(name), |id| taken.contains(id))
}

/// Find the first free id derived from `base`, where `is_taken` reports ids in use.
pub(crate) fn unique_id_from_base(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if is_valid_preset_id(base) && !is_taken(base) {
        return base.to_string();
    }

    for n in 2..MAX_SUFFIX_ATTEMPTS + 2 {
        let suffix = format!("-{}", n);
        let stem = truncate_id(base, PRESET_ID_MAX_LEN - suffix.len());
        let candidate = format!("{}{}", stem, suffix);
        if is_valid_preset_id(&candidate) && !is_taken(&candidate) {
            return candidate;
        }
    }

    timestamp_id(chrono::Utc::now().timestamp_millis())
}

fn timestamp_id(millis: i64) -> String {
    format!("preset-{}", to_base36(millis.unsigned_abs()))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

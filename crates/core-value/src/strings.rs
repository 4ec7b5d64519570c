//! Grapheme-indexed string helpers backing the string reporter blocks.
//!
//! Block positions are 1-based and count user-perceived characters, not
//! bytes; all indexing here goes through grapheme clusters so combining
//! marks and emoji behave as single characters.

use unicode_segmentation::UnicodeSegmentation;

/// Number of user-perceived characters.
pub fn grapheme_len(s: &str) -> usize {
    s.graphemes(true).count()
}

/// 1-based character lookup. Out-of-range positions return `None`.
pub fn char_at(s: &str, index_1based: usize) -> Option<&str> {
    if index_1based == 0 {
        return None;
    }
    s.graphemes(true).nth(index_1based - 1)
}

/// Inclusive 1-based substring. Endpoints are swapped when reversed, then
/// clamped to the string; an empty intersection yields `""`.
pub fn substring(s: &str, start_1based: usize, end_1based: usize) -> String {
    let (lo, hi) = if start_1based <= end_1based {
        (start_1based, end_1based)
    } else {
        (end_1based, start_1based)
    };
    let lo = lo.max(1);
    s.graphemes(true)
        .skip(lo - 1)
        .take(hi.saturating_sub(lo - 1))
        .collect()
}

/// Reverse by grapheme so multi-byte clusters survive intact.
pub fn reverse(s: &str) -> String {
    s.graphemes(true).rev().collect()
}

/// Non-overlapping occurrence count.
pub fn count_matches(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// 1-based character position of the first occurrence, 0 when absent.
pub fn index_of(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    match haystack.find(needle) {
        Some(byte_pos) => grapheme_len(&haystack[..byte_pos]) + 1,
        None => 0,
    }
}

/// Replace the first occurrence only.
pub fn replace_first(haystack: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() {
        return haystack.to_owned();
    }
    haystack.replacen(needle, replacement, 1)
}

//! Numeric literal parsing and user-visible formatting.

use std::sync::LazyLock;

use regex::Regex;

// Accepted literal shapes: optional sign, then either a decimal with at
// least one digit somewhere around the dot, or a bare integer, with an
// optional exponent. The whole (trimmed) string must match.
static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?(\d*\.?\d+|\d+\.?)([eE][-+]?\d+)?$").unwrap());

/// Parse a block-program numeric literal.
///
/// Trims surrounding whitespace first; the remainder must be consumed
/// entirely or the string does not read as a number at all (`"1a"` is not
/// `1`). Returns `None` for non-numeric input; callers that want the
/// JavaScript-style fallback use `unwrap_or(0.0)`.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !DECIMAL_RE.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Format a number the way scripts observe it: fixed six fractional
/// digits, then trailing zeros stripped, then a dangling `.` removed.
///
/// `0.1` stays `"0.1"` (not `"0.100000"`), `350.0` prints as `"350"`, and
/// sub-precision magnitudes collapse to `"0"`. Non-finite values print as
/// `NaN` / `Infinity` / `-Infinity`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".into();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    let mut s = format!("{n:.6}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

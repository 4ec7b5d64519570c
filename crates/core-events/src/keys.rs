//! Key identity and Entry key-parameter resolution.
//!
//! Key params in project JSON are usually JavaScript `keyCode` strings
//! (`"37"` is the left arrow, `"65"` is A) because that is what the web
//! editor stores. Resolution order, matching the original engine:
//! numeric keyCode table, then canonical key name (case-insensitive),
//! then a single letter uppercased.

use tracing::warn;

/// Physical key identity, the index key of the key-pressed script table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Backspace,
    Tab,
    Enter,
    Shift,
    Ctrl,
    Alt,
    Escape,
    Space,
    Left,
    Up,
    Right,
    Down,
    /// `'0'..='9'`
    Digit(u8),
    /// `'A'..='Z'`
    Letter(char),
    Semicolon,
    Equal,
    Comma,
    Minus,
    Period,
    Slash,
    Grave,
    BracketLeft,
    Backslash,
    BracketRight,
    Apostrophe,
}

/// Resolve an Entry key parameter. Returns `None` (with a WARN) for
/// identifiers outside the supported table.
pub fn resolve_key_param(param: &str) -> Option<KeyCode> {
    let trimmed = param.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(key) = from_js_keycode(trimmed) {
        return Some(key);
    }
    if let Some(key) = from_name(trimmed) {
        return Some(key);
    }
    if trimmed.len() == 1 {
        let c = trimmed.chars().next().unwrap();
        if c.is_ascii_alphabetic() {
            return Some(KeyCode::Letter(c.to_ascii_uppercase()));
        }
        if c.is_ascii_digit() {
            return Some(KeyCode::Digit(c as u8 - b'0'));
        }
    }
    warn!(target: "events.keys", key = %param, "unresolvable key identifier");
    None
}

/// JavaScript `keyCode` table.
fn from_js_keycode(s: &str) -> Option<KeyCode> {
    let code: u32 = s.parse().ok()?;
    Some(match code {
        8 => KeyCode::Backspace,
        9 => KeyCode::Tab,
        13 => KeyCode::Enter,
        // JS does not distinguish left/right modifiers.
        16 => KeyCode::Shift,
        17 => KeyCode::Ctrl,
        18 => KeyCode::Alt,
        27 => KeyCode::Escape,
        32 => KeyCode::Space,
        37 => KeyCode::Left,
        38 => KeyCode::Up,
        39 => KeyCode::Right,
        40 => KeyCode::Down,
        48..=57 => KeyCode::Digit((code - 48) as u8),
        65..=90 => KeyCode::Letter(char::from_u32(code).unwrap()),
        186 => KeyCode::Semicolon,
        187 => KeyCode::Equal,
        188 => KeyCode::Comma,
        189 => KeyCode::Minus,
        190 => KeyCode::Period,
        191 => KeyCode::Slash,
        192 => KeyCode::Grave,
        219 => KeyCode::BracketLeft,
        220 => KeyCode::Backslash,
        221 => KeyCode::BracketRight,
        222 => KeyCode::Apostrophe,
        _ => return None,
    })
}

/// Canonical key names, case-insensitive.
fn from_name(s: &str) -> Option<KeyCode> {
    let lower = s.to_ascii_lowercase();
    Some(match lower.as_str() {
        "backspace" => KeyCode::Backspace,
        "tab" => KeyCode::Tab,
        "enter" | "return" => KeyCode::Enter,
        "shift" => KeyCode::Shift,
        "ctrl" | "control" => KeyCode::Ctrl,
        "alt" => KeyCode::Alt,
        "escape" | "esc" => KeyCode::Escape,
        "space" => KeyCode::Space,
        "left" => KeyCode::Left,
        "up" => KeyCode::Up,
        "right" => KeyCode::Right,
        "down" => KeyCode::Down,
        ";" => KeyCode::Semicolon,
        "=" => KeyCode::Equal,
        "," => KeyCode::Comma,
        "-" => KeyCode::Minus,
        "." => KeyCode::Period,
        "/" => KeyCode::Slash,
        "`" => KeyCode::Grave,
        "[" => KeyCode::BracketLeft,
        "\\" => KeyCode::Backslash,
        "]" => KeyCode::BracketRight,
        "'" => KeyCode::Apostrophe,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_keycodes_resolve_first() {
        assert_eq!(resolve_key_param("37"), Some(KeyCode::Left));
        assert_eq!(resolve_key_param("65"), Some(KeyCode::Letter('A')));
        assert_eq!(resolve_key_param("32"), Some(KeyCode::Space));
        assert_eq!(resolve_key_param("53"), Some(KeyCode::Digit(5)));
        assert_eq!(resolve_key_param("222"), Some(KeyCode::Apostrophe));
    }

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(resolve_key_param("Enter"), Some(KeyCode::Enter));
        assert_eq!(resolve_key_param("SPACE"), Some(KeyCode::Space));
        assert_eq!(resolve_key_param("left"), Some(KeyCode::Left));
    }

    #[test]
    fn single_letters_uppercase() {
        assert_eq!(resolve_key_param("a"), Some(KeyCode::Letter('A')));
        assert_eq!(resolve_key_param("Z"), Some(KeyCode::Letter('Z')));
        assert_eq!(resolve_key_param("7"), Some(KeyCode::Digit(7)));
    }

    #[test]
    fn unknown_keys_do_not_resolve() {
        assert_eq!(resolve_key_param("999"), None);
        assert_eq!(resolve_key_param("nosuchkey"), None);
        assert_eq!(resolve_key_param(""), None);
    }
}

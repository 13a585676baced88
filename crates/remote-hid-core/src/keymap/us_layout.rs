//! Printable character → key stroke table for a US keyboard layout.
//!
//! Every character reachable from the layout resolves to a base key plus a
//! flag saying whether Shift must be held.  The shifted punctuation pairs are:
//!
//! ```text
//! 1 !   2 @   3 #   4 $   5 %   6 ^   7 &   8 *   9 (   0 )
//! - _   = +   [ {   ] }   \ |   ; :   ' "   ` ~   , <   . >   / ?
//! ```
//!
//! Characters outside the layout (accented letters, emoji, control
//! characters other than tab and newline) are unmapped.

use super::hid::HidKeyCode;

/// A key and whether Shift must accompany it to produce a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub key: HidKeyCode,
    pub shift: bool,
}

impl KeyStroke {
    const fn plain(key: HidKeyCode) -> Self {
        Self { key, shift: false }
    }

    const fn shifted(key: HidKeyCode) -> Self {
        Self { key, shift: true }
    }
}

const LETTERS: [HidKeyCode; 26] = [
    HidKeyCode::KeyA, HidKeyCode::KeyB, HidKeyCode::KeyC, HidKeyCode::KeyD,
    HidKeyCode::KeyE, HidKeyCode::KeyF, HidKeyCode::KeyG, HidKeyCode::KeyH,
    HidKeyCode::KeyI, HidKeyCode::KeyJ, HidKeyCode::KeyK, HidKeyCode::KeyL,
    HidKeyCode::KeyM, HidKeyCode::KeyN, HidKeyCode::KeyO, HidKeyCode::KeyP,
    HidKeyCode::KeyQ, HidKeyCode::KeyR, HidKeyCode::KeyS, HidKeyCode::KeyT,
    HidKeyCode::KeyU, HidKeyCode::KeyV, HidKeyCode::KeyW, HidKeyCode::KeyX,
    HidKeyCode::KeyY, HidKeyCode::KeyZ,
];

/// Digit row keys indexed by the digit's value (`0` is last on the row).
const DIGITS: [HidKeyCode; 10] = [
    HidKeyCode::Digit0, HidKeyCode::Digit1, HidKeyCode::Digit2, HidKeyCode::Digit3,
    HidKeyCode::Digit4, HidKeyCode::Digit5, HidKeyCode::Digit6, HidKeyCode::Digit7,
    HidKeyCode::Digit8, HidKeyCode::Digit9,
];

/// Resolves a character to the key stroke that types it.
pub fn char_to_keystroke(c: char) -> Option<KeyStroke> {
    let stroke = match c {
        'a'..='z' => KeyStroke::plain(LETTERS[(c as u8 - b'a') as usize]),
        'A'..='Z' => KeyStroke::shifted(LETTERS[(c as u8 - b'A') as usize]),
        '0'..='9' => KeyStroke::plain(DIGITS[(c as u8 - b'0') as usize]),
        ' ' => KeyStroke::plain(HidKeyCode::Space),
        '\t' => KeyStroke::plain(HidKeyCode::Tab),
        '\n' => KeyStroke::plain(HidKeyCode::Enter),

        '!' => KeyStroke::shifted(HidKeyCode::Digit1),
        '@' => KeyStroke::shifted(HidKeyCode::Digit2),
        '#' => KeyStroke::shifted(HidKeyCode::Digit3),
        '$' => KeyStroke::shifted(HidKeyCode::Digit4),
        '%' => KeyStroke::shifted(HidKeyCode::Digit5),
        '^' => KeyStroke::shifted(HidKeyCode::Digit6),
        '&' => KeyStroke::shifted(HidKeyCode::Digit7),
        '*' => KeyStroke::shifted(HidKeyCode::Digit8),
        '(' => KeyStroke::shifted(HidKeyCode::Digit9),
        ')' => KeyStroke::shifted(HidKeyCode::Digit0),

        '-' => KeyStroke::plain(HidKeyCode::Minus),
        '_' => KeyStroke::shifted(HidKeyCode::Minus),
        '=' => KeyStroke::plain(HidKeyCode::Equal),
        '+' => KeyStroke::shifted(HidKeyCode::Equal),
        '[' => KeyStroke::plain(HidKeyCode::BracketLeft),
        '{' => KeyStroke::shifted(HidKeyCode::BracketLeft),
        ']' => KeyStroke::plain(HidKeyCode::BracketRight),
        '}' => KeyStroke::shifted(HidKeyCode::BracketRight),
        '\\' => KeyStroke::plain(HidKeyCode::Backslash),
        '|' => KeyStroke::shifted(HidKeyCode::Backslash),
        ';' => KeyStroke::plain(HidKeyCode::Semicolon),
        ':' => KeyStroke::shifted(HidKeyCode::Semicolon),
        '\'' => KeyStroke::plain(HidKeyCode::Quote),
        '"' => KeyStroke::shifted(HidKeyCode::Quote),
        '`' => KeyStroke::plain(HidKeyCode::Backquote),
        '~' => KeyStroke::shifted(HidKeyCode::Backquote),
        ',' => KeyStroke::plain(HidKeyCode::Comma),
        '<' => KeyStroke::shifted(HidKeyCode::Comma),
        '.' => KeyStroke::plain(HidKeyCode::Period),
        '>' => KeyStroke::shifted(HidKeyCode::Period),
        '/' => KeyStroke::plain(HidKeyCode::Slash),
        '?' => KeyStroke::shifted(HidKeyCode::Slash),

        _ => return None,
    };
    Some(stroke)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::names::key_by_name;

    const SHIFTED_SYMBOLS: &str = "!@#$%^&*()_+{}|:\"<>?~";

    #[test]
    fn test_every_printable_ascii_except_del_is_mapped() {
        for byte in 0x20u8..0x7F {
            let c = byte as char;
            assert!(char_to_keystroke(c).is_some(), "{c:?} should be mapped");
        }
    }

    #[test]
    fn test_shift_required_iff_uppercase_or_shifted_symbol() {
        for byte in 0x20u8..0x7F {
            // Arrange
            let c = byte as char;
            let expected = c.is_ascii_uppercase() || SHIFTED_SYMBOLS.contains(c);

            // Act
            let stroke = char_to_keystroke(c).unwrap();

            // Assert
            assert_eq!(stroke.shift, expected, "shift flag for {c:?}");
        }
    }

    #[test]
    fn test_unshifted_characters_agree_with_named_keys() {
        for byte in 0x20u8..0x7F {
            let c = byte as char;
            let stroke = char_to_keystroke(c).unwrap();
            if stroke.shift {
                continue;
            }
            let named = key_by_name(&c.to_string());
            assert_eq!(named, Some(stroke.key), "{c:?} disagrees with the name table");
        }
    }

    #[test]
    fn test_letters_share_key_across_case() {
        for (lower, upper) in ('a'..='z').zip('A'..='Z') {
            assert_eq!(
                char_to_keystroke(lower).unwrap().key,
                char_to_keystroke(upper).unwrap().key
            );
        }
    }

    #[test]
    fn test_shifted_punctuation_uses_base_key_of_its_pair() {
        let pairs = "1!2@3#4$5%6^7&8*9(0)-_=+[{]}\\|;:'\"`~,<.>/?";
        let chars: Vec<char> = pairs.chars().collect();
        for pair in chars.chunks(2) {
            let base = char_to_keystroke(pair[0]).unwrap();
            let shifted = char_to_keystroke(pair[1]).unwrap();
            assert_eq!(base.key, shifted.key, "{:?} / {:?}", pair[0], pair[1]);
            assert!(!base.shift);
            assert!(shifted.shift);
        }
    }

    #[test]
    fn test_whitespace_uses_dedicated_keys() {
        assert_eq!(char_to_keystroke(' ').unwrap().key, HidKeyCode::Space);
        assert_eq!(char_to_keystroke('\t').unwrap().key, HidKeyCode::Tab);
        assert_eq!(char_to_keystroke('\n').unwrap().key, HidKeyCode::Enter);
    }

    #[test]
    fn test_characters_outside_layout_are_unmapped() {
        for c in ['é', 'ß', '€', '\r', '\u{7F}', '\u{0}', '😀'] {
            assert_eq!(char_to_keystroke(c), None, "{c:?}");
        }
    }
}

//! USB HID Usage IDs (page 0x07, Keyboard/Keypad page) and the keyboard
//! report modifier byte.
//!
//! Reference: USB HID Usage Tables 1.3, Section 10 (Keyboard/Keypad page 0x07).
//!
//! # Scancodes vs. characters
//!
//! A HID Usage ID names a **physical key position**, not a character.  The
//! letter `a` and the letter `A` share the same usage (0x04); the host decides
//! which character to produce from the modifier byte sent alongside it.  This
//! is why the US-layout character table in [`super::us_layout`] returns a
//! `(key, shift)` pair rather than a single code.
//!
//! # Modifier keys
//!
//! The eight modifier keys (0xE0–0xE7) have usage IDs like every other key,
//! but a boot-compatible keyboard report never puts them in the key array.
//! Instead each one owns a bit of the first report byte, in usage order:
//! bit 0 = Left Ctrl (0xE0) … bit 7 = Right GUI (0xE7).
//! [`HidKeyCode::modifier_bit`] performs that mapping.

use serde::{Deserialize, Serialize};

/// USB HID Usage ID for keyboard keys (page 0x07).
///
/// The numeric value of each variant is its usage ID on the keyboard/keypad
/// page; every value fits in the single key byte of a keyboard report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HidKeyCode {
    // Letters (0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digit row (0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Editing and whitespace
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,

    // Punctuation (0x32, Non-US `#`, is not present on US layouts)
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,

    CapsLock = 0x39,

    // Function keys (0x3A–0x45)
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Navigation cluster (0x46–0x52)
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    ArrowRight = 0x4F,
    ArrowLeft = 0x50,
    ArrowDown = 0x51,
    ArrowUp = 0x52,

    // Modifiers (0xE0–0xE7)
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    MetaLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    MetaRight = 0xE7,
}

impl HidKeyCode {
    /// Returns the raw usage ID, i.e. the byte placed in a keyboard report.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` for the eight modifier keys (0xE0–0xE7).
    pub fn is_modifier(self) -> bool {
        self.modifier_bit().is_some()
    }

    /// Returns the modifier-byte bit owned by this key, or `None` for
    /// ordinary keys.
    pub fn modifier_bit(self) -> Option<Modifiers> {
        let code = self.as_u8();
        if (0xE0..=0xE7).contains(&code) {
            Some(Modifiers::from_bits(1 << (code - 0xE0)))
        } else {
            None
        }
    }
}

/// The modifier byte of a keyboard report.
///
/// Bit layout follows the modifier usages 0xE0..=0xE7 in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0x00);
    pub const LEFT_CTRL: Modifiers = Modifiers(0x01);
    pub const LEFT_SHIFT: Modifiers = Modifiers(0x02);
    pub const LEFT_ALT: Modifiers = Modifiers(0x04);
    pub const LEFT_GUI: Modifiers = Modifiers(0x08);
    pub const RIGHT_CTRL: Modifiers = Modifiers(0x10);
    pub const RIGHT_SHIFT: Modifiers = Modifiers(0x20);
    pub const RIGHT_ALT: Modifiers = Modifiers(0x40);
    pub const RIGHT_GUI: Modifiers = Modifiers(0x80);

    pub const fn from_bits(bits: u8) -> Self {
        Modifiers(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns a copy with the bits of `other` set (`held == true`) or
    /// cleared (`held == false`).
    #[must_use]
    pub const fn with(self, other: Modifiers, held: bool) -> Self {
        if held {
            Modifiers(self.0 | other.0)
        } else {
            Modifiers(self.0 & !other.0)
        }
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

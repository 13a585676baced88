//! Keyboard LED state decoded from the host's output report.

use serde::{Deserialize, Serialize};

/// Keyboard LED state written by the host via the keyboard output report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardLeds {
    pub num_lock: bool,
    pub caps_lock: bool,
    pub scroll_lock: bool,
    pub compose: bool,
    pub kana: bool,
}

impl KeyboardLeds {
    /// Decodes the LED output byte.  The three padding bits are ignored.
    pub fn from_byte(byte: u8) -> Self {
        Self {
            num_lock: byte & 0x01 != 0,
            caps_lock: byte & 0x02 != 0,
            scroll_lock: byte & 0x04 != 0,
            compose: byte & 0x08 != 0,
            kana: byte & 0x10 != 0,
        }
    }

    pub fn to_byte(self) -> u8 {
        u8::from(self.num_lock)
            | u8::from(self.caps_lock) << 1
            | u8::from(self.scroll_lock) << 2
            | u8::from(self.compose) << 3
            | u8::from(self.kana) << 4
    }
}

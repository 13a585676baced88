//! HID reports exchanged with the host.
//!
//! The emulated device multiplexes three logical sub-devices over one HID
//! interface, told apart by the Report ID that precedes every report on the
//! wire:
//!
//! | Report ID | Sub-device        | Payload                                    |
//! |-----------|-------------------|--------------------------------------------|
//! | 1         | Mouse             | `[buttons][dx][dy][wheel][pan]` (5 bytes)  |
//! | 2         | Keyboard          | `[modifiers][reserved][key1..key6]` (8)    |
//! | 3         | Consumer control  | 16-bit little-endian usage (2 bytes)       |
//!
//! Each shape has a fixed length; the transport prefixes the Report ID, so
//! the byte arrays produced here never include it.

pub mod descriptor;
pub mod encoder;
pub mod leds;

use serde::{Deserialize, Serialize};

use crate::keymap::{HidKeyCode, Modifiers};

pub use leds::KeyboardLeds;

/// Report ID of each logical sub-device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ReportId {
    Mouse = 1,
    Keyboard = 2,
    Consumer = 3,
}

impl ReportId {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(ReportId::Mouse),
            2 => Some(ReportId::Keyboard),
            3 => Some(ReportId::Consumer),
            _ => None,
        }
    }

    /// Payload length of reports on this channel, excluding the ID byte.
    pub fn payload_len(self) -> usize {
        match self {
            ReportId::Mouse => MouseReport::LEN,
            ReportId::Keyboard => KeyboardReport::LEN,
            ReportId::Consumer => ConsumerReport::LEN,
        }
    }
}

/// Mouse buttons the descriptor declares (five 1-bit flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
}

impl MouseButton {
    /// Maps the command-surface button index (0 = left, 1 = right, …).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(MouseButton::Left),
            1 => Some(MouseButton::Right),
            2 => Some(MouseButton::Middle),
            3 => Some(MouseButton::Back),
            4 => Some(MouseButton::Forward),
            _ => None,
        }
    }

    /// The bit this button owns in the report's button byte.
    pub fn mask(self) -> MouseButtons {
        MouseButtons(match self {
            MouseButton::Left => 0x01,
            MouseButton::Right => 0x02,
            MouseButton::Middle => 0x04,
            MouseButton::Back => 0x08,
            MouseButton::Forward => 0x10,
        })
    }
}

/// Button byte of a mouse report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButtons(u8);

impl MouseButtons {
    pub const NONE: MouseButtons = MouseButtons(0);

    pub const fn from_bits(bits: u8) -> Self {
        MouseButtons(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns a copy with `button` pressed or released.
    #[must_use]
    pub fn with(self, button: MouseButton, down: bool) -> Self {
        let bit = button.mask().0;
        if down {
            MouseButtons(self.0 | bit)
        } else {
            MouseButtons(self.0 & !bit)
        }
    }

    pub fn is_down(self, button: MouseButton) -> bool {
        self.0 & button.mask().0 != 0
    }
}

/// Mouse report (ID 1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseReport {
    pub buttons: MouseButtons,
    pub x: i8,
    pub y: i8,
    pub wheel: i8,
    pub pan: i8,
}

impl MouseReport {
    pub const LEN: usize = 5;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        [
            self.buttons.bits(),
            self.x as u8,
            self.y as u8,
            self.wheel as u8,
            self.pan as u8,
        ]
    }
}

/// Keyboard report (ID 2).
///
/// Only the first key slot is ever populated: the remote presses at most one
/// non-modifier key at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardReport {
    pub modifiers: Modifiers,
    pub key: Option<HidKeyCode>,
}

impl KeyboardReport {
    pub const LEN: usize = 8;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let key = self.key.map_or(0, HidKeyCode::as_u8);
        [self.modifiers.bits(), 0x00, key, 0x00, 0x00, 0x00, 0x00, 0x00]
    }

    /// `true` when no key and no modifier is down.
    pub fn is_release(&self) -> bool {
        self.key.is_none() && self.modifiers.is_empty()
    }
}

/// Consumer-control report (ID 3).  A zero usage releases the media key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerReport {
    pub usage: u16,
}

impl ConsumerReport {
    pub const LEN: usize = 2;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        self.usage.to_le_bytes()
    }
}

/// A report of any shape, tagged with its channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Mouse(MouseReport),
    Keyboard(KeyboardReport),
    Consumer(ConsumerReport),
}

impl Report {
    pub fn id(&self) -> ReportId {
        match self {
            Report::Mouse(_) => ReportId::Mouse,
            Report::Keyboard(_) => ReportId::Keyboard,
            Report::Consumer(_) => ReportId::Consumer,
        }
    }

    /// Serializes the payload (without the Report ID byte).
    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            Report::Mouse(r) => r.to_bytes().to_vec(),
            Report::Keyboard(r) => r.to_bytes().to_vec(),
            Report::Consumer(r) => r.to_bytes().to_vec(),
        }
    }
}

impl From<MouseReport> for Report {
    fn from(r: MouseReport) -> Self {
        Report::Mouse(r)
    }
}

impl From<KeyboardReport> for Report {
    fn from(r: KeyboardReport) -> Self {
        Report::Keyboard(r)
    }
}

impl From<ConsumerReport> for Report {
    fn from(r: ConsumerReport) -> Self {
        Report::Consumer(r)
    }
}

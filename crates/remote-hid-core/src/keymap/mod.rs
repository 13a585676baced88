//! Key translation tables.
//!
//! The remote receives keys in three shapes and this module turns each into
//! something a HID report can carry:
//!
//! - a **symbolic key name** (`"enter"`, `"f5"`, `"lctrl"`) → keyboard usage,
//! - a **media key name** (`"volume_up"`) → consumer-page usage,
//! - a **character** of typed text (`'H'`, `'!'`) → key + Shift flag.
//!
//! All tables are immutable and lookups never allocate.

pub mod consumer;
pub mod hid;
pub mod names;
pub mod us_layout;

pub use consumer::ConsumerUsage;
pub use hid::{HidKeyCode, Modifiers};
pub use us_layout::KeyStroke;

/// Result of resolving a key name that may name either kind of key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedKey {
    /// Sent on the consumer-control report.
    Media(ConsumerUsage),
    /// Sent on the keyboard report.
    Keyboard(HidKeyCode),
}

/// Unified entry point over the translation tables.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a symbolic key name to its keyboard usage.
    ///
    /// Returns `None` if the name is not mapped.
    pub fn scancode(name: &str) -> Option<HidKeyCode> {
        names::key_by_name(name)
    }

    /// Translates a media-key name to its consumer usage.
    ///
    /// Returns `None` if the name is not a media key.
    pub fn media_usage(name: &str) -> Option<ConsumerUsage> {
        ConsumerUsage::from_name(name)
    }

    /// Translates a typed character to the key stroke that produces it on a
    /// US layout.
    pub fn for_char(c: char) -> Option<KeyStroke> {
        us_layout::char_to_keystroke(c)
    }

    /// Resolves a key name, consulting the media table before the keyboard
    /// table.
    pub fn resolve(name: &str) -> Option<ResolvedKey> {
        if let Some(usage) = Self::media_usage(name) {
            return Some(ResolvedKey::Media(usage));
        }
        Self::scancode(name).map(ResolvedKey::Keyboard)
    }
}

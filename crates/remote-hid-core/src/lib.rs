//! # remote-hid-core
//!
//! Pure building blocks for a Bluetooth HID remote that presents itself to a
//! host as a combined mouse, keyboard and media-key device.
//!
//! Nothing in this crate touches a radio, a clock or a thread.  Every
//! function maps inputs to bytes, so the whole crate can be tested on any
//! machine without hardware.
//!
//! # Layout
//!
//! - **`keymap`** – Translation tables: key names to keyboard usages, media
//!   names to consumer usages, and typed characters to key + Shift on a US
//!   layout.
//!
//! - **`report`** – The three report shapes (mouse, keyboard, consumer),
//!   the encoder that fills them from input events, the report descriptor the
//!   host uses to parse them, and keyboard LED decoding.
//!
//! - **`domain`** – Multi-report plans, currently text typing.
//!
//! The `remote-hid` crate layers session state, pacing and a transport port
//! on top of these.

pub mod domain;
pub mod keymap;
pub mod report;

pub use domain::typing::{plan_text, KeyStep, TextPlan};
pub use keymap::{ConsumerUsage, HidKeyCode, KeyMapper, KeyStroke, Modifiers, ResolvedKey};
pub use report::descriptor::{DescriptorError, COMBO_DESCRIPTOR};
pub use report::{
    ConsumerReport, KeyboardLeds, KeyboardReport, MouseButton, MouseButtons, MouseReport, Report,
    ReportId,
};

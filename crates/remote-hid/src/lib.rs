//! remote-hid library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does remote-hid do? (for beginners)
//!
//! It makes this machine look like a Bluetooth mouse + keyboard + media
//! remote to another computer (the *host*).  Once the host is paired, the
//! controlling application sends high-level commands ("move 10, -4",
//! "press enter", "type hello") and the remote turns them into HID input
//! reports:
//!
//! 1. Registers a combo HID application (with its report descriptor) with
//!    the Bluetooth stack.
//! 2. Connects to a paired host, or accepts the host's connection.
//! 3. Encodes each command into mouse (ID 1), keyboard (ID 2) or consumer
//!    control (ID 3) reports and hands them to the stack, with press/release
//!    timing for clicks, key taps and typed text.
//! 4. Tracks the keyboard LEDs the host writes back (Caps Lock etc.).

/// Application layer: session state machine, sequencer, dispatcher.
pub mod application;

/// Infrastructure layer: transports, config, command bridge.
pub mod infrastructure;

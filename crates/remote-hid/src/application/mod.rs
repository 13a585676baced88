//! Application layer use cases for the remote.
//!
//! # What lives here? (for beginners)
//!
//! - **`transport`** – The [`HidTransport`](transport::HidTransport) port.
//!   Everything the session needs from a Bluetooth HID device stack is a
//!   method on this trait, so the rest of the layer is testable with a mock.
//!
//! - **`session`** – The registration/connection state machine, the held
//!   button and modifier masks, and the send lane that serializes reports.
//!
//! - **`sequencer`** – A worker task that runs report sequences with delays
//!   between them (clicks, key taps, typed text) without blocking callers.
//!
//! - **`dispatch_input`** – The command surface: validates arguments and
//!   turns each remote command into reports or a queued sequence.

pub mod dispatch_input;
pub mod sequencer;
pub mod session;
pub mod transport;

//! Infrastructure layer for the remote.
//!
//! Contains the adapters around the application layer: transport
//! implementations, the config file, and the JSON command bridge.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `remote_hid_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`transport`** – `HidTransport` implementations.  `SimulatedTransport`
//!   records reports in memory and plays the stack's side of the connection
//!   lifecycle.
//!
//! - **`storage`** – TOML configuration: device strings, sequence timings and
//!   log level.
//!
//! - **`command_bridge`** – Parses JSON commands, runs them on the
//!   `InputDispatcher` and renders the `CommandResult` envelope.

pub mod command_bridge;
pub mod storage;
pub mod transport;

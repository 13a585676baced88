//! Implementations of the [`HidTransport`](crate::application::transport::HidTransport) port.
//!
//! Only the in-memory [`simulated::SimulatedTransport`] ships with this
//! crate.  A platform Bluetooth stack adapter plugs in at the same seam.

pub mod simulated;

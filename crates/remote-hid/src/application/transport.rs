//! Transport port: the seam between the session and the Bluetooth HID
//! profile stack.
//!
//! The application layer only ever talks to [`HidTransport`].  The real
//! stack lives outside this crate; the infrastructure layer provides a
//! simulated implementation, and unit tests use the generated
//! `MockHidTransport`.
//!
//! Lifecycle callbacks from the stack (link state, app status, report
//! requests) do not go through the trait.  An implementation hands them out
//! as [`TransportEvent`]s on an `mpsc` channel, which an event pump feeds
//! into the session.

use async_trait::async_trait;
use remote_hid_core::{ReportId, COMBO_DESCRIPTOR};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a transport implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No adapter or HID profile proxy is reachable.
    #[error("HID transport unavailable")]
    Unavailable,

    /// The adapter exists but is switched off.
    #[error("adapter is disabled")]
    Disabled,

    /// The process lacks the capability to use the adapter.
    #[error("permission denied by the transport")]
    PermissionDenied,

    /// The stack reported a failure for the requested operation.
    #[error("transport failure: {0}")]
    Failed(String),
}

/// Adapter availability as seen by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdapterStatus {
    Ready,
    Disabled,
    Unavailable,
}

/// A resolved remote host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDevice {
    /// Canonical upper-case `XX:XX:XX:XX:XX:XX` address.
    pub address: String,
    pub name: Option<String>,
}

impl HostDevice {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into().to_ascii_uppercase(),
            name: None,
        }
    }

    /// Returns `true` if both refer to the same address, ignoring case.
    pub fn same_address(&self, other: &HostDevice) -> bool {
        self.address.eq_ignore_ascii_case(&other.address)
    }
}

/// An entry of the adapter's bonded-device list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairedHost {
    pub display_name: String,
    pub host_id: String,
}

impl PairedHost {
    /// Builds the record; a missing or blank name shows as `"Unknown"`.
    pub fn new(name: Option<&str>, address: impl Into<String>) -> Self {
        let display_name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => "Unknown".to_string(),
        };
        Self {
            display_name,
            host_id: address.into(),
        }
    }
}

/// Device subclass advertised with the SDP record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DeviceSubclass {
    Keyboard = 0x40,
    Mouse = 0x80,
    Combo = 0xC0,
}

/// Everything the stack needs to register the HID application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRegistration {
    pub name: String,
    pub description: String,
    pub provider: String,
    pub subclass: DeviceSubclass,
    pub descriptor: &'static [u8],
}

impl Default for AppRegistration {
    fn default() -> Self {
        Self {
            name: "PC Remote Controller".to_string(),
            description: "Remote control for PC".to_string(),
            provider: "YourCompany".to_string(),
            subclass: DeviceSubclass::Combo,
            descriptor: COMBO_DESCRIPTOR,
        }
    }
}

/// Link state reported by the stack for a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// HID report type carried by GET_REPORT / SET_REPORT requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportType {
    Input,
    Output,
    Feature,
}

/// Asynchronous callbacks from the profile stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    AppStatusChanged {
        registered: bool,
    },
    ConnectionStateChanged {
        host: HostDevice,
        state: LinkState,
    },
    VirtualCableUnplug {
        host: HostDevice,
    },
    GetReport {
        host: HostDevice,
        report_type: ReportType,
        report_id: u8,
        buffer_size: u16,
    },
    SetReport {
        host: HostDevice,
        report_type: ReportType,
        report_id: u8,
        data: Vec<u8>,
    },
    SetProtocol {
        host: HostDevice,
        protocol: u8,
    },
    InterruptData {
        host: HostDevice,
        report_id: u8,
        data: Vec<u8>,
    },
}

/// Port over the Bluetooth HID device profile.
///
/// Boolean results mirror the stack's "request accepted" flag: `Ok(false)`
/// means the stack declined without raising an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HidTransport: Send + Sync {
    fn adapter_status(&self) -> AdapterStatus;

    fn has_permission(&self) -> bool;

    async fn register_app(&self, registration: &AppRegistration) -> Result<bool, TransportError>;

    async fn unregister_app(&self) -> Result<(), TransportError>;

    /// Looks up a host by address.  Returns `None` if the stack cannot
    /// produce a device for it.
    fn resolve_host(&self, address: &str) -> Option<HostDevice>;

    async fn connect(&self, host: &HostDevice) -> Result<bool, TransportError>;

    async fn disconnect(&self, host: &HostDevice) -> Result<(), TransportError>;

    /// Sends one report payload (without the ID byte) on `report_id`.
    async fn send_report(
        &self,
        host: &HostDevice,
        report_id: ReportId,
        payload: &[u8],
    ) -> Result<bool, TransportError>;

    async fn bonded_hosts(&self) -> Result<Vec<PairedHost>, TransportError>;
}

/// Checks the `XX:XX:XX:XX:XX:XX` hex address format (any case).
pub fn is_bluetooth_address(address: &str) -> bool {
    let bytes = address.as_bytes();
    bytes.len() == 17
        && bytes.iter().enumerate().all(|(i, b)| {
            if i % 3 == 2 {
                *b == b':'
            } else {
                b.is_ascii_hexdigit()
            }
        })
}

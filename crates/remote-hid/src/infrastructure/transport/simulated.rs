//! In-memory HID transport.
//!
//! `SimulatedTransport` stands in for a Bluetooth HID device stack.  It
//! accepts every request, records each report in a `Mutex<Vec<...>>` so
//! callers can inspect exactly what was sent and in what order, and plays
//! the stack's part in the connection lifecycle by emitting
//! [`TransportEvent`]s on the channel returned from [`SimulatedTransport::new`].
//!
//! # Failure injection
//!
//! - `set_should_fail(true)` makes every fallible call return
//!   `TransportError::Failed`.
//! - `set_decline_reports(true)` makes `send_report` return `Ok(false)`.
//! - `set_adapter_status` / `set_permission` change what the environment
//!   checks see.
//! - `inject` delivers any event as if the host had triggered it.
//!
//! With `auto_confirm` on (the default) a successful `connect` is followed by
//! a `Connected` event and `disconnect` by a `Disconnected` event, the way a
//! real stack reports link changes.  App-status events are only sent through
//! `inject`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use remote_hid_core::ReportId;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::application::transport::{
    AdapterStatus, AppRegistration, HidTransport, HostDevice, LinkState, PairedHost,
    TransportError, TransportEvent,
};

const EVENT_CAPACITY: usize = 64;

/// One report as it left the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReport {
    pub host: String,
    pub report_id: ReportId,
    pub bytes: Vec<u8>,
}

pub struct SimulatedTransport {
    events: mpsc::Sender<TransportEvent>,
    sent: Mutex<Vec<SentReport>>,
    registration: Mutex<Option<AppRegistration>>,
    bonded: Mutex<Vec<PairedHost>>,
    adapter: Mutex<AdapterStatus>,
    permission: AtomicBool,
    should_fail: AtomicBool,
    decline_reports: AtomicBool,
    auto_confirm: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl SimulatedTransport {
    /// Creates a ready transport with no bonded hosts, plus the receiving end
    /// of its event channel.
    pub fn new() -> (Self, mpsc::Receiver<TransportEvent>) {
        let (events, rx) = mpsc::channel(EVENT_CAPACITY);
        let transport = Self {
            events,
            sent: Mutex::default(),
            registration: Mutex::default(),
            bonded: Mutex::default(),
            adapter: Mutex::new(AdapterStatus::Ready),
            permission: AtomicBool::new(true),
            should_fail: AtomicBool::new(false),
            decline_reports: AtomicBool::new(false),
            auto_confirm: AtomicBool::new(true),
        };
        (transport, rx)
    }

    /// Adds a host to the bonded list.
    pub fn with_bonded(self, name: Option<&str>, address: &str) -> Self {
        lock(&self.bonded).push(PairedHost::new(name, address.to_ascii_uppercase()));
        self
    }

    pub fn set_adapter_status(&self, status: AdapterStatus) {
        *lock(&self.adapter) = status;
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_decline_reports(&self, decline: bool) {
        self.decline_reports.store(decline, Ordering::SeqCst);
    }

    pub fn set_auto_confirm(&self, confirm: bool) {
        self.auto_confirm.store(confirm, Ordering::SeqCst);
    }

    /// Delivers `event` as if it came from the stack.
    pub async fn inject(&self, event: TransportEvent) {
        if self.events.send(event).await.is_err() {
            warn!("simulated transport: event receiver dropped");
        }
    }

    /// Every report sent so far, in order.
    pub fn sent_reports(&self) -> Vec<SentReport> {
        lock(&self.sent).clone()
    }

    pub fn clear_sent(&self) {
        lock(&self.sent).clear();
    }

    /// The registration currently held by the stack, if any.
    pub fn registration(&self) -> Option<AppRegistration> {
        lock(&self.registration).clone()
    }

    fn check_failure(&self, op: &str) -> Result<(), TransportError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(TransportError::Failed(format!("simulated {op} failure")));
        }
        Ok(())
    }

    async fn confirm(&self, host: &HostDevice, state: LinkState) {
        if self.auto_confirm.load(Ordering::SeqCst) {
            self.inject(TransportEvent::ConnectionStateChanged {
                host: host.clone(),
                state,
            })
            .await;
        }
    }
}

#[async_trait]
impl HidTransport for SimulatedTransport {
    fn adapter_status(&self) -> AdapterStatus {
        *lock(&self.adapter)
    }

    fn has_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    async fn register_app(&self, registration: &AppRegistration) -> Result<bool, TransportError> {
        self.check_failure("register")?;
        debug!(name = %registration.name, len = registration.descriptor.len(), "simulated register_app");
        *lock(&self.registration) = Some(registration.clone());
        Ok(true)
    }

    async fn unregister_app(&self) -> Result<(), TransportError> {
        self.check_failure("unregister")?;
        lock(&self.registration).take();
        Ok(())
    }

    fn resolve_host(&self, address: &str) -> Option<HostDevice> {
        let mut host = HostDevice::new(address);
        host.name = lock(&self.bonded)
            .iter()
            .find(|h| h.host_id.eq_ignore_ascii_case(address))
            .map(|h| h.display_name.clone());
        Some(host)
    }

    async fn connect(&self, host: &HostDevice) -> Result<bool, TransportError> {
        self.check_failure("connect")?;
        debug!(host = %host.address, "simulated connect");
        self.confirm(host, LinkState::Connected).await;
        Ok(true)
    }

    async fn disconnect(&self, host: &HostDevice) -> Result<(), TransportError> {
        self.check_failure("disconnect")?;
        debug!(host = %host.address, "simulated disconnect");
        self.confirm(host, LinkState::Disconnected).await;
        Ok(())
    }

    async fn send_report(
        &self,
        host: &HostDevice,
        report_id: ReportId,
        payload: &[u8],
    ) -> Result<bool, TransportError> {
        self.check_failure("send")?;
        if self.decline_reports.load(Ordering::SeqCst) {
            return Ok(false);
        }
        lock(&self.sent).push(SentReport {
            host: host.address.clone(),
            report_id,
            bytes: payload.to_vec(),
        });
        Ok(true)
    }

    async fn bonded_hosts(&self) -> Result<Vec<PairedHost>, TransportError> {
        self.check_failure("bonded list")?;
        Ok(lock(&self.bonded).clone())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

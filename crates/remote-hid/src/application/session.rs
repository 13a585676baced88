//! HID session: registration and connection lifecycle plus held input state.
//!
//! `HidSession` is the only stateful component.  It owns:
//!
//! - the lifecycle phase (see [`SessionState`]),
//! - the host the link belongs to,
//! - the held mouse-button and modifier masks,
//! - the keyboard LED state last written by the host.
//!
//! # Locking
//!
//! Mutable state lives behind one `std::sync::Mutex` that is never held
//! across an `.await`.  Caller operations and transport events both go
//! through it, so a send always observes `Connected` and its host as one
//! consistent snapshot.
//!
//! A separate async *send lane* (`tokio::sync::Mutex<()>`) serialises report
//! delivery.  Single sends take it for one report; the sequencer takes it for
//! a whole press/delay/release run so nothing interleaves with it.  Holding
//! the lane is proven to [`HidSession::send`] by passing a [`SendLane`].
//!
//! `register` and `unregister` hold a third async lock for their whole
//! run, so an unregister issued while registration is still waiting on the
//! stack tears down the finished registration instead of racing it.
//!
//! # Lifecycle
//!
//! ```text
//! Unregistered ─register─▶ Registering ─▶ Registered ─connect─▶ Connecting
//!      ▲                                     ▲   ▲                  │
//!      │                                     │   │ Disconnected     ▼ Connected
//!      └──── Unregistering ◀─unregister──────┘   └── Disconnecting ◀─ Connected
//! ```
//!
//! Every phase change is published as a [`SessionNotification`] on the
//! channel returned by [`HidSession::new`].

use std::sync::{Arc, Mutex, MutexGuard};

use remote_hid_core::report::descriptor::report_ids;
use remote_hid_core::{KeyboardLeds, Modifiers, MouseButtons, Report, ReportId};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::transport::{
    is_bluetooth_address, AdapterStatus, AppRegistration, HidTransport, HostDevice, LinkState,
    ReportType, TransportError, TransportEvent,
};

const NOTIFICATION_CAPACITY: usize = 64;

/// Errors returned by session operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no HID transport is reachable")]
    TransportUnavailable,

    #[error("adapter is disabled")]
    TransportDisabled,

    #[error("permission to use the adapter is missing")]
    PermissionDenied,

    #[error("registration failed: {0}")]
    RegistrationFailed(String),

    #[error("HID application is already registered")]
    AlreadyRegistered,

    #[error("HID application is not registered or a link is already active")]
    NotRegistered,

    #[error("invalid host id: {0:?}")]
    InvalidHost(String),

    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("no host is connected")]
    NotConnected,

    #[error("report send failed: {0}")]
    SendFailed(String),
}

impl SessionError {
    /// Stable code surfaced on the command boundary.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::TransportUnavailable => "NO_TRANSPORT",
            SessionError::TransportDisabled => "TRANSPORT_DISABLED",
            SessionError::PermissionDenied => "PERMISSION_DENIED",
            SessionError::RegistrationFailed(_) => "REGISTRATION_FAILED",
            SessionError::AlreadyRegistered => "ALREADY_REGISTERED",
            SessionError::NotRegistered => "NOT_REGISTERED",
            SessionError::InvalidHost(_) => "INVALID_HOST",
            SessionError::ConnectFailed(_) => "CONNECT_FAILED",
            SessionError::NotConnected => "NOT_CONNECTED",
            SessionError::SendFailed(_) => "SEND_FAILED",
        }
    }
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Unregistered,
    Registering,
    /// Registered with no link.
    Registered,
    Connecting,
    Connected,
    Disconnecting,
    Unregistering,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Unregistered => "unregistered",
            SessionState::Registering => "registering",
            SessionState::Registered => "registered",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Disconnecting => "disconnecting",
            SessionState::Unregistering => "unregistering",
        }
    }
}

/// Internal phase.  The link phases carry their host so the host can only
/// exist while a link does.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Unregistered,
    Registering,
    Registered,
    Connecting(HostDevice),
    Connected(HostDevice),
    Disconnecting(HostDevice),
    Unregistering,
}

impl Phase {
    fn state(&self) -> SessionState {
        match self {
            Phase::Unregistered => SessionState::Unregistered,
            Phase::Registering => SessionState::Registering,
            Phase::Registered => SessionState::Registered,
            Phase::Connecting(_) => SessionState::Connecting,
            Phase::Connected(_) => SessionState::Connected,
            Phase::Disconnecting(_) => SessionState::Disconnecting,
            Phase::Unregistering => SessionState::Unregistering,
        }
    }

    fn link_host(&self) -> Option<&HostDevice> {
        match self {
            Phase::Connecting(h) | Phase::Connected(h) | Phase::Disconnecting(h) => Some(h),
            _ => None,
        }
    }
}

/// Buttons and modifiers held down across reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldInput {
    pub buttons: MouseButtons,
    pub modifiers: Modifiers,
}

/// Events published to the session owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SessionNotification {
    StateChanged {
        state: SessionState,
        #[serde(skip_serializing_if = "Option::is_none")]
        host: Option<String>,
    },
    LedsChanged {
        leds: KeyboardLeds,
    },
    VirtualCableUnplugged {
        host: String,
    },
}

struct SessionInner {
    phase: Phase,
    held: HeldInput,
    leds: KeyboardLeds,
}

/// Proof that the caller holds the send lane.
pub struct SendLane<'a> {
    _guard: tokio::sync::MutexGuard<'a, ()>,
}

/// One emulated HID application and its link to a host.
pub struct HidSession {
    id: Uuid,
    transport: Arc<dyn HidTransport>,
    registration: AppRegistration,
    inner: Mutex<SessionInner>,
    lane: tokio::sync::Mutex<()>,
    lifecycle: tokio::sync::Mutex<()>,
    notifications: mpsc::Sender<SessionNotification>,
}

impl HidSession {
    /// Creates an unregistered session and the receiver for its
    /// notifications.
    pub fn new(
        transport: Arc<dyn HidTransport>,
        registration: AppRegistration,
    ) -> (Self, mpsc::Receiver<SessionNotification>) {
        let (tx, rx) = mpsc::channel(NOTIFICATION_CAPACITY);
        let session = Self {
            id: Uuid::new_v4(),
            transport,
            registration,
            inner: Mutex::new(SessionInner {
                phase: Phase::Unregistered,
                held: HeldInput::default(),
                leds: KeyboardLeds::default(),
            }),
            lane: tokio::sync::Mutex::new(()),
            lifecycle: tokio::sync::Mutex::new(()),
            notifications: tx,
        };
        (session, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transport(&self) -> &Arc<dyn HidTransport> {
        &self.transport
    }

    pub fn state(&self) -> SessionState {
        self.lock().phase.state()
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.lock().phase, Phase::Connected(_))
    }

    /// The connected host, `None` in every other state.
    pub fn paired_host(&self) -> Option<HostDevice> {
        match &self.lock().phase {
            Phase::Connected(host) => Some(host.clone()),
            _ => None,
        }
    }

    pub fn held(&self) -> HeldInput {
        self.lock().held
    }

    pub fn keyboard_leds(&self) -> KeyboardLeds {
        self.lock().leds
    }

    /// Maps the adapter status to the environment errors.
    pub fn check_adapter(&self) -> Result<(), SessionError> {
        match self.transport.adapter_status() {
            AdapterStatus::Ready => Ok(()),
            AdapterStatus::Disabled => Err(SessionError::TransportDisabled),
            AdapterStatus::Unavailable => Err(SessionError::TransportUnavailable),
        }
    }

    pub fn ensure_connected(&self) -> Result<(), SessionError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(SessionError::NotConnected)
        }
    }

    // ── Registration ──────────────────────────────────────────────────────────

    /// Registers the HID application with the stack.
    ///
    /// # Errors
    ///
    /// [`SessionError::AlreadyRegistered`] unless currently unregistered;
    /// the environment, permission and rejection errors otherwise.  On error
    /// the session is back in `Unregistered`.
    pub async fn register(&self) -> Result<(), SessionError> {
        let _lifecycle = self.lifecycle.lock().await;
        {
            let mut inner = self.lock();
            if inner.phase != Phase::Unregistered {
                return Err(SessionError::AlreadyRegistered);
            }
            self.transition(&mut inner, Phase::Registering);
        }

        let result = self.register_with_transport().await;

        let mut inner = self.lock();
        match &result {
            Ok(()) => {
                if inner.phase == Phase::Registering {
                    self.transition(&mut inner, Phase::Registered);
                }
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "registration failed");
                if inner.phase == Phase::Registering {
                    self.transition(&mut inner, Phase::Unregistered);
                }
            }
        }
        result
    }

    async fn register_with_transport(&self) -> Result<(), SessionError> {
        self.check_adapter()?;
        if !self.transport.has_permission() {
            return Err(SessionError::PermissionDenied);
        }

        // A previous process may have left its application registered.
        if let Err(e) = self.transport.unregister_app().await {
            debug!(session = %self.id, error = %e, "no stale registration cleared");
        }

        match report_ids(self.registration.descriptor) {
            Ok(ids) => debug!(
                session = %self.id,
                report_ids = ?ids,
                len = self.registration.descriptor.len(),
                "registering HID descriptor"
            ),
            Err(e) => warn!(session = %self.id, error = %e, "HID descriptor is malformed"),
        }

        match self.transport.register_app(&self.registration).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(SessionError::RegistrationFailed(
                "stack declined the application".to_string(),
            )),
            Err(TransportError::PermissionDenied) => Err(SessionError::PermissionDenied),
            Err(TransportError::Unavailable) => Err(SessionError::TransportUnavailable),
            Err(TransportError::Disabled) => Err(SessionError::TransportDisabled),
            Err(e) => Err(SessionError::RegistrationFailed(e.to_string())),
        }
    }

    /// Tears the registration down.  Always ends in `Unregistered`;
    /// transport errors are logged and swallowed.  Waits for an in-flight
    /// [`register`](Self::register) to finish first.
    pub async fn unregister(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        let link = {
            let mut inner = self.lock();
            match inner.phase {
                Phase::Unregistered | Phase::Unregistering => return,
                _ => {}
            }
            let link = inner.phase.link_host().cloned();
            self.transition(&mut inner, Phase::Unregistering);
            link
        };

        if let Some(host) = link {
            if let Err(e) = self.transport.disconnect(&host).await {
                warn!(session = %self.id, host = %host.address, error = %e, "disconnect during unregister failed");
            }
        }
        if let Err(e) = self.transport.unregister_app().await {
            warn!(session = %self.id, error = %e, "unregister_app failed");
        }

        let mut inner = self.lock();
        self.transition(&mut inner, Phase::Unregistered);
    }

    // ── Connection ────────────────────────────────────────────────────────────

    /// Starts connecting to `host_id`.  Completion arrives later as a
    /// `Connected` transport event.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotRegistered`] unless registered with no link.
    /// - [`SessionError::InvalidHost`] for a malformed or unresolvable id.
    /// - [`SessionError::ConnectFailed`] if the stack refuses; the session
    ///   stays `Registered`.
    pub async fn connect(&self, host_id: &str) -> Result<(), SessionError> {
        if self.lock().phase != Phase::Registered {
            return Err(SessionError::NotRegistered);
        }
        if !is_bluetooth_address(host_id) {
            return Err(SessionError::InvalidHost(host_id.to_string()));
        }
        let host = self
            .transport
            .resolve_host(host_id)
            .ok_or_else(|| SessionError::InvalidHost(host_id.to_string()))?;

        {
            let mut inner = self.lock();
            if inner.phase != Phase::Registered {
                return Err(SessionError::NotRegistered);
            }
            self.transition(&mut inner, Phase::Connecting(host.clone()));
        }

        let failure = match self.transport.connect(&host).await {
            Ok(true) => {
                info!(session = %self.id, host = %host.address, "connection initiated");
                return Ok(());
            }
            Ok(false) => "stack refused the connection".to_string(),
            Err(e) => e.to_string(),
        };

        warn!(session = %self.id, host = %host.address, reason = %failure, "connect failed");
        let mut inner = self.lock();
        if inner.phase == Phase::Connecting(host) {
            self.transition(&mut inner, Phase::Registered);
        }
        Err(SessionError::ConnectFailed(failure))
    }

    /// Requests disconnection of the current link.  A no-op outside
    /// `Connecting`/`Connected`.
    pub async fn disconnect(&self) {
        let host = {
            let mut inner = self.lock();
            let host = match &inner.phase {
                Phase::Connecting(h) | Phase::Connected(h) => h.clone(),
                _ => return,
            };
            self.transition(&mut inner, Phase::Disconnecting(host.clone()));
            host
        };

        if let Err(e) = self.transport.disconnect(&host).await {
            warn!(session = %self.id, host = %host.address, error = %e, "disconnect failed; dropping link locally");
            let mut inner = self.lock();
            if inner.phase == Phase::Disconnecting(host) {
                self.transition(&mut inner, Phase::Registered);
            }
        }
    }

    // ── Transport events ──────────────────────────────────────────────────────

    /// Applies one asynchronous callback from the stack.
    pub fn apply_event(&self, event: TransportEvent) {
        let mut inner = self.lock();
        match event {
            TransportEvent::AppStatusChanged { registered: true } => {
                if inner.phase == Phase::Registering {
                    self.transition(&mut inner, Phase::Registered);
                }
            }
            TransportEvent::AppStatusChanged { registered: false } => match inner.phase {
                Phase::Unregistered | Phase::Registering | Phase::Unregistering => {}
                _ => {
                    warn!(session = %self.id, "stack dropped the HID application");
                    self.transition(&mut inner, Phase::Unregistered);
                }
            },
            TransportEvent::ConnectionStateChanged { host, state } => {
                self.apply_link_state(&mut inner, host, state);
            }
            TransportEvent::VirtualCableUnplug { host } => {
                let on_link = inner.phase.link_host().is_some_and(|h| h.same_address(&host));
                if on_link {
                    info!(session = %self.id, host = %host.address, "virtual cable unplugged");
                    self.transition(&mut inner, Phase::Registered);
                    self.notify(SessionNotification::VirtualCableUnplugged { host: host.address });
                }
            }
            TransportEvent::SetReport {
                report_type: ReportType::Output,
                report_id,
                data,
                ..
            } if report_id == ReportId::Keyboard.as_u8() => {
                if let Some(&byte) = data.first() {
                    let leds = KeyboardLeds::from_byte(byte);
                    if leds != inner.leds {
                        inner.leds = leds;
                        debug!(session = %self.id, ?leds, "keyboard LEDs changed");
                        self.notify(SessionNotification::LedsChanged { leds });
                    }
                }
            }
            other => debug!(session = %self.id, event = ?other, "transport event ignored"),
        }
    }

    fn apply_link_state(&self, inner: &mut SessionInner, host: HostDevice, state: LinkState) {
        let same_host = inner.phase.link_host().is_some_and(|h| h.same_address(&host));
        let next = match (state, &inner.phase) {
            // Host-initiated links are accepted.
            (LinkState::Connecting, Phase::Registered) => Some(Phase::Connecting(host)),
            (LinkState::Connected, Phase::Registered) => Some(Phase::Connected(host)),
            (LinkState::Connected, Phase::Connecting(_)) if same_host => {
                Some(Phase::Connected(host))
            }
            (LinkState::Disconnecting, Phase::Connecting(_) | Phase::Connected(_)) if same_host => {
                Some(Phase::Disconnecting(host))
            }
            (
                LinkState::Disconnected,
                Phase::Connecting(_) | Phase::Connected(_) | Phase::Disconnecting(_),
            ) if same_host => Some(Phase::Registered),
            _ => None,
        };
        match next {
            Some(phase) => self.transition(inner, phase),
            None => debug!(
                session = %self.id,
                ?state,
                current = ?inner.phase.state(),
                "link state ignored"
            ),
        }
    }

    // ── Sending ───────────────────────────────────────────────────────────────

    /// Waits for exclusive use of the send lane.
    pub async fn lane(&self) -> SendLane<'_> {
        SendLane {
            _guard: self.lane.lock().await,
        }
    }

    /// Sends one report built from the held input.
    ///
    /// `build` runs under the state lock only once the session is known to
    /// be connected with permission, so mask changes it makes are never
    /// applied to a session that cannot send.  Returns the transport's
    /// accepted flag.
    pub async fn send<F>(&self, _lane: &SendLane<'_>, build: F) -> Result<bool, SessionError>
    where
        F: FnOnce(&mut HeldInput) -> Report,
    {
        let (host, report) = {
            let mut inner = self.lock();
            let host = match &inner.phase {
                Phase::Connected(host) => host.clone(),
                _ => return Err(SessionError::NotConnected),
            };
            if !self.transport.has_permission() {
                return Err(SessionError::PermissionDenied);
            }
            let report = build(&mut inner.held);
            (host, report)
        };

        let payload = report.to_vec();
        match self
            .transport
            .send_report(&host, report.id(), &payload)
            .await
        {
            Ok(sent) => {
                trace!(
                    session = %self.id,
                    report_id = report.id().as_u8(),
                    len = payload.len(),
                    sent,
                    "report delivered to transport"
                );
                Ok(sent)
            }
            Err(TransportError::PermissionDenied) => Err(SessionError::PermissionDenied),
            Err(e) => {
                warn!(session = %self.id, report_id = report.id().as_u8(), error = %e, "send failed");
                Err(SessionError::SendFailed(e.to_string()))
            }
        }
    }

    /// Takes the lane for a single report.
    pub async fn send_now<F>(&self, build: F) -> Result<bool, SessionError>
    where
        F: FnOnce(&mut HeldInput) -> Report,
    {
        let lane = self.lane().await;
        self.send(&lane, build).await
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, inner: &mut SessionInner, next: Phase) {
        if inner.phase == next {
            return;
        }
        let from = inner.phase.state();
        let was_connected = matches!(inner.phase, Phase::Connected(_));
        inner.phase = next;

        if was_connected && !matches!(inner.phase, Phase::Connected(_)) {
            inner.held = HeldInput::default();
        }
        if inner.phase == Phase::Unregistered {
            inner.held = HeldInput::default();
            inner.leds = KeyboardLeds::default();
        }

        let state = inner.phase.state();
        let host = inner.phase.link_host().map(|h| h.address.clone());
        info!(session = %self.id, ?from, to = ?state, host = ?host, "session state changed");
        self.notify(SessionNotification::StateChanged { state, host });
    }

    fn notify(&self, notification: SessionNotification) {
        match self.notifications.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!(session = %self.id, ?dropped, "notification queue full; dropping");
            }
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

/// Feeds transport events into the session until the stream ends.
pub fn spawn_event_pump(
    session: Arc<HidSession>,
    mut events: mpsc::Receiver<TransportEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            session.apply_event(event);
        }
        debug!(session = %session.id(), "transport event stream closed");
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::transport::MockHidTransport;
    use remote_hid_core::report::encoder;
    use remote_hid_core::MouseButton;

    const HOST: &str = "AA:BB:CC:DD:EE:FF";

    type SentLog = Arc<Mutex<Vec<(ReportId, Vec<u8>)>>>;

    // ── Test doubles ──────────────────────────────────────────────────────────

    /// Adapter ready, permission granted, any address resolves.
    fn base_mock() -> MockHidTransport {
        let mut mock = MockHidTransport::new();
        mock.expect_adapter_status().return_const(AdapterStatus::Ready);
        mock.expect_has_permission().return_const(true);
        mock.expect_resolve_host()
            .returning(|address| Some(HostDevice::new(address)));
        mock
    }

    fn accept_registration(mock: &mut MockHidTransport) {
        mock.expect_unregister_app().returning(|| Ok(()));
        mock.expect_register_app().returning(|_| Ok(true));
    }

    fn record_sends(mock: &mut MockHidTransport) -> SentLog {
        let log: SentLog = Arc::default();
        let sink = Arc::clone(&log);
        mock.expect_send_report().returning(move |_, id, payload| {
            sink.lock().unwrap().push((id, payload.to_vec()));
            Ok(true)
        });
        log
    }

    fn session_with(mock: MockHidTransport) -> (HidSession, mpsc::Receiver<SessionNotification>) {
        HidSession::new(Arc::new(mock), AppRegistration::default())
    }

    fn link_event(state: LinkState) -> TransportEvent {
        TransportEvent::ConnectionStateChanged {
            host: HostDevice::new(HOST),
            state,
        }
    }

    async fn connected(session: &HidSession) {
        session.register().await.unwrap();
        session.connect(HOST).await.unwrap();
        session.apply_event(link_event(LinkState::Connected));
        assert_eq!(session.state(), SessionState::Connected);
    }

    fn drain(rx: &mut mpsc::Receiver<SessionNotification>) -> Vec<SessionNotification> {
        let mut out = Vec::new();
        while let Ok(n) = rx.try_recv() {
            out.push(n);
        }
        out
    }

    // ── Registration ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_register_from_unregistered_reaches_registered() {
        // Arrange
        let mut mock = base_mock();
        accept_registration(&mut mock);
        let (session, mut rx) = session_with(mock);

        // Act
        let result = session.register().await;

        // Assert
        assert_eq!(result, Ok(()));
        assert_eq!(session.state(), SessionState::Registered);
        let states: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|n| match n {
                SessionNotification::StateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect();
        assert_eq!(states, vec![SessionState::Registering, SessionState::Registered]);
    }

    #[tokio::test]
    async fn test_register_twice_is_already_registered() {
        let mut mock = base_mock();
        accept_registration(&mut mock);
        let (session, _rx) = session_with(mock);
        session.register().await.unwrap();

        assert_eq!(session.register().await, Err(SessionError::AlreadyRegistered));
        assert_eq!(session.state(), SessionState::Registered);
    }

    #[tokio::test]
    async fn test_register_with_disabled_adapter_returns_to_unregistered() {
        // Arrange
        let mut mock = MockHidTransport::new();
        mock.expect_adapter_status().return_const(AdapterStatus::Disabled);
        mock.expect_register_app().never();
        let (session, _rx) = session_with(mock);

        // Act
        let result = session.register().await;

        // Assert
        assert_eq!(result, Err(SessionError::TransportDisabled));
        assert_eq!(session.state(), SessionState::Unregistered);
    }

    #[tokio::test]
    async fn test_register_without_adapter_is_transport_unavailable() {
        let mut mock = MockHidTransport::new();
        mock.expect_adapter_status().return_const(AdapterStatus::Unavailable);
        let (session, _rx) = session_with(mock);

        assert_eq!(session.register().await, Err(SessionError::TransportUnavailable));
    }

    #[tokio::test]
    async fn test_register_without_permission_is_permission_denied() {
        let mut mock = MockHidTransport::new();
        mock.expect_adapter_status().return_const(AdapterStatus::Ready);
        mock.expect_has_permission().return_const(false);
        mock.expect_register_app().never();
        let (session, _rx) = session_with(mock);

        assert_eq!(session.register().await, Err(SessionError::PermissionDenied));
        assert_eq!(session.state(), SessionState::Unregistered);
    }

    #[tokio::test]
    async fn test_register_rejected_by_stack_is_registration_failed() {
        // Arrange
        let mut mock = base_mock();
        mock.expect_unregister_app().returning(|| Ok(()));
        mock.expect_register_app().returning(|_| Ok(false));
        let (session, _rx) = session_with(mock);

        // Act
        let result = session.register().await;

        // Assert
        assert!(matches!(result, Err(SessionError::RegistrationFailed(_))));
        assert_eq!(session.state(), SessionState::Unregistered);
    }

    #[tokio::test]
    async fn test_register_clears_stale_registration_even_if_that_fails() {
        let mut mock = base_mock();
        mock.expect_unregister_app()
            .times(1)
            .returning(|| Err(TransportError::Failed("nothing registered".into())));
        mock.expect_register_app()
            .withf(|reg| reg.descriptor == remote_hid_core::COMBO_DESCRIPTOR)
            .returning(|_| Ok(true));
        let (session, _rx) = session_with(mock);

        assert_eq!(session.register().await, Ok(()));
    }

    // ── Connection ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_connect_before_register_is_not_registered() {
        let mut mock = base_mock();
        mock.expect_connect().never();
        let (session, _rx) = session_with(mock);

        assert_eq!(session.connect(HOST).await, Err(SessionError::NotRegistered));
    }

    #[tokio::test]
    async fn test_connect_with_malformed_id_never_reaches_transport() {
        // Arrange
        let mut mock = MockHidTransport::new();
        mock.expect_adapter_status().return_const(AdapterStatus::Ready);
        mock.expect_has_permission().return_const(true);
        accept_registration(&mut mock);
        mock.expect_resolve_host().never();
        mock.expect_connect().never();
        let (session, _rx) = session_with(mock);
        session.register().await.unwrap();

        // Act
        let result = session.connect("not-an-address").await;

        // Assert
        assert_eq!(result, Err(SessionError::InvalidHost("not-an-address".into())));
        assert_eq!(session.state(), SessionState::Registered);
    }

    #[tokio::test]
    async fn test_connect_to_unresolvable_host_is_invalid_host() {
        let mut mock = MockHidTransport::new();
        mock.expect_adapter_status().return_const(AdapterStatus::Ready);
        mock.expect_has_permission().return_const(true);
        accept_registration(&mut mock);
        mock.expect_resolve_host().returning(|_| None);
        mock.expect_connect().never();
        let (session, _rx) = session_with(mock);
        session.register().await.unwrap();

        assert!(matches!(
            session.connect(HOST).await,
            Err(SessionError::InvalidHost(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_refused_reverts_to_registered() {
        // Arrange
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_connect().returning(|_| Ok(false));
        let (session, _rx) = session_with(mock);
        session.register().await.unwrap();

        // Act
        let result = session.connect(HOST).await;

        // Assert
        assert!(matches!(result, Err(SessionError::ConnectFailed(_))));
        assert_eq!(session.state(), SessionState::Registered);
        assert_eq!(session.paired_host(), None);
    }

    #[tokio::test]
    async fn test_connect_waits_for_connected_event() {
        // Arrange
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_connect().returning(|_| Ok(true));
        let (session, _rx) = session_with(mock);
        session.register().await.unwrap();

        // Act
        session.connect(HOST).await.unwrap();
        let before = session.state();
        session.apply_event(link_event(LinkState::Connected));

        // Assert
        assert_eq!(before, SessionState::Connecting);
        assert_eq!(session.paired_host(), Some(HostDevice::new(HOST)));
    }

    #[tokio::test]
    async fn test_connect_while_connected_is_not_registered() {
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_connect().times(1).returning(|_| Ok(true));
        let (session, _rx) = session_with(mock);
        connected(&session).await;

        assert_eq!(session.connect(HOST).await, Err(SessionError::NotRegistered));
    }

    #[tokio::test]
    async fn test_disconnect_clears_host_on_disconnected_event() {
        // Arrange
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_connect().returning(|_| Ok(true));
        mock.expect_disconnect().times(1).returning(|_| Ok(()));
        let (session, _rx) = session_with(mock);
        connected(&session).await;

        // Act
        session.disconnect().await;
        let mid = session.state();
        session.apply_event(link_event(LinkState::Disconnected));

        // Assert
        assert_eq!(mid, SessionState::Disconnecting);
        assert_eq!(session.state(), SessionState::Registered);
        assert_eq!(session.paired_host(), None);
    }

    #[tokio::test]
    async fn test_disconnect_transport_error_drops_straight_to_registered() {
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_connect().returning(|_| Ok(true));
        mock.expect_disconnect()
            .returning(|_| Err(TransportError::Failed("proxy gone".into())));
        let (session, _rx) = session_with(mock);
        connected(&session).await;

        session.disconnect().await;

        assert_eq!(session.state(), SessionState::Registered);
    }

    #[tokio::test]
    async fn test_disconnect_without_link_is_noop() {
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_disconnect().never();
        let (session, _rx) = session_with(mock);
        session.register().await.unwrap();

        session.disconnect().await;

        assert_eq!(session.state(), SessionState::Registered);
    }

    // ── Unregistration ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_unregister_reaches_unregistered_despite_transport_errors() {
        // Arrange
        let mut mock = base_mock();
        mock.expect_unregister_app()
            .times(1)
            .returning(|| Ok(()));
        mock.expect_register_app().returning(|_| Ok(true));
        mock.expect_connect().returning(|_| Ok(true));
        mock.expect_disconnect()
            .returning(|_| Err(TransportError::Failed("link lost".into())));
        mock.expect_unregister_app()
            .returning(|| Err(TransportError::Unavailable));
        let (session, _rx) = session_with(mock);
        connected(&session).await;

        // Act
        session.unregister().await;

        // Assert
        assert_eq!(session.state(), SessionState::Unregistered);
        assert_eq!(session.paired_host(), None);
        assert_eq!(session.held(), HeldInput::default());
    }

    #[tokio::test]
    async fn test_unregister_from_unregistered_is_idempotent() {
        let mut mock = base_mock();
        mock.expect_unregister_app().never();
        let (session, mut rx) = session_with(mock);

        session.unregister().await;

        assert_eq!(session.state(), SessionState::Unregistered);
        assert!(drain(&mut rx).is_empty());
    }

    // ── Events ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_host_initiated_connection_is_accepted() {
        let mut mock = base_mock();
        accept_registration(&mut mock);
        let (session, _rx) = session_with(mock);
        session.register().await.unwrap();

        session.apply_event(link_event(LinkState::Connecting));
        session.apply_event(link_event(LinkState::Connected));

        assert_eq!(session.state(), SessionState::Connected);
        assert_eq!(session.paired_host().map(|h| h.address), Some(HOST.to_string()));
    }

    #[tokio::test]
    async fn test_connected_event_before_registration_is_ignored() {
        let (session, _rx) = session_with(base_mock());

        session.apply_event(link_event(LinkState::Connected));

        assert_eq!(session.state(), SessionState::Unregistered);
    }

    #[tokio::test]
    async fn test_disconnected_event_for_other_host_is_ignored() {
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_connect().returning(|_| Ok(true));
        let (session, _rx) = session_with(mock);
        connected(&session).await;

        session.apply_event(TransportEvent::ConnectionStateChanged {
            host: HostDevice::new("11:22:33:44:55:66"),
            state: LinkState::Disconnected,
        });

        assert_eq!(session.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_app_status_lost_forces_unregistered() {
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_connect().returning(|_| Ok(true));
        let (session, _rx) = session_with(mock);
        connected(&session).await;

        session.apply_event(TransportEvent::AppStatusChanged { registered: false });

        assert_eq!(session.state(), SessionState::Unregistered);
        assert_eq!(session.paired_host(), None);
    }

    #[tokio::test]
    async fn test_virtual_cable_unplug_drops_link_and_notifies() {
        // Arrange
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_connect().returning(|_| Ok(true));
        let (session, mut rx) = session_with(mock);
        connected(&session).await;
        drain(&mut rx);

        // Act
        session.apply_event(TransportEvent::VirtualCableUnplug {
            host: HostDevice::new(HOST),
        });

        // Assert
        assert_eq!(session.state(), SessionState::Registered);
        assert!(drain(&mut rx).contains(&SessionNotification::VirtualCableUnplugged {
            host: HOST.to_string()
        }));
    }

    #[tokio::test]
    async fn test_keyboard_output_report_updates_leds() {
        // Arrange
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_connect().returning(|_| Ok(true));
        let (session, mut rx) = session_with(mock);
        connected(&session).await;
        drain(&mut rx);

        // Act
        session.apply_event(TransportEvent::SetReport {
            host: HostDevice::new(HOST),
            report_type: ReportType::Output,
            report_id: 2,
            data: vec![0x02],
        });

        // Assert
        assert!(session.keyboard_leds().caps_lock);
        assert_eq!(
            drain(&mut rx),
            vec![SessionNotification::LedsChanged {
                leds: KeyboardLeds::from_byte(0x02)
            }]
        );
    }

    #[tokio::test]
    async fn test_feature_report_does_not_touch_leds() {
        let (session, _rx) = session_with(base_mock());

        session.apply_event(TransportEvent::SetReport {
            host: HostDevice::new(HOST),
            report_type: ReportType::Feature,
            report_id: 2,
            data: vec![0xFF],
        });

        assert_eq!(session.keyboard_leds(), KeyboardLeds::default());
    }

    // ── Sending ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_send_while_registered_is_not_connected() {
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_send_report().never();
        let (session, _rx) = session_with(mock);
        session.register().await.unwrap();

        let result = session
            .send_now(|held| encoder::mouse_move(held.buttons, 1, 1).into())
            .await;

        assert_eq!(result, Err(SessionError::NotConnected));
    }

    #[tokio::test]
    async fn test_send_builds_from_held_buttons() {
        // Arrange
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_connect().returning(|_| Ok(true));
        let log = record_sends(&mut mock);
        let (session, _rx) = session_with(mock);
        connected(&session).await;

        // Act
        session
            .send_now(|held| {
                held.buttons = held.buttons.with(MouseButton::Left, true);
                encoder::mouse_buttons(held.buttons).into()
            })
            .await
            .unwrap();
        session
            .send_now(|held| encoder::mouse_move(held.buttons, 5, -5).into())
            .await
            .unwrap();

        // Assert
        let sent = log.lock().unwrap().clone();
        assert_eq!(sent[1], (ReportId::Mouse, vec![0x01, 0x05, 0xFB, 0x00, 0x00]));
    }

    #[tokio::test]
    async fn test_leaving_connected_releases_held_input() {
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_connect().returning(|_| Ok(true));
        record_sends(&mut mock);
        let (session, _rx) = session_with(mock);
        connected(&session).await;
        session
            .send_now(|held| {
                held.modifiers = Modifiers::LEFT_CTRL;
                encoder::modifiers_only(held.modifiers).into()
            })
            .await
            .unwrap();

        session.apply_event(link_event(LinkState::Disconnected));

        assert_eq!(session.held(), HeldInput::default());
    }

    #[tokio::test]
    async fn test_send_without_permission_is_permission_denied() {
        // Arrange
        let mut mock = MockHidTransport::new();
        mock.expect_adapter_status().return_const(AdapterStatus::Ready);
        mock.expect_resolve_host()
            .returning(|address| Some(HostDevice::new(address)));
        accept_registration(&mut mock);
        mock.expect_connect().returning(|_| Ok(true));
        // Granted for registration, revoked afterwards.
        let mut checks = 0;
        mock.expect_has_permission().returning(move || {
            checks += 1;
            checks == 1
        });
        mock.expect_send_report().never();
        let (session, _rx) = session_with(mock);
        connected(&session).await;

        // Act
        let result = session
            .send_now(|held| encoder::mouse_move(held.buttons, 1, 0).into())
            .await;

        // Assert
        assert_eq!(result, Err(SessionError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_transport_send_error_is_send_failed() {
        let mut mock = base_mock();
        accept_registration(&mut mock);
        mock.expect_connect().returning(|_| Ok(true));
        mock.expect_send_report()
            .returning(|_, _, _| Err(TransportError::Failed("queue full".into())));
        let (session, _rx) = session_with(mock);
        connected(&session).await;

        let result = session
            .send_now(|_| encoder::consumer_release().into())
            .await;

        assert!(matches!(result, Err(SessionError::SendFailed(_))));
    }

    #[tokio::test]
    async fn test_event_pump_applies_events_in_order() {
        // Arrange
        let mut mock = base_mock();
        accept_registration(&mut mock);
        let (session, _rx) = session_with(mock);
        let session = Arc::new(session);
        session.register().await.unwrap();
        let (tx, events) = mpsc::channel(8);
        let pump = spawn_event_pump(Arc::clone(&session), events);

        // Act
        tx.send(link_event(LinkState::Connecting)).await.unwrap();
        tx.send(link_event(LinkState::Connected)).await.unwrap();
        drop(tx);
        pump.await.unwrap();

        // Assert
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(SessionError::TransportUnavailable.code(), "NO_TRANSPORT");
        assert_eq!(SessionError::NotConnected.code(), "NOT_CONNECTED");
        assert_eq!(SessionError::InvalidHost(String::new()).code(), "INVALID_HOST");
    }
}

//! Shared wiring for the integration tests: the full application stack over
//! a `SimulatedTransport`, exactly as `main` assembles it.

#![allow(dead_code)]

use std::sync::Arc;

use remote_hid::application::dispatch_input::{InputDispatcher, PressTimings};
use remote_hid::application::sequencer::Sequencer;
use remote_hid::application::session::{
    spawn_event_pump, HidSession, SessionNotification, SessionState,
};
use remote_hid::application::transport::{AppRegistration, TransportEvent};
use remote_hid::infrastructure::transport::simulated::SimulatedTransport;
use tokio::sync::mpsc;

pub const HOST: &str = "AA:BB:CC:DD:EE:FF";

pub struct Harness {
    pub dispatcher: InputDispatcher,
    pub transport: Arc<SimulatedTransport>,
    pub notifications: mpsc::Receiver<SessionNotification>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_transport(SimulatedTransport::new())
    }

    pub fn with_transport(
        (transport, events): (SimulatedTransport, mpsc::Receiver<TransportEvent>),
    ) -> Self {
        let transport = Arc::new(transport);
        let (session, notifications) =
            HidSession::new(transport.clone(), AppRegistration::default());
        let session = Arc::new(session);
        spawn_event_pump(Arc::clone(&session), events);
        let sequencer = Sequencer::spawn(Arc::clone(&session));
        Self {
            dispatcher: InputDispatcher::new(session, sequencer, PressTimings::default()),
            transport,
            notifications,
        }
    }

    /// Lets the event pump catch up until the session reaches `state`.
    pub async fn settle(&self, state: SessionState) {
        for _ in 0..100 {
            if self.dispatcher.session_state() == state {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!(
            "session stuck in {:?}, expected {state:?}",
            self.dispatcher.session_state()
        );
    }

    /// Registers and connects to [`HOST`].
    pub async fn connected() -> Self {
        let harness = Self::new();
        harness.dispatcher.register_device().await.expect("register");
        harness.dispatcher.connect(HOST).await.expect("connect");
        harness.settle(SessionState::Connected).await;
        harness
    }

    /// Every notification queued so far.
    pub fn drain(&mut self) -> Vec<SessionNotification> {
        let mut out = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            out.push(n);
        }
        out
    }

    /// Payloads sent so far, without the report IDs.
    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.transport
            .sent_reports()
            .into_iter()
            .map(|r| r.bytes)
            .collect()
    }
}

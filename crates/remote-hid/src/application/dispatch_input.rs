//! InputDispatcher: turns semantic remote commands into HID reports.
//!
//! The dispatcher validates arguments and session preconditions, then
//! either sends a single report on the caller's task (move, scroll, held
//! buttons and modifiers) or queues a timed sequence on the [`Sequencer`]
//! and awaits it (click, key tap, text).
//!
//! Argument errors (`InvalidKey`, `InvalidButton`) are raised before any
//! transport call.

use std::sync::Arc;
use std::time::Duration;

use remote_hid_core::report::encoder;
use remote_hid_core::{
    plan_text, HidKeyCode, KeyMapper, KeyboardLeds, MouseButton,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::sequencer::{SequenceError, SequenceJob, SequenceOutcome, Sequencer};
use super::session::{HidSession, SessionError, SessionState};
use super::transport::PairedHost;

/// Errors returned by dispatcher commands.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("unknown key: {0:?}")]
    InvalidKey(String),

    #[error("invalid mouse button index: {0}")]
    InvalidButton(i64),

    #[error("transport declined a report after {reports_sent} report(s) were sent")]
    SendDeclined { reports_sent: usize },

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

impl DispatchError {
    /// Stable code surfaced on the command boundary.
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::Session(e) => e.code(),
            DispatchError::InvalidKey(_) => "INVALID_KEY",
            DispatchError::InvalidButton(_) => "INVALID_BUTTON",
            DispatchError::SendDeclined { .. } => "SEND_FAILED",
            DispatchError::Sequence(SequenceError::Interrupted { source, .. }) => source.code(),
            DispatchError::Sequence(SequenceError::WorkerStopped) => "WORKER_STOPPED",
        }
    }
}

/// Hold and gap durations for timed sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressTimings {
    pub click_hold: Duration,
    pub key_hold: Duration,
    pub text_key_hold: Duration,
    pub text_key_gap: Duration,
}

impl Default for PressTimings {
    fn default() -> Self {
        Self {
            click_hold: Duration::from_millis(30),
            key_hold: Duration::from_millis(50),
            text_key_hold: Duration::from_millis(30),
            text_key_gap: Duration::from_millis(30),
        }
    }
}

/// The command surface of the remote.
pub struct InputDispatcher {
    session: Arc<HidSession>,
    sequencer: Sequencer,
    timings: PressTimings,
}

impl InputDispatcher {
    pub fn new(session: Arc<HidSession>, sequencer: Sequencer, timings: PressTimings) -> Self {
        Self {
            session,
            sequencer,
            timings,
        }
    }

    pub fn session(&self) -> &Arc<HidSession> {
        &self.session
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Checks that an enabled adapter is reachable.
    pub fn initialize(&self) -> Result<(), DispatchError> {
        self.session.check_adapter()?;
        info!(session = %self.session.id(), "HID transport ready");
        Ok(())
    }

    pub async fn register_device(&self) -> Result<(), DispatchError> {
        Ok(self.session.register().await?)
    }

    pub async fn unregister_device(&self) {
        self.session.unregister().await;
    }

    pub async fn connect(&self, host_id: &str) -> Result<(), DispatchError> {
        Ok(self.session.connect(host_id).await?)
    }

    pub async fn disconnect(&self) {
        self.session.disconnect().await;
    }

    // ── Mouse ─────────────────────────────────────────────────────────────────

    /// Relative pointer movement carrying the held buttons.
    pub async fn move_pointer(&self, dx: i32, dy: i32) -> Result<bool, DispatchError> {
        Ok(self
            .session
            .send_now(|held| encoder::mouse_move(held.buttons, dx, dy).into())
            .await?)
    }

    /// `dx` pans horizontally, `dy` drives the wheel.
    pub async fn scroll(&self, dx: i32, dy: i32) -> Result<bool, DispatchError> {
        Ok(self
            .session
            .send_now(|held| encoder::mouse_scroll(held.buttons, dx, dy).into())
            .await?)
    }

    /// Press and release one button.  Returns `false` if the transport
    /// declined either report.
    pub async fn click(&self, button_index: i64) -> Result<bool, DispatchError> {
        let button = button_from_index(button_index)?;
        self.session.ensure_connected()?;
        let outcome = self
            .run(SequenceJob::Click {
                button,
                hold: self.timings.click_hold,
            })
            .await?;
        Ok(outcome.completed)
    }

    /// Holds or releases a button; later moves and scrolls carry it.
    pub async fn set_button_state(
        &self,
        button_index: i64,
        is_down: bool,
    ) -> Result<bool, DispatchError> {
        let button = button_from_index(button_index)?;
        Ok(self
            .session
            .send_now(|held| {
                held.buttons = held.buttons.with(button, is_down);
                encoder::mouse_buttons(held.buttons).into()
            })
            .await?)
    }

    // ── Keyboard ──────────────────────────────────────────────────────────────

    /// Holds or releases a modifier key (`lctrl`, `rshift`, …); later key
    /// taps combine it.
    pub async fn set_modifier_state(&self, key: &str, is_down: bool) -> Result<bool, DispatchError> {
        let bit = KeyMapper::scancode(key)
            .and_then(HidKeyCode::modifier_bit)
            .ok_or_else(|| DispatchError::InvalidKey(key.to_string()))?;
        Ok(self
            .session
            .send_now(|held| {
                held.modifiers = held.modifiers.with(bit, is_down);
                encoder::modifiers_only(held.modifiers).into()
            })
            .await?)
    }

    /// Taps a named key.  Media names go to the consumer channel; other
    /// names to the keyboard with the held modifiers.  `NOT_CONNECTED` is
    /// reported before an unknown key name.
    pub async fn key_press(&self, key: &str) -> Result<(), DispatchError> {
        self.session.ensure_connected()?;
        let resolved =
            KeyMapper::resolve(key).ok_or_else(|| DispatchError::InvalidKey(key.to_string()))?;
        let outcome = self
            .run(SequenceJob::Key {
                key: resolved,
                hold: self.timings.key_hold,
            })
            .await?;
        if !outcome.completed {
            return Err(DispatchError::SendDeclined {
                reports_sent: outcome.reports_sent,
            });
        }
        Ok(())
    }

    /// Types `text` on a US layout.  Unmappable characters are skipped and
    /// listed in the outcome.
    pub async fn send_text(&self, text: &str) -> Result<SequenceOutcome, DispatchError> {
        self.session.ensure_connected()?;
        let plan = plan_text(text);
        debug!(
            session = %self.session.id(),
            chars = text.chars().count(),
            reports = plan.report_count(),
            "typing text"
        );
        let outcome = self
            .run(SequenceJob::Text {
                plan,
                hold: self.timings.text_key_hold,
                gap: self.timings.text_key_gap,
            })
            .await?;
        if !outcome.completed {
            return Err(DispatchError::SendDeclined {
                reports_sent: outcome.reports_sent,
            });
        }
        Ok(outcome)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// The adapter's bonded hosts.  Transport errors yield an empty list.
    pub async fn list_paired_hosts(&self) -> Vec<PairedHost> {
        match self.session.transport().bonded_hosts().await {
            Ok(hosts) => hosts,
            Err(e) => {
                warn!(session = %self.session.id(), error = %e, "could not list bonded hosts");
                Vec::new()
            }
        }
    }

    pub fn keyboard_leds(&self) -> KeyboardLeds {
        self.session.keyboard_leds()
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    async fn run(&self, job: SequenceJob) -> Result<SequenceOutcome, DispatchError> {
        let handle = self.sequencer.submit(job).await?;
        Ok(handle.await?)
    }
}

fn button_from_index(index: i64) -> Result<MouseButton, DispatchError> {
    u8::try_from(index)
        .ok()
        .and_then(MouseButton::from_index)
        .ok_or(DispatchError::InvalidButton(index))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

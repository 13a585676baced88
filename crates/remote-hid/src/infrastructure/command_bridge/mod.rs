//! JSON command bridge.
//!
//! Exposes the [`InputDispatcher`] to a controlling application as
//! newline-delimited JSON.  Each request names a dispatcher verb and its
//! arguments:
//!
//! ```text
//! {"method": "connect",  "args": {"hostId": "AA:BB:CC:DD:EE:FF"}}
//! {"method": "move",     "args": {"dx": 10, "dy": -4}}
//! {"method": "keyPress", "args": {"key": "enter"}}
//! {"method": "isConnected"}
//! ```
//!
//! # `CommandResult<T>`
//!
//! Every command answers with the same envelope:
//! ```json
//! { "success": true,  "data": {...}, "error": null }
//! { "success": false, "data": null,  "error": {"code": "NOT_CONNECTED", "message": "..."} }
//! ```
//! `code` is stable and meant for programmatic handling; `message` is for
//! humans.  A line that does not parse as a command answers `BAD_REQUEST`.
//!
//! Session notifications are pushed on the same stream as
//! `{"event": "stateChanged", ...}` objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::application::dispatch_input::{DispatchError, InputDispatcher};
use crate::application::sequencer::SequenceOutcome;
use crate::application::session::SessionNotification;

/// One request from the controlling application.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "camelCase")]
pub enum Command {
    Initialize,
    RegisterDevice,
    UnregisterDevice,
    #[serde(rename_all = "camelCase")]
    Connect {
        host_id: String,
    },
    Disconnect,
    Move {
        dx: i32,
        dy: i32,
    },
    Scroll {
        dx: i32,
        dy: i32,
    },
    #[serde(rename_all = "camelCase")]
    Click {
        button_index: i64,
    },
    #[serde(rename_all = "camelCase")]
    SetButtonState {
        button_index: i64,
        is_down: bool,
    },
    #[serde(rename_all = "camelCase")]
    SetModifierState {
        key: String,
        is_down: bool,
    },
    KeyPress {
        key: String,
    },
    SendText {
        text: String,
    },
    IsConnected,
    ListPairedHosts,
    KeyboardLeds,
    SessionState,
}

/// Error half of the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
}

/// Unified result envelope for every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<CommandError>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(CommandError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

impl<T> From<DispatchError> for CommandResult<T> {
    fn from(e: DispatchError) -> Self {
        Self::err(e.code(), e.to_string())
    }
}

/// `sendText` result payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOutcomeDto {
    pub reports_sent: usize,
    pub skipped: Vec<char>,
}

impl From<SequenceOutcome> for TextOutcomeDto {
    fn from(outcome: SequenceOutcome) -> Self {
        Self {
            reports_sent: outcome.reports_sent,
            skipped: outcome.skipped,
        }
    }
}

fn respond<T: Serialize>(result: Result<T, DispatchError>) -> CommandResult<Value> {
    match result {
        Ok(data) => match serde_json::to_value(data) {
            Ok(value) => CommandResult::ok(value),
            Err(e) => CommandResult::err("INTERNAL", e.to_string()),
        },
        Err(e) => e.into(),
    }
}

/// Runs one command against the dispatcher.
pub async fn handle_command(dispatcher: &InputDispatcher, command: Command) -> CommandResult<Value> {
    debug!(?command, "command received");
    match command {
        Command::Initialize => respond(dispatcher.initialize()),
        Command::RegisterDevice => respond(dispatcher.register_device().await),
        Command::UnregisterDevice => {
            dispatcher.unregister_device().await;
            CommandResult::ok(Value::Null)
        }
        Command::Connect { host_id } => respond(dispatcher.connect(&host_id).await),
        Command::Disconnect => {
            dispatcher.disconnect().await;
            CommandResult::ok(Value::Null)
        }
        Command::Move { dx, dy } => respond(dispatcher.move_pointer(dx, dy).await),
        Command::Scroll { dx, dy } => respond(dispatcher.scroll(dx, dy).await),
        Command::Click { button_index } => respond(dispatcher.click(button_index).await),
        Command::SetButtonState {
            button_index,
            is_down,
        } => respond(dispatcher.set_button_state(button_index, is_down).await),
        Command::SetModifierState { key, is_down } => {
            respond(dispatcher.set_modifier_state(&key, is_down).await)
        }
        Command::KeyPress { key } => respond(dispatcher.key_press(&key).await),
        Command::SendText { text } => respond(
            dispatcher
                .send_text(&text)
                .await
                .map(TextOutcomeDto::from),
        ),
        Command::IsConnected => respond(Ok(dispatcher.is_connected())),
        Command::ListPairedHosts => respond(Ok(dispatcher.list_paired_hosts().await)),
        Command::KeyboardLeds => respond(Ok(dispatcher.keyboard_leds())),
        Command::SessionState => respond(Ok(dispatcher.session_state())),
    }
}

/// Parses one request line, runs it and renders the response line.
pub async fn handle_line(dispatcher: &InputDispatcher, line: &str) -> String {
    let result = match serde_json::from_str::<Command>(line) {
        Ok(command) => handle_command(dispatcher, command).await,
        Err(e) => CommandResult::err("BAD_REQUEST", e.to_string()),
    };
    render(&result)
}

/// Renders a session notification as one JSON line.
pub fn notification_line(notification: &SessionNotification) -> String {
    render(notification)
}

fn render<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        format!(r#"{{"success":false,"data":null,"error":{{"code":"INTERNAL","message":"{e}"}}}}"#)
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

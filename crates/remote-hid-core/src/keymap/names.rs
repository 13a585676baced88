//! Symbolic key names accepted by the key-press command.
//!
//! Names are matched case-insensitively.  Several keys have aliases (`space`
//! and `" "`, `pageup` and `page_up`, `right` and `arrow_right`, …) because
//! the controlling application sends whichever spelling its UI uses.

use super::hid::HidKeyCode;

/// Name → key table.  Order is irrelevant to lookup; it only groups entries
/// for readability.
const KEY_NAMES: &[(&str, HidKeyCode)] = &[
    ("a", HidKeyCode::KeyA),
    ("b", HidKeyCode::KeyB),
    ("c", HidKeyCode::KeyC),
    ("d", HidKeyCode::KeyD),
    ("e", HidKeyCode::KeyE),
    ("f", HidKeyCode::KeyF),
    ("g", HidKeyCode::KeyG),
    ("h", HidKeyCode::KeyH),
    ("i", HidKeyCode::KeyI),
    ("j", HidKeyCode::KeyJ),
    ("k", HidKeyCode::KeyK),
    ("l", HidKeyCode::KeyL),
    ("m", HidKeyCode::KeyM),
    ("n", HidKeyCode::KeyN),
    ("o", HidKeyCode::KeyO),
    ("p", HidKeyCode::KeyP),
    ("q", HidKeyCode::KeyQ),
    ("r", HidKeyCode::KeyR),
    ("s", HidKeyCode::KeyS),
    ("t", HidKeyCode::KeyT),
    ("u", HidKeyCode::KeyU),
    ("v", HidKeyCode::KeyV),
    ("w", HidKeyCode::KeyW),
    ("x", HidKeyCode::KeyX),
    ("y", HidKeyCode::KeyY),
    ("z", HidKeyCode::KeyZ),
    ("1", HidKeyCode::Digit1),
    ("2", HidKeyCode::Digit2),
    ("3", HidKeyCode::Digit3),
    ("4", HidKeyCode::Digit4),
    ("5", HidKeyCode::Digit5),
    ("6", HidKeyCode::Digit6),
    ("7", HidKeyCode::Digit7),
    ("8", HidKeyCode::Digit8),
    ("9", HidKeyCode::Digit9),
    ("0", HidKeyCode::Digit0),
    ("enter", HidKeyCode::Enter),
    ("escape", HidKeyCode::Escape),
    ("backspace", HidKeyCode::Backspace),
    ("tab", HidKeyCode::Tab),
    ("space", HidKeyCode::Space),
    (" ", HidKeyCode::Space),
    // Base punctuation keys; their shifted symbols are only reachable
    // through text typing.
    ("-", HidKeyCode::Minus),
    ("=", HidKeyCode::Equal),
    ("[", HidKeyCode::BracketLeft),
    ("]", HidKeyCode::BracketRight),
    ("\\", HidKeyCode::Backslash),
    (";", HidKeyCode::Semicolon),
    ("'", HidKeyCode::Quote),
    ("`", HidKeyCode::Backquote),
    (",", HidKeyCode::Comma),
    (".", HidKeyCode::Period),
    ("/", HidKeyCode::Slash),
    ("capslock", HidKeyCode::CapsLock),
    ("f1", HidKeyCode::F1),
    ("f2", HidKeyCode::F2),
    ("f3", HidKeyCode::F3),
    ("f4", HidKeyCode::F4),
    ("f5", HidKeyCode::F5),
    ("f6", HidKeyCode::F6),
    ("f7", HidKeyCode::F7),
    ("f8", HidKeyCode::F8),
    ("f9", HidKeyCode::F9),
    ("f10", HidKeyCode::F10),
    ("f11", HidKeyCode::F11),
    ("f12", HidKeyCode::F12),
    ("printscreen", HidKeyCode::PrintScreen),
    ("scrolllock", HidKeyCode::ScrollLock),
    ("pause", HidKeyCode::Pause),
    ("insert", HidKeyCode::Insert),
    ("home", HidKeyCode::Home),
    ("pageup", HidKeyCode::PageUp),
    ("page_up", HidKeyCode::PageUp),
    ("delete", HidKeyCode::Delete),
    ("end", HidKeyCode::End),
    ("pagedown", HidKeyCode::PageDown),
    ("page_down", HidKeyCode::PageDown),
    ("right", HidKeyCode::ArrowRight),
    ("arrow_right", HidKeyCode::ArrowRight),
    ("left", HidKeyCode::ArrowLeft),
    ("arrow_left", HidKeyCode::ArrowLeft),
    ("down", HidKeyCode::ArrowDown),
    ("arrow_down", HidKeyCode::ArrowDown),
    ("up", HidKeyCode::ArrowUp),
    ("arrow_up", HidKeyCode::ArrowUp),
    ("lctrl", HidKeyCode::ControlLeft),
    ("lshift", HidKeyCode::ShiftLeft),
    ("lalt", HidKeyCode::AltLeft),
    ("lgui", HidKeyCode::MetaLeft),
    ("rctrl", HidKeyCode::ControlRight),
    ("rshift", HidKeyCode::ShiftRight),
    ("ralt", HidKeyCode::AltRight),
    ("rgui", HidKeyCode::MetaRight),
];

/// Looks up a symbolic key name, ignoring ASCII case.
pub fn key_by_name(name: &str) -> Option<HidKeyCode> {
    KEY_NAMES
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|&(_, key)| key)
}

/// Every name accepted by [`key_by_name`], aliases included.
pub fn key_names() -> impl Iterator<Item = &'static str> {
    KEY_NAMES.iter().map(|&(name, _)| name)
}

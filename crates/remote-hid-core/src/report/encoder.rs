//! Pure report builders: input event in, fixed-layout report out.
//!
//! Nothing here reads session state.  The caller passes the current button
//! mask or modifier byte explicitly, so the same inputs always produce the
//! same bytes.
//!
//! # Out-of-range deltas
//!
//! Movement and scroll deltas arrive as `i32` but each axis is a single
//! signed byte with a declared logical range of -127..=127.  Deltas are
//! **saturated** into that range rather than truncated: a fast swipe of
//! +300 becomes +127 instead of wrapping to +44 and jerking the pointer the
//! other way.

use crate::keymap::{ConsumerUsage, HidKeyCode, Modifiers};
use crate::report::{ConsumerReport, KeyboardReport, MouseButtons, MouseReport};

/// Logical range of every relative mouse axis, as declared by the descriptor.
pub const AXIS_MIN: i8 = -127;
pub const AXIS_MAX: i8 = 127;

/// Reduces a delta to the axis range.
pub fn saturate_delta(delta: i32) -> i8 {
    delta.clamp(AXIS_MIN as i32, AXIS_MAX as i32) as i8
}

/// Pointer movement with the currently held buttons.
pub fn mouse_move(buttons: MouseButtons, dx: i32, dy: i32) -> MouseReport {
    MouseReport {
        buttons,
        x: saturate_delta(dx),
        y: saturate_delta(dy),
        wheel: 0,
        pan: 0,
    }
}

/// Scroll: `vertical` drives the wheel byte, `horizontal` the pan byte.
pub fn mouse_scroll(buttons: MouseButtons, horizontal: i32, vertical: i32) -> MouseReport {
    MouseReport {
        buttons,
        x: 0,
        y: 0,
        wheel: saturate_delta(vertical),
        pan: saturate_delta(horizontal),
    }
}

/// Button state only, no motion.
pub fn mouse_buttons(buttons: MouseButtons) -> MouseReport {
    MouseReport {
        buttons,
        ..MouseReport::default()
    }
}

/// A key going down together with `modifiers`.
///
/// Modifier keys never occupy the key array: pressing `ShiftLeft` yields the
/// Shift bit with an empty array.
pub fn key_press(modifiers: Modifiers, key: HidKeyCode) -> KeyboardReport {
    match key.modifier_bit() {
        Some(bit) => KeyboardReport {
            modifiers: modifiers | bit,
            key: None,
        },
        None => KeyboardReport {
            modifiers,
            key: Some(key),
        },
    }
}

/// Only the given modifiers held, no key.
pub fn modifiers_only(modifiers: Modifiers) -> KeyboardReport {
    KeyboardReport {
        modifiers,
        key: None,
    }
}

/// All keys and modifiers up.
pub fn key_release() -> KeyboardReport {
    KeyboardReport::default()
}

pub fn consumer_press(usage: ConsumerUsage) -> ConsumerReport {
    ConsumerReport {
        usage: usage.as_u16(),
    }
}

pub fn consumer_release() -> ConsumerReport {
    ConsumerReport { usage: 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MouseButton;

    #[test]
    fn test_move_with_both_buttons_held() {
        // Arrange
        let buttons = MouseButtons::from_bits(0b0000_0011);

        // Act
        let report = mouse_move(buttons, 5, -5);

        // Assert
        assert_eq!(report.to_bytes(), [0x03, 0x05, 0xFB, 0x00, 0x00]);
    }

    #[test]
    fn test_scroll_puts_vertical_in_wheel_and_horizontal_in_pan() {
        let report = mouse_scroll(MouseButtons::NONE, 2, -3);
        assert_eq!(report.to_bytes(), [0x00, 0x00, 0x00, 0xFD, 0x02]);
    }

    #[test]
    fn test_scroll_keeps_held_buttons() {
        let held = MouseButtons::NONE.with(MouseButton::Left, true);
        let report = mouse_scroll(held, 0, 1);
        assert_eq!(report.to_bytes()[0], 0x01);
    }

    #[test]
    fn test_out_of_range_deltas_saturate_instead_of_wrapping() {
        // A narrowing cast would turn 300 into 44 and -300 into -44.
        let report = mouse_move(MouseButtons::NONE, 300, -300);
        assert_eq!(report.to_bytes(), [0x00, 0x7F, 0x81, 0x00, 0x00]);
    }

    #[test]
    fn test_minus_128_saturates_to_declared_minimum() {
        assert_eq!(saturate_delta(-128), -127);
        assert_eq!(saturate_delta(i32::MIN), -127);
        assert_eq!(saturate_delta(i32::MAX), 127);
        assert_eq!(saturate_delta(-127), -127);
        assert_eq!(saturate_delta(0), 0);
    }

    #[test]
    fn test_button_report_has_no_motion() {
        let report = mouse_buttons(MouseButtons::from_bits(0x01));
        assert_eq!(report.to_bytes(), [0x01, 0, 0, 0, 0]);
    }

    #[test]
    fn test_key_press_places_key_in_first_slot() {
        let report = key_press(Modifiers::LEFT_SHIFT, HidKeyCode::KeyH);
        assert_eq!(report.to_bytes(), [0x02, 0x00, 0x0B, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_modifier_key_press_sets_bit_and_leaves_array_empty() {
        let report = key_press(Modifiers::LEFT_CTRL, HidKeyCode::AltRight);
        assert_eq!(report.to_bytes(), [0x41, 0x00, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_key_release_is_all_zero() {
        let report = key_release();
        assert!(report.is_release());
        assert_eq!(report.to_bytes(), [0u8; 8]);
    }

    #[test]
    fn test_consumer_press_and_release() {
        assert_eq!(consumer_press(ConsumerUsage::VolumeUp).to_bytes(), [0xE9, 0x00]);
        assert_eq!(consumer_release().to_bytes(), [0x00, 0x00]);
    }
}

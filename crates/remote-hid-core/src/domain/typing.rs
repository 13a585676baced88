//! Text typing plan.
//!
//! Each typeable character becomes a press report followed by an all-zero
//! release report.  The press carries only the Shift bit when the character
//! needs it.  Modifiers the user is holding are not part of the plan; the
//! sequencer ORs them into both reports when it sends them.
//!
//! Characters the US layout cannot produce are collected in
//! [`TextPlan::skipped`] and contribute no reports.

use tracing::debug;

use crate::keymap::{us_layout::char_to_keystroke, Modifiers};
use crate::report::encoder::{key_press, key_release};
use crate::report::KeyboardReport;

/// The press/release pair for one typed character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStep {
    pub ch: char,
    pub press: KeyboardReport,
    pub release: KeyboardReport,
}

/// Ordered keyboard reports for a string, plus what could not be typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextPlan {
    pub steps: Vec<KeyStep>,
    pub skipped: Vec<char>,
}

impl TextPlan {
    /// Number of reports the plan sends (two per step).
    pub fn report_count(&self) -> usize {
        self.steps.len() * 2
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Builds the typing plan for `text`.
pub fn plan_text(text: &str) -> TextPlan {
    let mut plan = TextPlan::default();
    for ch in text.chars() {
        match char_to_keystroke(ch) {
            Some(stroke) => {
                let modifiers = if stroke.shift {
                    Modifiers::LEFT_SHIFT
                } else {
                    Modifiers::NONE
                };
                plan.steps.push(KeyStep {
                    ch,
                    press: key_press(modifiers, stroke.key),
                    release: key_release(),
                });
            }
            None => plan.skipped.push(ch),
        }
    }
    if !plan.skipped.is_empty() {
        debug!(
            skipped = plan.skipped.len(),
            "text contains characters outside the US layout"
        );
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::HidKeyCode;

    #[test]
    fn test_hi_bang_produces_six_reports_in_order() {
        // Arrange
        let text = "Hi!";

        // Act
        let plan = plan_text(text);

        // Assert
        let bytes: Vec<[u8; 8]> = plan
            .steps
            .iter()
            .flat_map(|s| [s.press.to_bytes(), s.release.to_bytes()])
            .collect();
        assert_eq!(
            bytes,
            vec![
                [0x02, 0, 0x0B, 0, 0, 0, 0, 0],
                [0; 8],
                [0x00, 0, 0x0C, 0, 0, 0, 0, 0],
                [0; 8],
                [0x02, 0, 0x1E, 0, 0, 0, 0, 0],
                [0; 8],
            ]
        );
        assert!(plan.skipped.is_empty());
        assert_eq!(plan.report_count(), 6);
    }

    #[test]
    fn test_unmappable_characters_are_skipped_without_reports() {
        let plan = plan_text("a\u{e9}b");

        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].press.key, Some(HidKeyCode::KeyA));
        assert_eq!(plan.steps[1].press.key, Some(HidKeyCode::KeyB));
        assert_eq!(plan.skipped, vec!['\u{e9}']);
    }

    #[test]
    fn test_empty_text_plans_nothing() {
        let plan = plan_text("");
        assert!(plan.is_empty());
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn test_newline_types_enter_without_shift() {
        let plan = plan_text("\n");
        assert_eq!(plan.steps[0].press.key, Some(HidKeyCode::Enter));
        assert!(plan.steps[0].press.modifiers.is_empty());
    }

    #[test]
    fn test_every_release_is_all_zero() {
        let plan = plan_text("The quick brown fox: 42%");
        assert!(plan.steps.iter().all(|s| s.release.is_release()));
    }
}

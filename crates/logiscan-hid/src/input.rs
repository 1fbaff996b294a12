//! Keystroke capture for keyboard-wedge scanners.
//!
//! A wedge scanner "types" into whatever has focus. The usual host setup is
//! a tiny hidden text field that keeps focus while scanning is enabled. This
//! module turns what that field observes into [`WedgeInput`] events for the
//! collector:
//!
//! - characters appended to the field value ([`FieldDiffCapture`])
//! - Enter/Tab key-down events ([`WedgeKey`])
//!
//! Characters are filtered by [`classify_char`]: line breaks and tabs end a
//! code, letters, digits, ASCII punctuation and space are part of a code,
//! and anything else (control characters, emoji, ...) is ignored.

use logiscan_core::constants::{ACCEPTED_PUNCTUATION, FIELD_CLEAR_THRESHOLD, TERMINATOR_CHARS};

/// Input event delivered to the scan collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WedgeInput {
    /// Printable character that may be part of a code.
    Char(char),

    /// End-of-code signal (Enter or Tab).
    Terminator,
}

impl WedgeInput {
    /// Check if this input is a terminator.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Self::Terminator)
    }

    /// Get the character if this is a character input.
    pub fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            Self::Terminator => None,
        }
    }
}

/// Classify a character typed into the capture field.
///
/// Letters and digits are any Unicode alphanumeric, which also admits
/// number forms such as `²` and `Ⅻ`.
///
/// # Examples
///
/// ```
/// use logiscan_hid::input::{classify_char, WedgeInput};
///
/// assert_eq!(classify_char('A'), Some(WedgeInput::Char('A')));
/// assert_eq!(classify_char('-'), Some(WedgeInput::Char('-')));
/// assert_eq!(classify_char('\r'), Some(WedgeInput::Terminator));
/// assert_eq!(classify_char('\u{7}'), None);
/// ```
pub fn classify_char(c: char) -> Option<WedgeInput> {
    if TERMINATOR_CHARS.contains(&c) {
        Some(WedgeInput::Terminator)
    } else if c.is_alphanumeric() || c == ' ' || ACCEPTED_PUNCTUATION.contains(c) {
        Some(WedgeInput::Char(c))
    } else {
        None
    }
}

/// Key-down events seen by the capture field before text handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WedgeKey {
    Enter,
    Tab,
    /// Any other key; its character arrives through the field value.
    Other,
}

impl WedgeKey {
    /// Map a key-down event to an input, if the key is handled directly.
    ///
    /// Enter and Tab are consumed as terminators; every other key is left to
    /// the text field so case and punctuation come out right.
    pub fn to_input(self) -> Option<WedgeInput> {
        match self {
            Self::Enter | Self::Tab => Some(WedgeInput::Terminator),
            Self::Other => None,
        }
    }
}

/// Result of feeding a new field value to [`FieldDiffCapture`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldChange {
    /// Events for the characters appended since the previous value.
    pub inputs: Vec<WedgeInput>,

    /// The host should clear the field; tracking has already been reset.
    pub clear_field: bool,
}

/// Derives keystrokes from successive values of a hidden text field.
///
/// Only growth is interpreted: when the new value is longer than the
/// previous one, the characters past the previous length are classified and
/// returned. Shrinking or same-length edits produce no events.
///
/// # Examples
///
/// ```
/// use logiscan_hid::input::{FieldDiffCapture, WedgeInput};
///
/// let mut capture = FieldDiffCapture::new();
///
/// let change = capture.on_value_change("AB");
/// assert_eq!(change.inputs, vec![WedgeInput::Char('A'), WedgeInput::Char('B')]);
///
/// let change = capture.on_value_change("ABC\n");
/// assert_eq!(change.inputs, vec![WedgeInput::Char('C'), WedgeInput::Terminator]);
/// ```
#[derive(Debug, Clone)]
pub struct FieldDiffCapture {
    previous: String,
    previous_len: usize,
    clear_threshold: usize,
}

impl FieldDiffCapture {
    /// Create a capture that asks for a field clear past the default threshold.
    pub fn new() -> Self {
        Self::with_clear_threshold(FIELD_CLEAR_THRESHOLD)
    }

    /// Create a capture with a custom clear threshold (in characters).
    pub fn with_clear_threshold(clear_threshold: usize) -> Self {
        Self {
            previous: String::new(),
            previous_len: 0,
            clear_threshold,
        }
    }

    /// Feed the field's new value and collect the appended inputs.
    pub fn on_value_change(&mut self, value: &str) -> FieldChange {
        let len = value.chars().count();

        let inputs = if len > self.previous_len {
            value
                .chars()
                .skip(self.previous_len)
                .filter_map(classify_char)
                .collect()
        } else {
            Vec::new()
        };

        let clear_field = len > self.clear_threshold;
        if clear_field {
            self.clear();
        } else {
            self.previous.clear();
            self.previous.push_str(value);
            self.previous_len = len;
        }

        FieldChange {
            inputs,
            clear_field,
        }
    }

    /// Forget the tracked value, e.g. after the host cleared the field.
    pub fn clear(&mut self) {
        self.previous.clear();
        self.previous_len = 0;
    }

    /// The last value the capture has seen.
    pub fn value(&self) -> &str {
        &self.previous
    }
}

impl Default for FieldDiffCapture {
    fn default() -> Self {
        Self::new()
    }
}

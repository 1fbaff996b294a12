//! Default tuning constants for keyboard-wedge scan detection.
//!
//! A Bluetooth scanner in HID "keyboard wedge" mode types the decoded barcode
//! as simulated keystrokes. Nothing in the keystrokes marks them as coming
//! from a scanner, so the collector tells scanner bursts apart from human
//! typing by timing alone. The values below are the defaults that work for
//! common wedge scanners; every one of them can be overridden through
//! [`ScanConfig`](crate::ScanConfig).
//!
//! # Timing Model
//!
//! ```text
//!  scanner burst                          human typing
//!  A B C 1 2 3 4 5 ⏎                      A   B     C    1   ...
//!  |-|-|-|-|-|-|-|-|                      |---|-----|----|
//!   ~5-20 ms per key                       ~80-300 ms per key
//!  |<--- well under 500 ms --->|
//! ```
//!
//! # Usage
//!
//! ```
//! use logiscan_core::constants::*;
//!
//! assert_eq!(DEFAULT_MIN_LENGTH, 6);
//! assert!(DEFAULT_MAX_MEDIAN_INTER_KEY_MS < DEFAULT_IDLE_TIMEOUT_MS);
//! ```

// ============================================================================
// Acceptance Gates
// ============================================================================

/// Minimum number of characters a trimmed candidate must have.
///
/// Shorter bursts are almost always stray human keystrokes.
pub const DEFAULT_MIN_LENGTH: usize = 6;

/// Maximum time from the first to the last character of a burst.
///
/// A scanner delivers even long codes in well under half a second.
pub const DEFAULT_MAX_SCAN_DURATION_MS: u64 = 500;

/// Maximum median interval between consecutive characters.
///
/// The median is robust against a single late keystroke caused by Bluetooth
/// jitter, while still rejecting human typing speed.
///
/// # Examples
///
/// ```
/// use logiscan_core::constants::DEFAULT_MAX_MEDIAN_INTER_KEY_MS;
///
/// // 10 ms between keys: scanner
/// assert!(10 <= DEFAULT_MAX_MEDIAN_INTER_KEY_MS);
/// // 100 ms between keys: human
/// assert!(100 > DEFAULT_MAX_MEDIAN_INTER_KEY_MS);
/// ```
pub const DEFAULT_MAX_MEDIAN_INTER_KEY_MS: u64 = 35;

/// Minimum number of timestamps needed to compute at least one interval.
pub const MIN_TIMESTAMPS_FOR_SPEED: usize = 2;

// ============================================================================
// Timeouts
// ============================================================================

/// Silence after the last character that finalizes a burst without a
/// terminator key.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 70;

/// Window in which an identical accepted code is treated as a duplicate.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

// ============================================================================
// Keystroke Capture
// ============================================================================

/// Characters that end a code when typed by the scanner (Enter, CR, Tab).
pub const TERMINATOR_CHARS: [char; 3] = ['\n', '\r', '\t'];

/// ASCII punctuation accepted as part of a code, in addition to letters,
/// digits and the space character.
pub const ACCEPTED_PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Length at which a hidden capture field is cleared to bound its growth.
pub const FIELD_CLEAR_THRESHOLD: usize = 100;

// ============================================================================
// Broadcast Scanners
// ============================================================================

/// Intent action used by MT93 scanners when broadcasting a decoded barcode.
pub const MT93_SCAN_ACTION: &str = "nlscan.action.SCANNER_RESULT";

/// Intent extra carrying the JSON payload of an MT93 broadcast.
pub const MT93_DECODE_DATA_EXTRA: &str = "SCANNER_DECODE_DATA";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminators_are_whitespace() {
        for c in TERMINATOR_CHARS {
            assert!(c.is_whitespace());
        }
    }

    #[test]
    fn test_accepted_punctuation_is_ascii_punctuation() {
        assert!(ACCEPTED_PUNCTUATION.chars().all(|c| c.is_ascii_punctuation()));
        assert_eq!(ACCEPTED_PUNCTUATION.len(), 32);
    }

    #[test]
    fn test_idle_timeout_exceeds_median_threshold() {
        const { assert!(DEFAULT_IDLE_TIMEOUT_MS > DEFAULT_MAX_MEDIAN_INTER_KEY_MS) };
    }
}

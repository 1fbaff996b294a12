//! Acceptance gates for candidate scans.
//!
//! A finalized burst must pass every gate to be emitted. The gates are
//! independent conjunctions, so evaluation order never changes the outcome;
//! the cheap length gate runs first and the interval sort runs last.

use std::fmt;

use logiscan_core::constants::MIN_TIMESTAMPS_FOR_SPEED;
use logiscan_core::{Millis, ScanConfig};

/// The gate that rejected a candidate.
///
/// Only used for diagnostics: a rejected burst is dropped silently.
#[derive(Debug, Clone, PartialEq)]
pub enum GateRejection {
    /// Trimmed candidate has fewer characters than `min_length`.
    TooShort { length: usize, min_length: usize },

    /// Fewer than two timestamps, so no interval can be measured.
    InsufficientEvidence { timestamps: usize },

    /// First to last character took longer than `max_scan_duration_ms`.
    TooLong { duration_ms: Millis, max_ms: u64 },

    /// Median inter-key interval exceeded `max_median_inter_key_ms`.
    TooSlow { median_ms: f64, max_ms: u64 },
}

impl fmt::Display for GateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { length, min_length } => {
                write!(f, "length {length} below minimum {min_length}")
            }
            Self::InsufficientEvidence { timestamps } => {
                write!(f, "only {timestamps} timestamp(s), need {MIN_TIMESTAMPS_FOR_SPEED}")
            }
            Self::TooLong {
                duration_ms,
                max_ms,
            } => write!(f, "burst lasted {duration_ms}ms, max {max_ms}ms"),
            Self::TooSlow { median_ms, max_ms } => {
                write!(f, "median inter-key {median_ms}ms, max {max_ms}ms")
            }
        }
    }
}

/// Evaluate all acceptance gates for a trimmed candidate.
///
/// `timestamps` are the arrival times of every buffered character (including
/// any whitespace trimmed from the candidate) and `first_char_time` is the
/// arrival time of the first one.
///
/// # Examples
///
/// ```
/// use logiscan_core::ScanConfig;
/// use logiscan_hid::gates::{evaluate, GateRejection};
///
/// let config = ScanConfig::default();
/// let fast: Vec<i64> = (0..8).map(|i| i * 10).collect();
/// assert!(evaluate("ABC12345", &fast, 0, &config).is_ok());
///
/// let slow: Vec<i64> = (0..9).map(|i| i * 100).collect();
/// assert!(matches!(
///     evaluate("ABCDEF123", &slow, 0, &config),
///     Err(GateRejection::TooLong { .. })
/// ));
/// ```
pub fn evaluate(
    candidate: &str,
    timestamps: &[Millis],
    first_char_time: Millis,
    config: &ScanConfig,
) -> Result<(), GateRejection> {
    let length = candidate.chars().count();
    if length < config.min_length {
        return Err(GateRejection::TooShort {
            length,
            min_length: config.min_length,
        });
    }

    let Some(&last) = timestamps.last() else {
        return Err(GateRejection::InsufficientEvidence { timestamps: 0 });
    };
    if timestamps.len() < MIN_TIMESTAMPS_FOR_SPEED {
        return Err(GateRejection::InsufficientEvidence {
            timestamps: timestamps.len(),
        });
    }

    let duration_ms = last.saturating_sub(first_char_time);
    if duration_ms > as_millis(config.max_scan_duration_ms) {
        return Err(GateRejection::TooLong {
            duration_ms,
            max_ms: config.max_scan_duration_ms,
        });
    }

    // Non-empty: at least two timestamps were checked above.
    let median_ms = median_interval(timestamps).unwrap_or(f64::INFINITY);
    if median_ms > config.max_median_inter_key_ms as f64 {
        return Err(GateRejection::TooSlow {
            median_ms,
            max_ms: config.max_median_inter_key_ms,
        });
    }

    Ok(())
}

/// Median of the consecutive intervals between `timestamps`.
///
/// For an odd number of intervals this is the middle sorted value, for an
/// even number the mean of the two middle values. Returns `None` when fewer
/// than two timestamps are given. Negative intervals (clock anomalies) take
/// part as-is.
///
/// # Examples
///
/// ```
/// use logiscan_hid::gates::median_interval;
///
/// // intervals 10, 20, 25, 35
/// assert_eq!(median_interval(&[0, 10, 30, 55, 90]), Some(22.5));
/// // intervals 5, 40, 7
/// assert_eq!(median_interval(&[0, 5, 45, 52]), Some(7.0));
/// assert_eq!(median_interval(&[3]), None);
/// ```
pub fn median_interval(timestamps: &[Millis]) -> Option<f64> {
    let mut intervals: Vec<Millis> = timestamps
        .windows(2)
        .map(|pair| pair[1].saturating_sub(pair[0]))
        .collect();

    if intervals.is_empty() {
        return None;
    }
    intervals.sort_unstable();

    let mid = intervals.len() / 2;
    let median = if intervals.len() % 2 == 0 {
        (intervals[mid - 1] as f64 + intervals[mid] as f64) / 2.0
    } else {
        intervals[mid] as f64
    };

    Some(median)
}

/// Config values are validated to fit the signed timeline.
fn as_millis(ms: u64) -> Millis {
    Millis::try_from(ms).unwrap_or(Millis::MAX)
}

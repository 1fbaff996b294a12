//! Keyboard-wedge scan collector.
//!
//! This module provides [`ScanCollector`], the timing-based state machine
//! that separates scanner bursts from human typing when both arrive as
//! keystrokes through the same channel.
//!
//! # States
//!
//! - `Idle`: buffer empty, no idle timer pending
//! - `Accumulating`: buffer non-empty, exactly one idle timer pending
//!
//! # Transitions
//!
//! ```text
//!            on_printable_char
//!   Idle ─────────────────────────► Accumulating ──┐
//!    ▲                                   │  ▲       │ on_printable_char
//!    │   idle timer / terminator / reset │  └───────┘ (timer re-armed)
//!    └───────────────────────────────────┘
//! ```
//!
//! Every way back to `Idle` goes through finalize-or-clear. Finalizing
//! trims the buffer, runs the [acceptance gates](crate::gates), applies the
//! debounce window and, if everything passes, hands the code to the
//! [`ScanSink`] after the burst has been cleared.
//!
//! # Timers
//!
//! The collector does not sleep. [`on_printable_char`](ScanCollector::on_printable_char)
//! returns an [`IdleTimer`] describing when the burst should be finalized if
//! nothing else arrives; the driver arms a real timer for it and calls
//! [`on_idle_timeout`](ScanCollector::on_idle_timeout) when it fires. Only
//! the most recently issued timer is honoured, so a timer that was superseded
//! by a newer character, a terminator or a [`reset`](ScanCollector::reset)
//! can never emit, even if it was already queued for dispatch.
//!
//! # Examples
//!
//! ```
//! use logiscan_core::ScanConfig;
//! use logiscan_hid::ScanCollector;
//!
//! let mut scans = Vec::new();
//! let mut collector = ScanCollector::new(ScanConfig::default(), |code: String| scans.push(code)).unwrap();
//!
//! let mut now = 0;
//! for c in "ABC12345".chars() {
//!     collector.on_printable_char(c, now);
//!     now += 10;
//! }
//! collector.on_terminator(now);
//!
//! drop(collector);
//! assert_eq!(scans, vec!["ABC12345".to_string()]);
//! ```

use std::fmt;

use logiscan_core::{Millis, ScanConfig};
use tracing::{debug, info, trace};

use crate::Result;
use crate::gates;
use crate::input::WedgeInput;

/// Receiver of accepted scans.
///
/// Implemented for every `FnMut(String)`.
pub trait ScanSink {
    /// Called once per accepted burst with the trimmed code.
    fn on_scan(&mut self, code: String);
}

impl<F: FnMut(String)> ScanSink for F {
    fn on_scan(&mut self, code: String) {
        self(code)
    }
}

/// Logical state of the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorState {
    /// No burst in progress.
    Idle,

    /// Characters buffered, waiting for more input, a terminator or the
    /// idle timeout.
    Accumulating,
}

impl fmt::Display for CollectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Accumulating => write!(f, "Accumulating"),
        }
    }
}

/// A scheduled idle timeout issued by the collector.
///
/// Each character supersedes the previous timer. Hand the timer back through
/// [`ScanCollector::on_idle_timeout`] once `deadline` has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdleTimer {
    generation: u64,
    deadline: Millis,
}

impl IdleTimer {
    /// Time at which the burst should be finalized.
    pub fn deadline(&self) -> Millis {
        self.deadline
    }

    /// Sequence number distinguishing this timer from earlier ones.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Evidence accumulated for one candidate scan.
#[derive(Debug, Default)]
struct Burst {
    buffer: String,
    timestamps: Vec<Millis>,
    /// Set only on the empty to non-empty transition.
    first_char_time: Option<Millis>,
}

impl Burst {
    fn push(&mut self, c: char, now: Millis) {
        if self.buffer.is_empty() {
            self.first_char_time = Some(now);
        }
        self.buffer.push(c);
        self.timestamps.push(now);
    }

    fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.timestamps.clear();
        self.first_char_time = None;
    }
}

/// Last emitted code, kept across bursts for duplicate suppression.
#[derive(Debug, Default)]
struct DebounceMemory {
    last_scan_value: Option<String>,
    last_scan_time: Millis,
}

impl DebounceMemory {
    fn is_duplicate(&self, candidate: &str, now: Millis, window_ms: u64) -> bool {
        self.last_scan_value.as_deref() == Some(candidate)
            && now.saturating_sub(self.last_scan_time) < Millis::try_from(window_ms).unwrap_or(Millis::MAX)
    }

    fn remember(&mut self, candidate: &str, now: Millis) {
        self.last_scan_value = Some(candidate.to_string());
        self.last_scan_time = now;
    }
}

/// Timing-based classifier for keyboard-wedge scanner input.
///
/// Feed it characters and terminators with their arrival times; accepted
/// bursts are delivered to the sink exactly once. Rejections are silent.
///
/// # Thread Safety
///
/// Methods take `&mut self`; the collector expects a single owner that
/// delivers events and timer firings in order. The
/// [`ScanManager`](crate::ScanManager) provides that owner in async code.
pub struct ScanCollector<S> {
    config: ScanConfig,
    burst: Burst,
    debounce: DebounceMemory,
    pending: Option<IdleTimer>,
    next_generation: u64,
    sink: S,
}

impl<S: ScanSink> ScanCollector<S> {
    /// Create a collector with the given configuration and sink.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Configuration` if the configuration is invalid
    /// (for example `min_length == 0`).
    pub fn new(config: ScanConfig, sink: S) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            burst: Burst::default(),
            debounce: DebounceMemory::default(),
            pending: None,
            next_generation: 0,
            sink,
        })
    }

    /// Append a printable character received at `now`.
    ///
    /// Cancels any pending idle timer and returns the replacement, due
    /// `idle_timeout_ms` after `now`.
    pub fn on_printable_char(&mut self, c: char, now: Millis) -> IdleTimer {
        self.pending = None;
        self.burst.push(c, now);
        trace!(char = ?c, now, buffered = self.burst.timestamps.len(), "Buffered character");

        let timer = IdleTimer {
            generation: self.next_generation,
            deadline: now.saturating_add(
                Millis::try_from(self.config.idle_timeout_ms).unwrap_or(Millis::MAX),
            ),
        };
        self.next_generation = self.next_generation.wrapping_add(1);
        self.pending = Some(timer);
        timer
    }

    /// End the current burst immediately (Enter/Tab received at `now`).
    pub fn on_terminator(&mut self, now: Millis) {
        self.pending = None;
        self.finalize(now);
    }

    /// Deliver a fired idle timer.
    ///
    /// Finalizes the burst only if `timer` is the one currently pending.
    /// Returns `false` for a stale or cancelled timer, which is ignored.
    pub fn on_idle_timeout(&mut self, timer: IdleTimer, now: Millis) -> bool {
        if self.pending != Some(timer) {
            trace!(generation = timer.generation, "Ignoring stale idle timer");
            return false;
        }

        self.pending = None;
        self.finalize(now);
        true
    }

    /// Dispatch a [`WedgeInput`] received at `now`.
    ///
    /// Returns the new idle timer for characters, `None` for terminators.
    pub fn on_input(&mut self, input: WedgeInput, now: Millis) -> Option<IdleTimer> {
        match input {
            WedgeInput::Char(c) => Some(self.on_printable_char(c, now)),
            WedgeInput::Terminator => {
                self.on_terminator(now);
                None
            }
        }
    }

    /// Discard the current burst and cancel the pending idle timer.
    ///
    /// The debounce memory is kept.
    pub fn reset(&mut self) {
        self.pending = None;
        self.burst.clear();
    }

    /// The idle timer currently pending, if any.
    pub fn pending_timer(&self) -> Option<IdleTimer> {
        self.pending
    }

    /// Current logical state.
    pub fn state(&self) -> CollectorState {
        if self.burst.is_empty() {
            CollectorState::Idle
        } else {
            CollectorState::Accumulating
        }
    }

    /// Characters buffered for the current burst.
    pub fn buffered(&self) -> &str {
        &self.burst.buffer
    }

    /// The configuration this collector was built with.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Shared access to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Exclusive access to the sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the collector and return the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn finalize(&mut self, now: Millis) {
        if self.burst.is_empty() {
            self.reset();
            return;
        }

        let candidate = self.burst.buffer.trim();
        if candidate.is_empty() {
            debug!("Rejected burst: whitespace only");
            self.reset();
            return;
        }

        let first_char_time = self.burst.first_char_time.unwrap_or(now);
        if let Err(rejection) = gates::evaluate(
            candidate,
            &self.burst.timestamps,
            first_char_time,
            &self.config,
        ) {
            debug!(%rejection, "Rejected burst");
            self.reset();
            return;
        }

        if self
            .debounce
            .is_duplicate(candidate, now, self.config.debounce_ms)
        {
            debug!(code = candidate, "Suppressed duplicate scan");
            self.reset();
            return;
        }

        let code = candidate.to_string();
        self.debounce.remember(&code, now);
        self.reset();

        info!(code = %code, "Scan accepted");
        self.sink.on_scan(code);
    }
}

impl<S> fmt::Debug for ScanCollector<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanCollector")
            .field("config", &self.config)
            .field("burst", &self.burst)
            .field("debounce", &self.debounce)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScanError;

    type Scans = Vec<String>;

    fn collector(config: ScanConfig) -> ScanCollector<impl FnMut(String)> {
        ScanCollector::new(config, |_code: String| {}).unwrap()
    }

    /// Collector that records scans into a shared log.
    fn recording(
        config: ScanConfig,
    ) -> (
        ScanCollector<impl FnMut(String)>,
        std::rc::Rc<std::cell::RefCell<Scans>>,
    ) {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Scans::new()));
        let sink_log = log.clone();
        let collector =
            ScanCollector::new(config, move |code: String| sink_log.borrow_mut().push(code)).unwrap();
        (collector, log)
    }

    /// Type `text` starting at `start` with a fixed interval; returns the
    /// time after the last character plus one interval, like a key loop
    /// that sleeps after every key.
    fn type_text<S: ScanSink>(
        collector: &mut ScanCollector<S>,
        text: &str,
        start: Millis,
        interval: Millis,
    ) -> Millis {
        let mut now = start;
        for c in text.chars() {
            collector.on_printable_char(c, now);
            now += interval;
        }
        now
    }

    #[test]
    fn test_fast_burst_with_terminator_emits() {
        let (mut collector, log) = recording(ScanConfig::default());

        let now = type_text(&mut collector, "ABC12345", 0, 10);
        collector.on_terminator(now);

        assert_eq!(*log.borrow(), vec!["ABC12345"]);
        assert_eq!(collector.state(), CollectorState::Idle);
    }

    #[test]
    fn test_fast_burst_emits_after_idle_timeout() {
        let (mut collector, log) = recording(ScanConfig::default());

        type_text(&mut collector, "XYZ789012", 0, 15);
        let timer = collector.pending_timer().unwrap();
        assert_eq!(timer.deadline(), 8 * 15 + 70);

        assert!(collector.on_idle_timeout(timer, timer.deadline()));
        assert_eq!(*log.borrow(), vec!["XYZ789012"]);
        assert_eq!(collector.pending_timer(), None);
    }

    #[test]
    fn test_slow_typing_does_not_emit() {
        let (mut collector, log) = recording(ScanConfig::default());

        let now = type_text(&mut collector, "ABCDEF123", 0, 100);
        collector.on_terminator(now);

        assert!(log.borrow().is_empty());
        assert_eq!(collector.state(), CollectorState::Idle);
    }

    #[test]
    fn test_too_short_does_not_emit() {
        let (mut collector, log) = recording(ScanConfig::default());

        let now = type_text(&mut collector, "ABC12", 0, 10);
        collector.on_terminator(now);

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_max_duration_exceeded_does_not_emit() {
        let config = ScanConfig::builder()
            .max_median_inter_key_ms(100)
            .build()
            .unwrap();
        let (mut collector, log) = recording(config);

        let now = type_text(&mut collector, "LONGCODE123", 0, 51);
        collector.on_terminator(now);

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_duplicate_within_debounce_suppressed() {
        let (mut collector, log) = recording(ScanConfig::default());

        let now = type_text(&mut collector, "BARCODE123", 0, 10);
        collector.on_terminator(now);

        let now = type_text(&mut collector, "BARCODE123", now + 100, 10);
        collector.on_terminator(now);

        assert_eq!(*log.borrow(), vec!["BARCODE123"]);
    }

    #[test]
    fn test_duplicate_after_debounce_emitted() {
        let (mut collector, log) = recording(ScanConfig::default());

        let now = type_text(&mut collector, "BARCODE123", 0, 10);
        collector.on_terminator(now);

        let now = type_text(&mut collector, "BARCODE123", now + 350, 10);
        collector.on_terminator(now);

        assert_eq!(*log.borrow(), vec!["BARCODE123", "BARCODE123"]);
    }

    #[test]
    fn test_debounce_window_measured_from_original_emission() {
        let (mut collector, log) = recording(ScanConfig::default());

        // Accepted at t=0.
        type_text(&mut collector, "BARCODE123", -100, 10);
        collector.on_terminator(0);

        // Suppressed at t=100; must not refresh the window.
        type_text(&mut collector, "BARCODE123", 0, 10);
        collector.on_terminator(100);

        // t=250 is within 300ms of t=0: still suppressed.
        type_text(&mut collector, "BARCODE123", 150, 10);
        collector.on_terminator(250);
        assert_eq!(log.borrow().len(), 1);

        // t=460 is 460ms after the original but only 210ms after the last
        // suppressed one; it is emitted.
        type_text(&mut collector, "BARCODE123", 360, 10);
        collector.on_terminator(460);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_different_code_not_debounced() {
        let (mut collector, log) = recording(ScanConfig::default());

        let now = type_text(&mut collector, "SCAN001", 0, 10);
        collector.on_terminator(now);
        let now = type_text(&mut collector, "SCAN002", now + 10, 10);
        collector.on_terminator(now);

        assert_eq!(*log.borrow(), vec!["SCAN001", "SCAN002"]);
    }

    #[test]
    fn test_multiple_scans_all_emitted() {
        let config = ScanConfig::builder().debounce_ms(100).build().unwrap();
        let (mut collector, log) = recording(config);

        let mut now = 0;
        for code in ["SCAN001", "SCAN002", "SCAN003"] {
            now = type_text(&mut collector, code, now, 10);
            collector.on_terminator(now);
            now += 150;
        }

        assert_eq!(*log.borrow(), vec!["SCAN001", "SCAN002", "SCAN003"]);
    }

    #[test]
    fn test_whitespace_trimmed() {
        let (mut collector, log) = recording(ScanConfig::default());

        let now = type_text(&mut collector, "BARCODE  ", 0, 10);
        collector.on_terminator(now);
        let now = type_text(&mut collector, "  OTHERCODE", now + 400, 10);
        collector.on_terminator(now);

        assert_eq!(*log.borrow(), vec!["BARCODE", "OTHERCODE"]);
    }

    #[test]
    fn test_embedded_whitespace_preserved() {
        let (mut collector, log) = recording(ScanConfig::default());

        let now = type_text(&mut collector, "AB CD EF", 0, 10);
        collector.on_terminator(now);

        assert_eq!(*log.borrow(), vec!["AB CD EF"]);
    }

    #[test]
    fn test_unicode_whitespace_trimmed() {
        let (mut collector, log) = recording(ScanConfig::default());

        let now = type_text(&mut collector, "\u{2003}CODE123\u{a0}", 0, 10);
        collector.on_terminator(now);

        assert_eq!(*log.borrow(), vec!["CODE123"]);
    }

    #[test]
    fn test_whitespace_only_does_not_emit() {
        let config = ScanConfig::builder().min_length(1).build().unwrap();
        let (mut collector, log) = recording(config);

        let now = type_text(&mut collector, "        ", 0, 10);
        collector.on_terminator(now);

        assert!(log.borrow().is_empty());
        assert_eq!(collector.state(), CollectorState::Idle);
    }

    #[test]
    fn test_trimmed_length_is_gated() {
        let (mut collector, log) = recording(ScanConfig::default());

        // 7 characters buffered, only 5 after trimming.
        let now = type_text(&mut collector, " ABCDE ", 0, 10);
        collector.on_terminator(now);

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_reset_discards_burst() {
        let (mut collector, log) = recording(ScanConfig::default());

        let now = type_text(&mut collector, "ABC123", 0, 10);
        let timer = collector.pending_timer().unwrap();
        collector.reset();

        assert_eq!(collector.state(), CollectorState::Idle);
        assert_eq!(collector.buffered(), "");
        assert_eq!(collector.pending_timer(), None);

        // A timer queued before the reset must not emit anything.
        assert!(!collector.on_idle_timeout(timer, timer.deadline()));
        assert!(log.borrow().is_empty());

        let now = type_text(&mut collector, "XYZ789ABC", now, 10);
        collector.on_terminator(now);
        assert_eq!(*log.borrow(), vec!["XYZ789ABC"]);
    }

    #[test]
    fn test_reset_when_idle_is_noop() {
        let (mut collector, log) = recording(ScanConfig::default());
        collector.reset();
        collector.reset();
        assert_eq!(collector.state(), CollectorState::Idle);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_reset_keeps_debounce_memory() {
        let (mut collector, log) = recording(ScanConfig::default());

        let now = type_text(&mut collector, "BARCODE123", 0, 10);
        collector.on_terminator(now);
        collector.reset();

        let now = type_text(&mut collector, "BARCODE123", now + 50, 10);
        collector.on_terminator(now);

        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_new_char_supersedes_timer() {
        let (mut collector, log) = recording(ScanConfig::default());

        let first = collector.on_printable_char('A', 0);
        let second = collector.on_printable_char('B', 10);
        assert_ne!(first, second);
        assert_eq!(collector.pending_timer(), Some(second));

        assert!(!collector.on_idle_timeout(first, 70));
        assert_eq!(collector.buffered(), "AB");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_terminator_cancels_timer() {
        let (mut collector, log) = recording(ScanConfig::default());

        let now = type_text(&mut collector, "ABC12345", 0, 10);
        let timer = collector.pending_timer().unwrap();
        collector.on_terminator(now);
        assert_eq!(log.borrow().len(), 1);

        assert!(!collector.on_idle_timeout(timer, timer.deadline()));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn test_terminator_when_idle_is_noop() {
        let (mut collector, log) = recording(ScanConfig::default());
        collector.on_terminator(0);
        assert_eq!(collector.state(), CollectorState::Idle);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_single_char_rejected_even_with_min_length_one() {
        let config = ScanConfig::builder().min_length(1).build().unwrap();
        let (mut collector, log) = recording(config);

        collector.on_printable_char('A', 0);
        collector.on_terminator(5);

        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_state_transitions() {
        let mut collector = collector(ScanConfig::default());
        assert_eq!(collector.state(), CollectorState::Idle);

        collector.on_printable_char('A', 0);
        assert_eq!(collector.state(), CollectorState::Accumulating);
        assert!(collector.pending_timer().is_some());

        collector.on_printable_char('B', 5);
        assert_eq!(collector.state(), CollectorState::Accumulating);

        collector.on_terminator(10);
        assert_eq!(collector.state(), CollectorState::Idle);
        assert!(collector.pending_timer().is_none());
    }

    #[test]
    fn test_non_monotonic_timestamps_tolerated() {
        let (mut collector, log) = recording(ScanConfig::default());

        for (i, c) in "ABCDEFGH".chars().enumerate() {
            collector.on_printable_char(c, 1000 - (i as Millis) * 10);
        }
        collector.on_terminator(900);

        assert_eq!(*log.borrow(), vec!["ABCDEFGH"]);
    }

    #[test]
    fn test_extreme_timestamps_do_not_panic() {
        let (mut collector, _log) = recording(ScanConfig::default());

        collector.on_printable_char('A', Millis::MAX);
        collector.on_printable_char('B', Millis::MIN);
        let timer = collector.on_printable_char('C', Millis::MAX);
        assert_eq!(timer.deadline(), Millis::MAX);
        collector.on_idle_timeout(timer, Millis::MIN);
        assert_eq!(collector.state(), CollectorState::Idle);
    }

    #[test]
    fn test_on_input_dispatch() {
        let (mut collector, log) = recording(ScanConfig::default());

        let mut now = 0;
        for c in "ABC12345".chars() {
            assert!(collector.on_input(WedgeInput::Char(c), now).is_some());
            now += 10;
        }
        assert!(collector.on_input(WedgeInput::Terminator, now).is_none());

        assert_eq!(*log.borrow(), vec!["ABC12345"]);
    }

    #[test]
    fn test_into_sink_returns_sink() {
        let mut count = 0;
        let mut collector =
            ScanCollector::new(ScanConfig::default(), |_code: String| count += 1).unwrap();

        let now = type_text(&mut collector, "ABC12345", 0, 10);
        collector.on_terminator(now);

        let mut sink = collector.into_sink();
        sink.on_scan("MANUAL".to_string());
        drop(sink);

        assert_eq!(count, 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ScanConfig {
            min_length: 0,
            ..ScanConfig::default()
        };
        let result = ScanCollector::new(config, |_code: String| {});
        assert!(matches!(result, Err(ScanError::Configuration(_))));
    }

    #[test]
    fn test_debug_output() {
        let collector = collector(ScanConfig::default());
        let output = format!("{:?}", collector);
        assert!(output.starts_with("ScanCollector"));
    }
}

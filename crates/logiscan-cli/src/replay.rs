//! Offline replay of keystroke traces through a [`ScanCollector`].
//!
//! The trace timestamps are the only clock. A pending idle timer fires when
//! the next event is at or past its deadline, before that event is applied,
//! and once more after the last event.

use logiscan_core::{Millis, ScanConfig};
use logiscan_hid::input::classify_char;
use logiscan_hid::{ScanCollector, ScanSink, WedgeInput};
use serde::Serialize;
use tracing::debug;

use crate::trace::{TraceEvent, TraceToken};

/// A scan accepted during replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayedScan {
    /// Trace time at which the scan was finalized.
    pub at: Millis,

    pub code: String,
}

#[derive(Debug, Default)]
struct Accepted(Vec<String>);

impl ScanSink for Accepted {
    fn on_scan(&mut self, code: String) {
        self.0.push(code);
    }
}

/// Replay `events` and return every accepted scan in order.
///
/// # Errors
///
/// Returns an error if `config` is invalid.
pub fn replay(events: &[TraceEvent], config: ScanConfig) -> logiscan_hid::Result<Vec<ReplayedScan>> {
    let mut collector = ScanCollector::new(config, Accepted::default())?;
    let mut scans = Vec::new();

    for event in events {
        fire_due_timer(&mut collector, event.at, &mut scans);

        match event.token {
            TraceToken::Key(c) => match classify_char(c) {
                Some(WedgeInput::Char(c)) => {
                    collector.on_printable_char(c, event.at);
                }
                Some(WedgeInput::Terminator) => collector.on_terminator(event.at),
                None => debug!(char = ?c, at = event.at, "Ignoring unsupported character"),
            },
            TraceToken::Terminator => collector.on_terminator(event.at),
            TraceToken::Reset => collector.reset(),
        }
        drain(&mut collector, event.at, &mut scans);
    }

    if let Some(timer) = collector.pending_timer() {
        collector.on_idle_timeout(timer, timer.deadline());
        drain(&mut collector, timer.deadline(), &mut scans);
    }

    Ok(scans)
}

fn fire_due_timer(collector: &mut ScanCollector<Accepted>, now: Millis, scans: &mut Vec<ReplayedScan>) {
    if let Some(timer) = collector.pending_timer()
        && timer.deadline() <= now
    {
        collector.on_idle_timeout(timer, timer.deadline());
        drain(collector, timer.deadline(), scans);
    }
}

fn drain(collector: &mut ScanCollector<Accepted>, at: Millis, scans: &mut Vec<ReplayedScan>) {
    scans.extend(
        collector
            .sink_mut()
            .0
            .drain(..)
            .map(|code| ReplayedScan { at, code }),
    );
}

//! Scan manager.
//!
//! This module provides the [`ScanManager`], which drives a [`ScanCollector`]
//! from real input sources and owns its idle timer.
//!
//! # Architecture
//!
//! One actor task exclusively owns the collector. Keystrokes, broadcast
//! payloads, control commands and the single armed idle timer are all
//! multiplexed with `tokio::select!` on that task, so a new keystroke always
//! cancels the previous timer before it is appended and a reset can never
//! race a timer that is already due.
//!
//! ```text
//! ┌──────────────┐
//! │ Wedge device │──────►┌───────────────────┐
//! └──────────────┘       │                   │
//! ┌──────────────┐       │    Scan actor     │      ┌────────────┐
//! │ Broadcast    │──────►│  (ScanCollector + │─────►│ ScanHandle │
//! └──────────────┘       │   idle timer)     │      └────────────┘
//! ┌──────────────┐       │                   │
//! │ ScanHandle   │──────►│                   │
//! │ (commands)   │       └───────────────────┘
//! └──────────────┘
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use logiscan_core::ScanConfig;
//! use logiscan_hid::manager::{ScanEvent, ScanManager};
//! use logiscan_hid::mock::MockWedgeScanner;
//!
//! #[tokio::main]
//! async fn main() -> logiscan_hid::Result<()> {
//!     let mut manager = ScanManager::new(ScanConfig::default())?;
//!
//!     let (scanner, _handle) = MockWedgeScanner::new();
//!     manager.register_wedge(scanner.into());
//!
//!     let mut handle = manager.start();
//!
//!     while let Some(event) = handle.recv().await {
//!         if let ScanEvent::Scanned { code, source } = event {
//!             println!("{source}: {code}");
//!         }
//!     }
//!
//!     handle.shutdown().await
//! }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use logiscan_core::{Clock, Millis, MonotonicClock, ScanConfig};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tracing::{debug, info, trace, warn};

use crate::broadcast::{ScannerResult, decode_payload};
use crate::collector::{IdleTimer, ScanCollector, ScanSink};
use crate::devices::{AnyBroadcastSource, AnyWedgeDevice};
use crate::traits::{BroadcastSource, WedgeDevice};
use crate::{Result, ScanError, ScanSource, WedgeInput};

const EVENT_CHANNEL_CAPACITY: usize = 100;
const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Event delivered to the [`ScanHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScanEvent {
    /// A scan was accepted.
    Scanned {
        /// The accepted code, trimmed.
        code: String,

        /// Where the code came from.
        source: ScanSource,
    },

    /// An input source failed and has been detached.
    DeviceError {
        /// Which source failed.
        source: ScanSource,

        /// Error message.
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Reset,
    Shutdown,
}

/// Handle for receiving scans from a running [`ScanManager`].
pub struct ScanHandle {
    event_rx: mpsc::Receiver<ScanEvent>,
    command_tx: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl ScanHandle {
    /// Receive the next event.
    ///
    /// Returns `None` once every input source has gone away and no burst is
    /// left to finalize.
    pub async fn recv(&mut self) -> Option<ScanEvent> {
        self.event_rx.recv().await
    }

    /// Discard the burst in progress and cancel its idle timer.
    ///
    /// Call this when the screen that owns the capture changes. Keystrokes
    /// sent to the device before the reset, including any still queued, can
    /// no longer produce a scan.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Disconnected` if the manager has stopped.
    pub async fn reset(&self) -> Result<()> {
        self.command_tx
            .send(Command::Reset)
            .await
            .map_err(|_| ScanError::disconnected("Scan manager stopped"))
    }

    /// Stop the manager and wait for its task to finish.
    ///
    /// A burst still in progress is discarded, not finalized.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager task panicked.
    pub async fn shutdown(self) -> Result<()> {
        // The actor may already have stopped on its own.
        let _ = self.command_tx.send(Command::Shutdown).await;
        drop(self.event_rx);

        match self.task.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(ScanError::other(format!("Scan manager task failed: {e}"))),
        }
    }
}

impl std::fmt::Debug for ScanHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanHandle").finish_non_exhaustive()
    }
}

/// Drives a [`ScanCollector`] from registered input sources.
///
/// # Lifecycle
///
/// 1. Create the manager with a validated [`ScanConfig`]
/// 2. Register sources with `register_*`
/// 3. Call [`start`](Self::start) to spawn the actor and get a [`ScanHandle`]
/// 4. Receive [`ScanEvent`]s from the handle
/// 5. Call [`ScanHandle::shutdown`] when done
pub struct ScanManager {
    collector: ScanCollector<Emitted>,
    clock: Arc<dyn Clock>,
    wedge: Option<AnyWedgeDevice>,
    broadcast: Option<AnyBroadcastSource>,
}

impl ScanManager {
    /// Create a manager using a [`MonotonicClock`] started now.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Configuration` if `config` is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use logiscan_core::ScanConfig;
    /// use logiscan_hid::ScanManager;
    ///
    /// assert!(ScanManager::new(ScanConfig::default()).is_ok());
    ///
    /// let invalid = ScanConfig { min_length: 0, ..ScanConfig::default() };
    /// assert!(ScanManager::new(invalid).is_err());
    /// ```
    pub fn new(config: ScanConfig) -> Result<Self> {
        Ok(Self {
            collector: ScanCollector::new(config, Emitted::default())?,
            clock: Arc::new(MonotonicClock::new()),
            wedge: None,
            broadcast: None,
        })
    }

    /// Replace the time source used to stamp input.
    ///
    /// Idle timers still sleep on Tokio's timer, so the clock should advance
    /// at the same rate.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Register the keyboard-wedge device.
    pub fn register_wedge(&mut self, device: AnyWedgeDevice) {
        self.wedge = Some(device);
    }

    /// Register the broadcast scanner source.
    pub fn register_broadcast(&mut self, source: AnyBroadcastSource) {
        self.broadcast = Some(source);
    }

    /// The configuration scans are gated with.
    pub fn config(&self) -> &ScanConfig {
        self.collector.config()
    }

    /// Spawn the actor task and return its handle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> ScanHandle {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        info!(
            wedge = self.wedge.is_some(),
            broadcast = self.broadcast.is_some(),
            "Starting scan manager"
        );

        let actor = ScanActor {
            collector: self.collector,
            clock: self.clock,
            wedge: self.wedge,
            broadcast: self.broadcast,
            armed: None,
            event_tx,
            command_rx,
        };

        ScanHandle {
            event_rx,
            command_tx,
            task: tokio::spawn(actor.run()),
        }
    }
}

impl std::fmt::Debug for ScanManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanManager")
            .field("collector", &self.collector)
            .field("wedge", &self.wedge)
            .field("broadcast", &self.broadcast)
            .finish_non_exhaustive()
    }
}

/// Sink that parks accepted codes until the actor forwards them.
#[derive(Debug, Default)]
struct Emitted(Vec<String>);

impl ScanSink for Emitted {
    fn on_scan(&mut self, code: String) {
        self.0.push(code);
    }
}

/// The one real timer backing the collector's pending [`IdleTimer`].
struct ArmedTimer {
    timer: IdleTimer,
    sleep: Pin<Box<Sleep>>,
}

struct ScanActor {
    collector: ScanCollector<Emitted>,
    clock: Arc<dyn Clock>,
    wedge: Option<AnyWedgeDevice>,
    broadcast: Option<AnyBroadcastSource>,
    armed: Option<ArmedTimer>,
    event_tx: mpsc::Sender<ScanEvent>,
    command_rx: mpsc::Receiver<Command>,
}

impl ScanActor {
    async fn run(mut self) {
        while self.wedge.is_some() || self.broadcast.is_some() || self.armed.is_some() {
            let keep_running = tokio::select! {
                biased;

                command = self.command_rx.recv() => match command {
                    Some(Command::Reset) => {
                        let queued = self.discard_queued_input();
                        debug!(
                            discarded = self.collector.buffered().len(),
                            queued,
                            "Resetting scan collector"
                        );
                        self.collector.reset();
                        self.sync_timer();
                        true
                    }
                    Some(Command::Shutdown) | None => false,
                },

                timer = fired(&mut self.armed) => {
                    self.armed = None;
                    let now = self.clock.now_ms();
                    self.collector.on_idle_timeout(timer, now);
                    self.sync_timer();
                    self.forward(ScanSource::Wedge).await
                }

                input = next_input(&mut self.wedge) => match input {
                    Ok(input) => {
                        let now = self.clock.now_ms();
                        self.collector.on_input(input, now);
                        self.sync_timer();
                        self.forward(ScanSource::Wedge).await
                    }
                    Err(e) => {
                        warn!(error = %e, "Wedge device failed");
                        self.wedge = None;
                        self.send(ScanEvent::DeviceError {
                            source: ScanSource::Wedge,
                            error: e.to_string(),
                        })
                        .await
                    }
                },

                payload = next_payload(&mut self.broadcast) => match payload {
                    Ok(payload) => self.on_payload(&payload).await,
                    Err(e) => {
                        warn!(error = %e, "Broadcast source failed");
                        self.broadcast = None;
                        self.send(ScanEvent::DeviceError {
                            source: ScanSource::Broadcast,
                            error: e.to_string(),
                        })
                        .await
                    }
                },
            };

            if !keep_running {
                break;
            }
        }

        info!("Scan manager stopped");
    }

    /// Drop keystrokes the device has queued but the collector has not seen.
    ///
    /// A disconnect is left for the next `read_input` to report.
    fn discard_queued_input(&mut self) -> usize {
        let Some(device) = self.wedge.as_mut() else {
            return 0;
        };

        let mut discarded = 0;
        while let Ok(Some(_)) = device.try_read_input() {
            discarded += 1;
        }
        discarded
    }

    /// Arm, re-arm or disarm the real timer to match the collector.
    fn sync_timer(&mut self) {
        let pending = self.collector.pending_timer();
        if self.armed.as_ref().map(|armed| armed.timer) == pending {
            return;
        }

        self.armed = pending.map(|timer| {
            let remaining: Millis = timer.deadline().saturating_sub(self.clock.now_ms());
            let delay = Duration::from_millis(u64::try_from(remaining).unwrap_or(0));
            trace!(generation = timer.generation(), ?delay, "Arming idle timer");
            ArmedTimer {
                timer,
                sleep: Box::pin(tokio::time::sleep(delay)),
            }
        });
    }

    async fn on_payload(&mut self, payload: &str) -> bool {
        match decode_payload(payload).and_then(ScannerResult::into_barcode) {
            Ok(code) => {
                info!(code = %code, "Broadcast scan received");
                self.send(ScanEvent::Scanned {
                    code,
                    source: ScanSource::Broadcast,
                })
                .await
            }
            Err(e) => {
                warn!(error = %e, "Dropping broadcast payload");
                true
            }
        }
    }

    async fn forward(&mut self, source: ScanSource) -> bool {
        let codes = std::mem::take(&mut self.collector.sink_mut().0);
        for code in codes {
            if !self.send(ScanEvent::Scanned { code, source }).await {
                return false;
            }
        }
        true
    }

    /// Returns `false` once the handle has been dropped.
    async fn send(&self, event: ScanEvent) -> bool {
        self.event_tx.send(event).await.is_ok()
    }
}

async fn fired(armed: &mut Option<ArmedTimer>) -> IdleTimer {
    match armed {
        Some(armed) => {
            armed.sleep.as_mut().await;
            armed.timer
        }
        None => std::future::pending().await,
    }
}

async fn next_input(device: &mut Option<AnyWedgeDevice>) -> Result<WedgeInput> {
    match device {
        Some(device) => device.read_input().await,
        None => std::future::pending().await,
    }
}

async fn next_payload(source: &mut Option<AnyBroadcastSource>) -> Result<String> {
    match source {
        Some(source) => source.recv_payload().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBroadcastScanner, MockWedgeScanner, MockWedgeScannerHandle};
    use logiscan_core::ManualClock;
    use tokio::time::{Instant, sleep, timeout};

    const QUIET: Duration = Duration::from_secs(2);

    fn wedge_manager() -> (ScanHandle, MockWedgeScannerHandle) {
        let mut manager = ScanManager::new(ScanConfig::default()).unwrap();
        let (scanner, scanner_handle) = MockWedgeScanner::new();
        manager.register_wedge(scanner.into());
        (manager.start(), scanner_handle)
    }

    fn scanned(code: &str, source: ScanSource) -> ScanEvent {
        ScanEvent::Scanned {
            code: code.to_string(),
            source,
        }
    }

    #[test]
    fn test_manager_rejects_invalid_config() {
        let config = ScanConfig {
            min_length: 0,
            ..ScanConfig::default()
        };

        assert!(matches!(
            ScanManager::new(config),
            Err(ScanError::Configuration(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_with_terminator() {
        let (mut handle, scanner) = wedge_manager();

        scanner
            .type_code("ABC12345", Duration::from_millis(10), true)
            .await
            .unwrap();

        assert_eq!(
            handle.recv().await,
            Some(scanned("ABC12345", ScanSource::Wedge))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_finalized_by_idle_timer() {
        let (mut handle, scanner) = wedge_manager();
        let start = Instant::now();

        scanner.send_text("ZX-99887").await.unwrap();

        assert_eq!(
            handle.recv().await,
            Some(scanned("ZX-99887", ScanSource::Wedge))
        );
        assert!(start.elapsed() >= Duration::from_millis(70));
    }

    #[tokio::test(start_paused = true)]
    async fn test_human_typing_ignored() {
        let (mut handle, scanner) = wedge_manager();

        scanner
            .type_code("hello world", Duration::from_millis(120), true)
            .await
            .unwrap();

        assert!(timeout(QUIET, handle.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_pending_burst() {
        let (mut handle, scanner) = wedge_manager();

        scanner.send_text("ABC12345").await.unwrap();
        sleep(Duration::from_millis(5)).await;
        handle.reset().await.unwrap();

        assert!(timeout(QUIET, handle.recv()).await.is_err());

        // The collector keeps working after a reset.
        scanner.send_text("NEXT0001\n").await.unwrap();
        assert_eq!(
            handle.recv().await,
            Some(scanned("NEXT0001", ScanSource::Wedge))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_input_still_queued() {
        let (mut handle, scanner) = wedge_manager();

        scanner.send_text("ABC12345").await.unwrap();
        handle.reset().await.unwrap();

        assert!(timeout(QUIET, handle.recv()).await.is_err());

        scanner.send_text("NEXT0002\n").await.unwrap();
        assert_eq!(
            handle.recv().await,
            Some(scanned("NEXT0002", ScanSource::Wedge))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_scan_debounced() {
        let (mut handle, scanner) = wedge_manager();

        scanner.send_text("DUP12345\n").await.unwrap();
        assert_eq!(
            handle.recv().await,
            Some(scanned("DUP12345", ScanSource::Wedge))
        );

        sleep(Duration::from_millis(100)).await;
        scanner.send_text("DUP12345\n").await.unwrap();
        assert!(timeout(Duration::from_millis(150), handle.recv()).await.is_err());

        sleep(Duration::from_millis(300)).await;
        scanner.send_text("DUP12345\n").await.unwrap();
        assert_eq!(
            handle.recv().await,
            Some(scanned("DUP12345", ScanSource::Wedge))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_reports_device_error_and_stops() {
        let (mut handle, scanner) = wedge_manager();

        drop(scanner);

        assert!(matches!(
            handle.recv().await,
            Some(ScanEvent::DeviceError {
                source: ScanSource::Wedge,
                ..
            })
        ));
        assert_eq!(handle.recv().await, None);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_finalized_after_disconnect() {
        let (mut handle, scanner) = wedge_manager();

        scanner.send_text("LAST0001").await.unwrap();
        drop(scanner);

        assert!(matches!(
            handle.recv().await,
            Some(ScanEvent::DeviceError { .. })
        ));
        assert_eq!(
            handle.recv().await,
            Some(scanned("LAST0001", ScanSource::Wedge))
        );
        assert_eq!(handle.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_scans_bypass_gates() {
        let mut manager = ScanManager::new(ScanConfig::default()).unwrap();
        let (source, source_handle) = MockBroadcastScanner::new();
        manager.register_broadcast(source.into());
        let mut handle = manager.start();

        source_handle.send_payload("not json").await.unwrap();
        source_handle.send_payload(r#"{"state":"fail"}"#).await.unwrap();
        source_handle.send_barcode(" 42\n").await.unwrap();

        assert_eq!(handle.recv().await, Some(scanned("42", ScanSource::Broadcast)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wedge_and_broadcast_together() {
        let mut manager = ScanManager::new(ScanConfig::default()).unwrap();
        let (scanner, scanner_handle) = MockWedgeScanner::new();
        let (source, source_handle) = MockBroadcastScanner::new();
        manager.register_wedge(scanner.into());
        manager.register_broadcast(source.into());
        let mut handle = manager.start();

        scanner_handle.send_text("WEDGE001\n").await.unwrap();
        assert_eq!(
            handle.recv().await,
            Some(scanned("WEDGE001", ScanSource::Wedge))
        );

        source_handle.send_barcode("WEDGE001").await.unwrap();
        assert_eq!(
            handle.recv().await,
            Some(scanned("WEDGE001", ScanSource::Broadcast))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_clock_stamps_input() {
        // A frozen clock makes every keystroke simultaneous.
        let mut manager = ScanManager::new(ScanConfig::default())
            .unwrap()
            .with_clock(ManualClock::new(1_000));
        let (scanner, scanner_handle) = MockWedgeScanner::new();
        manager.register_wedge(scanner.into());
        let mut handle = manager.start();

        scanner_handle
            .type_code("SLOWBUTOK", Duration::from_millis(60), true)
            .await
            .unwrap();

        assert_eq!(
            handle.recv().await,
            Some(scanned("SLOWBUTOK", ScanSource::Wedge))
        );
    }

    #[tokio::test]
    async fn test_shutdown_without_sources() {
        let manager = ScanManager::new(ScanConfig::default()).unwrap();

        let handle = manager.start();
        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_with_running_source() {
        let (handle, scanner) = wedge_manager();

        scanner.send_text("ABC").await.unwrap();
        handle.shutdown().await.unwrap();

        assert!(scanner.send_input(WedgeInput::Terminator).await.is_err());
    }
}

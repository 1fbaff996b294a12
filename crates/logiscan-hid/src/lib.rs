//! Keyboard-wedge scan detection for LogiScan.
//!
//! Bluetooth barcode scanners paired in HID mode pretend to be keyboards.
//! Their output arrives as ordinary keystrokes, indistinguishable per key
//! from a person typing. This crate tells the two apart by timing: scanners
//! deliver a whole code in a short, fast burst, people do not.
//!
//! # Layers
//!
//! - [`collector`]: the synchronous state machine. Feed it characters,
//!   terminators and fired idle timers with explicit timestamps; it calls a
//!   [`ScanSink`] for every accepted scan.
//! - [`gates`]: the acceptance rules (length, evidence, duration, median
//!   inter-key interval).
//! - [`input`]: keystroke classification and capture-field diffing.
//! - [`manager`]: an async actor that drives a collector from input sources
//!   and owns its idle timer.
//! - [`traits`], [`devices`], [`mock`]: input sources.
//! - [`broadcast`]: decoded payloads from scanners that bypass the keyboard.
//!
//! # Example
//!
//! ```no_run
//! use logiscan_core::ScanConfig;
//! use logiscan_hid::{ScanEvent, ScanManager};
//! use logiscan_hid::mock::MockWedgeScanner;
//!
//! #[tokio::main]
//! async fn main() -> logiscan_hid::Result<()> {
//!     let mut manager = ScanManager::new(ScanConfig::default())?;
//!
//!     let (scanner, scanner_handle) = MockWedgeScanner::new();
//!     manager.register_wedge(scanner.into());
//!     let mut handle = manager.start();
//!
//!     scanner_handle.send_text("4006381333931\n").await?;
//!
//!     if let Some(ScanEvent::Scanned { code, .. }) = handle.recv().await {
//!         println!("Scanned {code}");
//!     }
//!
//!     handle.shutdown().await
//! }
//! ```
//!
//! # Error Handling
//!
//! Fallible operations return [`Result<T>`][error::Result] with the
//! [`ScanError`] type. Rejected bursts are not errors; they are logged at
//! `debug` level and dropped.

pub mod broadcast;
pub mod collector;
pub mod devices;
pub mod error;
pub mod gates;
pub mod input;
pub mod manager;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use collector::{CollectorState, IdleTimer, ScanCollector, ScanSink};
pub use error::{Result, ScanError};
pub use input::WedgeInput;
pub use types::{DeviceInfo, ScanSource};

// Re-export manager types
pub use manager::{ScanEvent, ScanHandle, ScanManager};

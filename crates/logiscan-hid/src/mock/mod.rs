//! Mock scanner implementations for testing and development.
//!
//! This module provides simulated input sources that can be controlled
//! programmatically without requiring a physical scanner.

pub mod broadcast;
pub mod wedge;

// Re-export commonly used types
pub use broadcast::{MockBroadcastScanner, MockBroadcastScannerHandle};
pub use wedge::{MockWedgeScanner, MockWedgeScannerHandle};

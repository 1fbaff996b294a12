//! Shared building blocks for the LogiScan keyboard-wedge scan collector.
//!
//! This crate holds what every other LogiScan crate agrees on: the default
//! tuning constants, the validated [`ScanConfig`], the injected monotonic
//! time source ([`Clock`]) and the core [`Error`] type.

pub mod clock;
pub mod constants;
pub mod error;
pub mod types;

pub use clock::{Clock, ManualClock, Millis, MonotonicClock};
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Scanner input source trait definitions.
//!
//! These traits are the contract between the scan manager and whatever
//! actually produces input: a hidden capture field fed by a Bluetooth
//! keyboard-wedge scanner, or an integrated scanner engine that broadcasts
//! decoded payloads. Mock implementations live in [`crate::mock`].
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::input::WedgeInput;
use crate::types::DeviceInfo;

/// Keyboard-wedge input source.
///
/// Yields one [`WedgeInput`] per keystroke, in arrival order. The source
/// knows nothing about scans; classification happens in the collector.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters, or the enum wrapper
/// [`AnyWedgeDevice`](crate::devices::AnyWedgeDevice) for concrete dispatch.
///
/// # Examples
///
/// ```no_run
/// use logiscan_hid::traits::WedgeDevice;
/// use logiscan_hid::input::WedgeInput;
/// use logiscan_hid::Result;
///
/// async fn read_until_enter<W: WedgeDevice>(device: &mut W) -> Result<String> {
///     let mut text = String::new();
///
///     loop {
///         match device.read_input().await? {
///             WedgeInput::Char(c) => text.push(c),
///             WedgeInput::Terminator => break,
///         }
///     }
///
///     Ok(text)
/// }
/// ```
pub trait WedgeDevice: Send + Sync {
    /// Read the next keystroke.
    ///
    /// Waits asynchronously until input is available. Must be cancel-safe:
    /// the manager races it against the idle timer.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected or a communication
    /// error occurs.
    async fn read_input(&mut self) -> Result<WedgeInput>;

    /// Take the next keystroke if one is already queued, without waiting.
    ///
    /// Returns `Ok(None)` when nothing is queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected and nothing is queued.
    fn try_read_input(&mut self) -> Result<Option<WedgeInput>>;

    /// Get device information.
    async fn get_info(&self) -> Result<DeviceInfo>;
}

/// Source of raw broadcast payloads from an integrated scanner engine.
///
/// Each payload is the JSON string carried by the scanner's broadcast
/// (see [`crate::broadcast`]).
pub trait BroadcastSource: Send + Sync {
    /// Receive the next raw payload.
    ///
    /// Must be cancel-safe.
    ///
    /// # Errors
    ///
    /// Returns an error if the source has been disconnected.
    async fn recv_payload(&mut self) -> Result<String>;
}

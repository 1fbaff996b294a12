//! Enum wrappers for input source dispatch.
//!
//! Native `async fn` in traits is not object-safe, so the scan manager cannot
//! hold a `Box<dyn WedgeDevice>`. These enums give it concrete dispatch over
//! every supported source instead.
//!
//! # Examples
//!
//! ```
//! use logiscan_hid::devices::AnyWedgeDevice;
//! use logiscan_hid::mock::MockWedgeScanner;
//!
//! let (scanner, _handle) = MockWedgeScanner::new();
//! let any_scanner = AnyWedgeDevice::from(scanner);
//! ```

use crate::mock::{MockBroadcastScanner, MockWedgeScanner};
use crate::traits::{BroadcastSource, WedgeDevice};
use crate::{DeviceInfo, Result, WedgeInput};

/// Enum wrapper for keyboard-wedge device dispatch.
///
/// # Examples
///
/// ```
/// use logiscan_hid::devices::AnyWedgeDevice;
/// use logiscan_hid::traits::WedgeDevice;
/// use logiscan_hid::mock::MockWedgeScanner;
///
/// #[tokio::main]
/// async fn main() -> logiscan_hid::Result<()> {
///     let (scanner, _handle) = MockWedgeScanner::new();
///     let any_scanner = AnyWedgeDevice::Mock(scanner);
///
///     let info = any_scanner.get_info().await?;
///     println!("Scanner: {}", info.name);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyWedgeDevice {
    /// Mock scanner for development and testing.
    Mock(MockWedgeScanner),
}

impl WedgeDevice for AnyWedgeDevice {
    async fn read_input(&mut self) -> Result<WedgeInput> {
        match self {
            Self::Mock(device) => device.read_input().await,
        }
    }

    fn try_read_input(&mut self) -> Result<Option<WedgeInput>> {
        match self {
            Self::Mock(device) => device.try_read_input(),
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        match self {
            Self::Mock(device) => device.get_info().await,
        }
    }
}

impl From<MockWedgeScanner> for AnyWedgeDevice {
    fn from(device: MockWedgeScanner) -> Self {
        Self::Mock(device)
    }
}

/// Enum wrapper for broadcast source dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyBroadcastSource {
    /// Mock broadcast scanner for development and testing.
    Mock(MockBroadcastScanner),
}

impl BroadcastSource for AnyBroadcastSource {
    async fn recv_payload(&mut self) -> Result<String> {
        match self {
            Self::Mock(source) => source.recv_payload().await,
        }
    }
}

impl From<MockBroadcastScanner> for AnyBroadcastSource {
    fn from(source: MockBroadcastScanner) -> Self {
        Self::Mock(source)
    }
}

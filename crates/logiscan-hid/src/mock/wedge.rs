//! Mock keyboard-wedge scanner for testing and development.
//!
//! This module provides a simulated wedge input source that can be driven
//! programmatically, either keystroke by keystroke or by "typing" a whole
//! code at scanner speed.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::{
    Result, ScanError,
    input::{WedgeInput, classify_char},
    traits::WedgeDevice,
    types::DeviceInfo,
};

/// Mock keyboard-wedge scanner.
///
/// Receives keystrokes through an internal channel. Tests send them with a
/// [`MockWedgeScannerHandle`].
///
/// # Examples
///
/// ```
/// use logiscan_hid::input::WedgeInput;
/// use logiscan_hid::mock::MockWedgeScanner;
/// use logiscan_hid::traits::WedgeDevice;
///
/// #[tokio::main]
/// async fn main() -> logiscan_hid::Result<()> {
///     let (mut scanner, handle) = MockWedgeScanner::new();
///
///     tokio::spawn(async move {
///         handle.send_text("A1\n").await.unwrap();
///     });
///
///     assert_eq!(scanner.read_input().await?, WedgeInput::Char('A'));
///     assert_eq!(scanner.read_input().await?, WedgeInput::Char('1'));
///     assert_eq!(scanner.read_input().await?, WedgeInput::Terminator);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockWedgeScanner {
    /// Channel receiver for simulated keystrokes
    input_rx: mpsc::Receiver<WedgeInput>,

    /// Device name
    name: String,
}

impl MockWedgeScanner {
    /// Create a new mock scanner with the default name.
    ///
    /// Returns the scanner and a handle that feeds it keystrokes.
    pub fn new() -> (Self, MockWedgeScannerHandle) {
        Self::with_name("Mock Wedge Scanner".to_string())
    }

    /// Create a new mock scanner with a custom name.
    pub fn with_name(name: String) -> (Self, MockWedgeScannerHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);

        let scanner = Self {
            input_rx,
            name: name.clone(),
        };

        let handle = MockWedgeScannerHandle { input_tx, name };

        (scanner, handle)
    }
}

impl Default for MockWedgeScanner {
    fn default() -> Self {
        Self::new().0
    }
}

impl WedgeDevice for MockWedgeScanner {
    async fn read_input(&mut self) -> Result<WedgeInput> {
        self.input_rx
            .recv()
            .await
            .ok_or_else(|| ScanError::disconnected("Wedge input channel closed"))
    }

    fn try_read_input(&mut self) -> Result<Option<WedgeInput>> {
        match self.input_rx.try_recv() {
            Ok(input) => Ok(Some(input)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(ScanError::disconnected("Wedge input channel closed"))
            }
        }
    }

    async fn get_info(&self) -> Result<DeviceInfo> {
        Ok(DeviceInfo::new(self.name.clone(), "Mock Wedge Scanner v1.0")
            .with_firmware_version("1.0.0"))
    }
}

/// Handle for driving a mock wedge scanner.
///
/// Can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockWedgeScannerHandle {
    /// Channel sender for simulated keystrokes
    input_tx: mpsc::Sender<WedgeInput>,

    /// Device name
    name: String,
}

impl MockWedgeScannerHandle {
    /// Send a single keystroke.
    ///
    /// # Errors
    ///
    /// Returns an error if the scanner has been dropped and the channel is closed.
    pub async fn send_input(&self, input: WedgeInput) -> Result<()> {
        self.input_tx
            .send(input)
            .await
            .map_err(|_| ScanError::disconnected("Wedge input channel closed"))
    }

    /// Send every keystroke of `text` without delay.
    ///
    /// Characters are filtered like a capture field would filter them:
    /// line breaks and tabs become terminators, unsupported characters are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed.
    pub async fn send_text(&self, text: &str) -> Result<()> {
        for input in text.chars().filter_map(classify_char) {
            self.send_input(input).await?;
        }
        Ok(())
    }

    /// Type `code` with a fixed delay after every keystroke, like a scanner
    /// (a few milliseconds) or a person (a hundred or more) would.
    ///
    /// Appends a terminator when `terminate` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use logiscan_hid::mock::MockWedgeScanner;
    ///
    /// #[tokio::main]
    /// async fn main() -> logiscan_hid::Result<()> {
    ///     let (_scanner, handle) = MockWedgeScanner::new();
    ///
    ///     handle.type_code("ABC12345", Duration::from_millis(10), true).await?;
    ///
    ///     Ok(())
    /// }
    /// ```
    pub async fn type_code(&self, code: &str, interval: Duration, terminate: bool) -> Result<()> {
        for input in code.chars().filter_map(classify_char) {
            self.send_input(input).await?;
            tokio::time::sleep(interval).await;
        }

        if terminate {
            self.send_input(WedgeInput::Terminator).await?;
        }
        Ok(())
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

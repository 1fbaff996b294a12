//! Mock broadcast scanner for testing and development.

use tokio::sync::mpsc;

use crate::{Result, ScanError, broadcast::ScannerResult, traits::BroadcastSource};

/// Mock integrated scanner engine that delivers raw broadcast payloads.
#[derive(Debug)]
pub struct MockBroadcastScanner {
    payload_rx: mpsc::Receiver<String>,
}

impl MockBroadcastScanner {
    /// Create a new mock broadcast scanner and its handle.
    pub fn new() -> (Self, MockBroadcastScannerHandle) {
        let (payload_tx, payload_rx) = mpsc::channel(32);

        (
            Self { payload_rx },
            MockBroadcastScannerHandle { payload_tx },
        )
    }
}

impl Default for MockBroadcastScanner {
    fn default() -> Self {
        Self::new().0
    }
}

impl BroadcastSource for MockBroadcastScanner {
    async fn recv_payload(&mut self) -> Result<String> {
        self.payload_rx
            .recv()
            .await
            .ok_or_else(|| ScanError::disconnected("Broadcast channel closed"))
    }
}

/// Handle for driving a mock broadcast scanner.
#[derive(Debug, Clone)]
pub struct MockBroadcastScannerHandle {
    payload_tx: mpsc::Sender<String>,
}

impl MockBroadcastScannerHandle {
    /// Send a raw payload string, valid or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the scanner has been dropped.
    pub async fn send_payload(&self, payload: impl Into<String>) -> Result<()> {
        self.payload_tx
            .send(payload.into())
            .await
            .map_err(|_| ScanError::disconnected("Broadcast channel closed"))
    }

    /// Send a well-formed payload announcing `barcode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scanner has been dropped.
    pub async fn send_barcode(&self, barcode: &str) -> Result<()> {
        let result = ScannerResult {
            barcode1: Some(barcode.to_string()),
            barcode_type: None,
            state: Some("ok".to_string()),
        };
        self.send_payload(serde_json::to_string(&result)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::decode_payload;

    #[tokio::test]
    async fn test_send_barcode_round_trips_through_decoder() {
        let (mut scanner, handle) = MockBroadcastScanner::new();

        handle.send_barcode("4006381333931").await.unwrap();

        let payload = scanner.recv_payload().await.unwrap();
        let result = decode_payload(&payload).unwrap();
        assert_eq!(result.barcode(), Some("4006381333931"));
        assert_eq!(result.state.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_send_raw_payload() {
        let (mut scanner, handle) = MockBroadcastScanner::new();

        handle.send_payload("garbage").await.unwrap();

        assert_eq!(scanner.recv_payload().await.unwrap(), "garbage");
    }

    #[tokio::test]
    async fn test_closed_channel() {
        let (mut scanner, handle) = MockBroadcastScanner::new();
        drop(handle);

        assert!(matches!(
            scanner.recv_payload().await,
            Err(ScanError::Disconnected { .. })
        ));
    }
}

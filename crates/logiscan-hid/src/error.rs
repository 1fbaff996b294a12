//! Error types for scanner device operations.
//!
//! Classification itself never fails: a rejected burst is silently dropped.
//! These errors cover the plumbing around it, such as a disconnected input
//! source, an undecodable broadcast payload or an invalid configuration.

/// Result type alias for scanner operations.
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors that can occur around scan collection.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Input source is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Invalid data received from a device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Collector or manager configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] logiscan_core::Error),

    /// Broadcast payload could not be decoded.
    #[error("Payload decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl ScanError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a generic error with custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

//! Broadcast payloads from integrated scanner engines.
//!
//! Rugged handhelds such as the MT93 decode the barcode themselves and
//! announce it with a broadcast (action
//! [`MT93_SCAN_ACTION`](logiscan_core::constants::MT93_SCAN_ACTION)) whose string
//! extra [`MT93_DECODE_DATA_EXTRA`] holds a small JSON document:
//!
//! ```text
//! {"barcode1": "4006381333931", "barcodeType": 3, "state": "ok"}
//! ```
//!
//! Every field is optional. These scans bypass the timing gates because no
//! keystrokes are involved.

use std::collections::HashMap;

use logiscan_core::constants::{MT93_DECODE_DATA_EXTRA, MT93_SCAN_ACTION};
use serde::{Deserialize, Serialize};

use crate::{Result, ScanError};

/// Decoded barcode reported by a broadcast scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerResult {
    /// Decoded barcode text.
    pub barcode1: Option<String>,

    /// Vendor symbology code.
    pub barcode_type: Option<i32>,

    /// Vendor decode state.
    pub state: Option<String>,
}

impl ScannerResult {
    /// The barcode text, trimmed, if present and non-empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use logiscan_hid::broadcast::decode_payload;
    ///
    /// let result = decode_payload(r#"{"barcode1": " 4006381333931\n"}"#).unwrap();
    /// assert_eq!(result.barcode(), Some("4006381333931"));
    ///
    /// let empty = decode_payload(r#"{"barcode1": "  "}"#).unwrap();
    /// assert_eq!(empty.barcode(), None);
    /// ```
    pub fn barcode(&self) -> Option<&str> {
        self.barcode1
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
    }

    /// Take the barcode text, trimmed.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::InvalidData` if the result carries no barcode.
    pub fn into_barcode(self) -> Result<String> {
        match self.barcode() {
            Some(code) => Ok(code.to_string()),
            None => Err(ScanError::invalid_data(format!(
                "broadcast without barcode (state: {})",
                self.state.as_deref().unwrap_or("none")
            ))),
        }
    }

    /// Decode a broadcast if it is a scanner result.
    ///
    /// Returns `Ok(None)` for any other action.
    pub fn from_broadcast(action: &str, extras: &HashMap<String, String>) -> Result<Option<Self>> {
        if action != MT93_SCAN_ACTION {
            return Ok(None);
        }
        Self::from_extras(extras)
    }

    /// Decode the result carried in a broadcast's string extras.
    ///
    /// Returns `Ok(None)` when the broadcast has no decode-data extra.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Decode` if the extra is not a valid payload.
    pub fn from_extras(extras: &HashMap<String, String>) -> Result<Option<Self>> {
        extras
            .get(MT93_DECODE_DATA_EXTRA)
            .map(|payload| decode_payload(payload))
            .transpose()
    }
}

/// Decode a broadcast JSON payload.
///
/// # Errors
///
/// Returns `ScanError::Decode` if `payload` is not a JSON object with the
/// expected field types.
pub fn decode_payload(payload: &str) -> Result<ScannerResult> {
    Ok(serde_json::from_str(payload)?)
}

use crate::{
    Result,
    constants::{
        DEFAULT_DEBOUNCE_MS, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_MAX_MEDIAN_INTER_KEY_MS,
        DEFAULT_MAX_SCAN_DURATION_MS, DEFAULT_MIN_LENGTH,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning for the scan collector.
///
/// Immutable once a collector is built from it. Timeouts are unsigned, so a
/// negative value in a configuration file fails to parse instead of
/// reaching the collector.
///
/// # Examples
///
/// ```
/// use logiscan_core::ScanConfig;
///
/// let config = ScanConfig::builder()
///     .min_length(8)
///     .debounce_ms(500)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.min_length, 8);
/// assert_eq!(config.idle_timeout_ms, 70);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Minimum trimmed length of an accepted code.
    pub min_length: usize,

    /// Silence that finalizes a burst without a terminator.
    pub idle_timeout_ms: u64,

    /// Maximum time between the first and last character of a burst.
    pub max_scan_duration_ms: u64,

    /// Maximum median interval between consecutive characters.
    pub max_median_inter_key_ms: u64,

    /// Window in which an identical code is suppressed.
    pub debounce_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            max_scan_duration_ms: DEFAULT_MAX_SCAN_DURATION_MS,
            max_median_inter_key_ms: DEFAULT_MAX_MEDIAN_INTER_KEY_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl ScanConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Check the configuration for values the collector cannot work with.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if `min_length` is zero or a timeout
    /// does not fit the signed millisecond timeline.
    pub fn validate(&self) -> Result<()> {
        if self.min_length == 0 {
            return Err(Error::invalid_config("min_length", "must be at least 1"));
        }

        for (field, value) in [
            ("idle_timeout_ms", self.idle_timeout_ms),
            ("max_scan_duration_ms", self.max_scan_duration_ms),
            ("max_median_inter_key_ms", self.max_median_inter_key_ms),
            ("debounce_ms", self.debounce_ms),
        ] {
            if i64::try_from(value).is_err() {
                return Err(Error::invalid_config(
                    field,
                    format!("{value}ms is out of range"),
                ));
            }
        }

        Ok(())
    }

    /// Parse a configuration from TOML.
    ///
    /// The tunables live in a `[scan]` table; missing keys keep their
    /// defaults and unknown keys are rejected.
    ///
    /// # Errors
    /// Returns `Error::ConfigParse` on malformed TOML (including negative
    /// timeouts) and `Error::InvalidConfig` if validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use logiscan_core::ScanConfig;
    ///
    /// let config = ScanConfig::from_toml_str("[scan]\nmin_length = 10\n").unwrap();
    /// assert_eq!(config.min_length, 10);
    /// assert_eq!(config.debounce_ms, 300);
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(input)?;
        file.scan.validate()?;
        Ok(file.scan)
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, otherwise the same
    /// errors as [`ScanConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Render the configuration as a TOML document with a `[scan]` table.
    #[must_use]
    pub fn to_toml_string(&self) -> String {
        let file = ConfigFile { scan: *self };
        toml::to_string(&file).unwrap_or_default()
    }
}

/// On-disk layout of a configuration file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    scan: ScanConfig,
}

/// Builder for [`ScanConfig`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    pub fn min_length(mut self, min_length: usize) -> Self {
        self.config.min_length = min_length;
        self
    }

    pub fn idle_timeout_ms(mut self, ms: u64) -> Self {
        self.config.idle_timeout_ms = ms;
        self
    }

    pub fn max_scan_duration_ms(mut self, ms: u64) -> Self {
        self.config.max_scan_duration_ms = ms;
        self
    }

    pub fn max_median_inter_key_ms(mut self, ms: u64) -> Self {
        self.config.max_median_inter_key_ms = ms;
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.config.debounce_ms = ms;
        self
    }

    /// Validate and return the configuration.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if [`ScanConfig::validate`] fails.
    pub fn build(self) -> Result<ScanConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//! Report configuration
//!
//! Thresholds controlling outlier colouring plus the switches that widen the
//! geninfo tables. Values come from defaults, then an optional TOML file, then
//! command-line flags.
//!
//! # Example profsheet.toml
//!
//! ```toml
//! threshold = 0.10
//! low = 1.0
//! high = 3.0
//! show_filter = true
//! ```

use crate::error::ReportError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default minimum relative deviation from the average before a cell is coloured
pub const DEFAULT_THRESHOLD: f64 = 0.15;
/// Default std-dev multiplier for the "elevated" band
pub const DEFAULT_LOW: f64 = 1.5;
/// Default std-dev multiplier for the "severe" band
pub const DEFAULT_HIGH: f64 = 2.0;

/// Configuration for report synthesis
///
/// # Example
/// ```
/// use profsheet::config::ReportConfig;
///
/// let config = ReportConfig::default();
/// assert_eq!(config.threshold, 0.15);
/// assert_eq!(config.high, 2.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Minimum fractional deviation from the average to colorize a cell
    ///
    /// A cell whose value is within `threshold * average` of the average is
    /// never coloured, however many standard deviations away it is.
    pub threshold: f64,

    /// Std-dev multiplier above which a slower-than-average cell is "elevated" (yellow)
    pub low: f64,

    /// Std-dev multiplier above which a cell is "severe" (red) or "favorable" (green)
    pub high: f64,

    /// Verbosity of the report; 1 or more adds the `read`/`translate` geninfo columns
    pub verbose: u8,

    /// Include the filter-stage geninfo categories
    pub show_filter: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            low: DEFAULT_LOW,
            high: DEFAULT_HIGH,
            verbose: 0,
            show_filter: false,
        }
    }
}

impl ReportConfig {
    /// Load configuration from a TOML file
    ///
    /// Keys that are absent keep their default values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    /// Whether the extended geninfo file categories are reported
    pub fn extended(&self) -> bool {
        self.verbose > 0
    }

    /// Check that the thresholds describe non-overlapping colour bands
    pub fn validate(&self) -> std::result::Result<(), ReportError> {
        for (name, value) in [
            ("threshold", self.threshold),
            ("low", self.low),
            ("high", self.high),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ReportError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.low > self.high {
            return Err(ReportError::InvalidConfig(format!(
                "low ({}) must not exceed high ({})",
                self.low, self.high
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = ReportConfig::default();
        assert_eq!(config.threshold, 0.15);
        assert_eq!(config.low, 1.5);
        assert_eq!(config.high, 2.0);
        assert_eq!(config.verbose, 0);
        assert!(!config.show_filter);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ReportConfig::from_toml_str("high = 3.0\nshow_filter = true").unwrap();
        assert_eq!(config.high, 3.0);
        assert!(config.show_filter);
        assert_eq!(config.low, DEFAULT_LOW);
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(ReportConfig::from_toml_str("colour = \"red\"").is_err());
    }

    #[test]
    fn test_negative_threshold_invalid() {
        let config = ReportConfig {
            threshold: -0.1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ReportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_low_above_high_invalid() {
        let config = ReportConfig {
            low: 2.5,
            high: 2.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("low"));
    }

    #[test]
    fn test_extended_follows_verbosity() {
        let mut config = ReportConfig::default();
        assert!(!config.extended());
        config.verbose = 2;
        assert!(config.extended());
    }

    #[test]
    fn test_from_file_reports_missing_path() {
        let err = ReportConfig::from_file("/nonexistent/profsheet.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}

//! Delay-signal configuration and constants.
//!
//! Fixed algorithm constants live here as `pub(crate) const` items; the
//! handful of knobs a sender may want to tune are collected in
//! [`DelaySignalConfig`] and [`BaselineConfig`].
//!
//! Time values are plain `f64` in whatever unit the caller uses for both `rtt`
//! and `now`. The constants assume milliseconds.

use serde::{Deserialize, Serialize};

use crate::error::{DelaySignalError, Result};

// =============================================================================
// RTT Window Parameters
// =============================================================================

/// EWMA weight for the smoothed RTT.
pub(crate) const SRTT_ALPHA: f64 = 1.0 / 16.0;

/// Floor for the longest window horizon: 10 seconds in milliseconds.
pub(crate) const MIN_HORIZON: f64 = 10_000.0;

/// The min-RTT horizon is at least this many min-RTTs long.
pub(crate) const MIN_RTT_HORIZON_MULTIPLIER: f64 = 20.0;

/// Unjittered RTT horizon as a fraction of the smoothed RTT.
pub(crate) const UNJITTERED_SRTT_FACTOR: f64 = 0.5;

/// Classifier windows look back this many smoothed RTTs.
pub(crate) const CLASSIFIER_SRTT_FACTOR: f64 = 4.0;

/// Fraction of the (classifier max - min RTT) spread above the floor that
/// the short-horizon minimum must stay under to signal a queue.
pub(crate) const CLASSIFIER_SPREAD_FRACTION: f64 = 0.1;

/// Number of `(now, rtt)` samples kept for the gradient regression.
pub(crate) const RTT_HISTORY_LEN: usize = 10;

// =============================================================================
// Adaptive Baseline Parameters
// =============================================================================

/// Lower bound for the tuning parameter delta.
pub const MIN_DELTA: f64 = 0.05;

/// Upper bound for the tuning parameter delta.
pub const MAX_DELTA: f64 = 0.5;

/// Consecutive qualifying observations needed before delta moves.
pub(crate) const STREAK_LEN: u32 = 3;

/// Half-width of the (baseline - latest RTT) band used by the delta controller.
pub(crate) const DIFF_BAND: f64 = 2.0;

// =============================================================================
// Configuration Structs
// =============================================================================

/// Configuration for a flow's delay signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelaySignalConfig {
    /// Require a significant RTT gradient before the refined classifier
    /// reports queue building.
    pub use_gradient: bool,

    /// Minimum absolute RTT slope (RTT units per time unit) considered
    /// significant by the refined classifier.
    pub gradient_threshold: f64,

    /// Step applied to delta whenever a hysteresis streak completes.
    pub delta_step: f64,

    /// Adaptive baseline settings.
    pub baseline: BaselineConfig,
}

impl Default for DelaySignalConfig {
    fn default() -> Self {
        Self {
            use_gradient: true,
            gradient_threshold: 10.0,
            delta_step: 0.05,
            baseline: BaselineConfig::default(),
        }
    }
}

impl DelaySignalConfig {
    /// Parse a TOML document and validate the result.
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.gradient_threshold.is_finite() || self.gradient_threshold < 0.0 {
            return Err(DelaySignalError::InvalidConfig(format!(
                "gradient_threshold ({}) must be a finite, non-negative number",
                self.gradient_threshold
            )));
        }
        if !self.delta_step.is_finite() {
            return Err(DelaySignalError::InvalidConfig(format!(
                "delta_step ({}) must be finite",
                self.delta_step
            )));
        }
        self.baseline.validate()
    }
}

/// Configuration for [`AdaptiveDelayBaseline`](crate::AdaptiveDelayBaseline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Delta value at construction and after every reset.
    pub initial_delta: f64,

    /// Number of RTT samples the weighted moving average spans.
    pub history_len: usize,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            initial_delta: MAX_DELTA,
            history_len: 10,
        }
    }
}

impl BaselineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_DELTA..=MAX_DELTA).contains(&self.initial_delta) {
            return Err(DelaySignalError::InvalidConfig(format!(
                "initial_delta ({}) must be in range [{MIN_DELTA}, {MAX_DELTA}]",
                self.initial_delta
            )));
        }
        if self.history_len == 0 {
            return Err(DelaySignalError::InvalidConfig(
                "history_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DelaySignalConfig::default();
        assert!(config.use_gradient);
        assert_eq!(config.gradient_threshold, 10.0);
        assert_eq!(config.baseline.initial_delta, 0.5);
        assert_eq!(config.baseline.history_len, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_srtt_alpha() {
        assert_eq!(SRTT_ALPHA, 0.0625);
    }

    #[test]
    fn test_partial_toml_uses_defaults() -> testresult::TestResult {
        let config = DelaySignalConfig::from_toml_str(
            r#"
            use_gradient = false

            [baseline]
            history_len = 32
            "#,
        )?;
        assert!(!config.use_gradient);
        assert_eq!(config.gradient_threshold, 10.0);
        assert_eq!(config.baseline.history_len, 32);
        assert_eq!(config.baseline.initial_delta, MAX_DELTA);
        Ok(())
    }

    #[test]
    fn test_toml_roundtrip() -> testresult::TestResult {
        let config = DelaySignalConfig {
            gradient_threshold: 2.5,
            ..DelaySignalConfig::default()
        };
        let encoded = toml::to_string(&config)?;
        assert_eq!(DelaySignalConfig::from_toml_str(&encoded)?, config);
        Ok(())
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let err = DelaySignalConfig::from_toml_str("gradient_threshold = -1.0").unwrap_err();
        assert!(matches!(err, DelaySignalError::InvalidConfig(_)));
    }

    #[test]
    fn test_invalid_delta_rejected() {
        let err = DelaySignalConfig::from_toml_str("[baseline]\ninitial_delta = 0.9").unwrap_err();
        assert!(matches!(err, DelaySignalError::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_history_rejected() {
        let config = BaselineConfig {
            history_len: 0,
            ..BaselineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = DelaySignalConfig::from_toml_str("use_gradient = \"maybe\"").unwrap_err();
        assert!(matches!(err, DelaySignalError::ConfigParse(_)));
    }
}

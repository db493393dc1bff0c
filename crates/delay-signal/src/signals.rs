//! Per-flow delay signals consumed by the sending policy.
//!
//! [`FlowDelaySignals`] is what a sender holds for each flow: it feeds every
//! acknowledged packet's RTT into a [`DelaySignalWindow`] and an
//! [`AdaptiveDelayBaseline`] and exposes the signals the decision table
//! reads.
//!
//! ## Usage
//!
//! ```
//! use delay_signal::{DelaySignalConfig, FlowDelaySignals};
//!
//! let mut signals = FlowDelaySignals::new(DelaySignalConfig::default());
//! signals.record_rtt_sample(50.0, 0.0);
//! signals.record_rtt_sample(200.0, 5.0);
//!
//! assert_eq!(signals.min_rtt(), 50.0);
//! assert_eq!(signals.latest_rtt(), 200.0);
//! ```

use crate::baseline::AdaptiveDelayBaseline;
use crate::config::DelaySignalConfig;
use crate::error::Result;
use crate::rtt_window::DelaySignalWindow;
use crate::stats::DelaySignalStats;

/// Delay signals for a single flow.
///
/// Exclusively owned by the flow's sender; create one at flow start and
/// [`reset`](Self::reset) it whenever the flow restarts.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowDelaySignals {
    config: DelaySignalConfig,
    window: DelaySignalWindow,
    baseline: AdaptiveDelayBaseline,
    total_samples: usize,
    dropped_samples: usize,
}

impl Default for FlowDelaySignals {
    fn default() -> Self {
        Self::new(DelaySignalConfig::default())
    }
}

impl FlowDelaySignals {
    pub fn new(config: DelaySignalConfig) -> Self {
        debug_assert!(
            config.validate().is_ok(),
            "invalid delay signal config: {config:?}"
        );
        Self {
            window: DelaySignalWindow::new(&config),
            baseline: AdaptiveDelayBaseline::new(&config.baseline),
            config,
            total_samples: 0,
            dropped_samples: 0,
        }
    }

    /// Validate `config` and build the signals from it.
    pub fn try_new(config: DelaySignalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    /// Record the RTT of an acknowledged packet observed at `now`.
    ///
    /// `rtt` must be finite and non-negative and `now` must not go
    /// backwards. Debug builds panic on violations; release builds clamp a
    /// negative RTT to zero and drop non-finite samples.
    pub fn record_rtt_sample(&mut self, rtt: f64, now: f64) {
        debug_assert!(
            rtt.is_finite() && rtt >= 0.0,
            "rtt ({rtt}) must be finite and non-negative"
        );
        debug_assert!(now.is_finite(), "timestamp ({now}) must be finite");

        if !rtt.is_finite() || !now.is_finite() {
            self.dropped_samples += 1;
            tracing::warn!(rtt, now, "Dropping invalid RTT sample");
            return;
        }
        let rtt = rtt.max(0.0);

        self.window.new_rtt_sample(rtt, now);
        self.baseline.observe(rtt, self.config.delta_step);
        self.total_samples += 1;
    }

    pub fn min_rtt(&self) -> f64 {
        self.window.get_min_rtt()
    }

    pub fn unjittered_rtt(&self) -> f64 {
        self.window.get_unjittered_rtt()
    }

    pub fn latest_rtt(&self) -> f64 {
        self.window.get_latest_rtt()
    }

    pub fn is_congested(&self) -> bool {
        self.window.is_copa()
    }

    /// Queue-building signal gated by the RTT gradient (when enabled).
    ///
    /// `InsufficientData` means the classifier fired but the recent history
    /// has no time spread to estimate a slope from.
    pub fn is_congested_refined(&self) -> Result<bool> {
        self.window.is_copa_refined()
    }

    pub fn weighted_average(&self) -> f64 {
        self.baseline.weighted_average()
    }

    pub fn current_delta(&self) -> f64 {
        self.baseline.current_delta()
    }

    pub fn set_delta(&mut self, delta: f64) {
        self.baseline.set_delta(delta);
    }

    pub fn window(&self) -> &DelaySignalWindow {
        &self.window
    }

    pub fn baseline(&self) -> &AdaptiveDelayBaseline {
        &self.baseline
    }

    pub fn config(&self) -> &DelaySignalConfig {
        &self.config
    }

    /// Start a new flow: identical to a freshly constructed instance.
    pub fn reset(&mut self) {
        tracing::debug!(
            total_samples = self.total_samples,
            dropped_samples = self.dropped_samples,
            "Resetting flow delay signals"
        );
        self.window.clear();
        self.baseline.clear();
        self.total_samples = 0;
        self.dropped_samples = 0;
    }

    pub fn stats(&self) -> DelaySignalStats {
        DelaySignalStats {
            min_rtt: self.window.get_min_rtt(),
            unjittered_rtt: self.window.get_unjittered_rtt(),
            latest_rtt: self.window.get_latest_rtt(),
            smoothed_rtt: self.window.smoothed_rtt(),
            classifier_low: self.window.classifier_low(),
            classifier_high: self.window.classifier_high(),
            is_congested: self.window.is_copa(),
            rtt_gradient: self.window.rtt_gradient().ok(),
            weighted_average: self.baseline.weighted_average(),
            delta: self.baseline.current_delta(),
            total_samples: self.total_samples,
            dropped_samples: self.dropped_samples,
            delta_adjustments: self.baseline.adjustments(),
        }
    }
}

//! RTT window: min RTT, jitter-filtered RTT and the queue-building classifier.
//!
//! [`DelaySignalWindow`] runs four [`SlidingExtremeWindow`]s over the same
//! RTT stream, each with a horizon derived from the current smoothed RTT:
//!
//! | Window | Polarity | Horizon |
//! |--------|----------|---------|
//! | min RTT | min | `max(10s, 20 × min_rtt)` |
//! | unjittered RTT | min | `min(max_time, srtt / 2)` |
//! | classifier low | min | `min(max_time, 4 × srtt)` |
//! | classifier high | max | `min(max_time, 4 × srtt)` |
//!
//! ## Queue-Building Classifier
//!
//! The path is considered to be building a queue when the short-horizon
//! minimum stays close to the floor:
//!
//! ```text
//! classifier_low < min_rtt + 0.1 × (classifier_high − min_rtt)
//! ```
//!
//! The refined classifier additionally requires the least-squares RTT slope
//! over the last 10 samples to exceed a significance threshold.

mod regression;


use std::collections::VecDeque;

use crate::config::{
    DelaySignalConfig, CLASSIFIER_SPREAD_FRACTION, CLASSIFIER_SRTT_FACTOR, MIN_HORIZON,
    MIN_RTT_HORIZON_MULTIPLIER, RTT_HISTORY_LEN, SRTT_ALPHA, UNJITTERED_SRTT_FACTOR,
};
use crate::error::Result;
use crate::extreme_window::{Sample, SlidingExtremeWindow};

use regression::least_squares_slope;

/// Per-flow RTT signal tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct DelaySignalWindow {
    /// Smoothed RTT; `None` until the first sample seeds it.
    srtt: Option<f64>,
    latest_rtt: f64,

    min_rtt: SlidingExtremeWindow,
    unjittered_rtt: SlidingExtremeWindow,
    classifier_low: SlidingExtremeWindow,
    classifier_high: SlidingExtremeWindow,

    /// Last `RTT_HISTORY_LEN` samples, oldest first. Only used for the slope.
    history: VecDeque<Sample>,

    using_gradient: bool,
    gradient_threshold: f64,
}

impl Default for DelaySignalWindow {
    fn default() -> Self {
        Self::new(&DelaySignalConfig::default())
    }
}

impl DelaySignalWindow {
    pub fn new(config: &DelaySignalConfig) -> Self {
        Self::with_gradient(config.use_gradient, config.gradient_threshold)
    }

    pub fn with_gradient(using_gradient: bool, gradient_threshold: f64) -> Self {
        debug_assert!(
            gradient_threshold >= 0.0,
            "gradient_threshold ({gradient_threshold}) must be non-negative"
        );
        Self {
            srtt: None,
            latest_rtt: 0.0,
            min_rtt: SlidingExtremeWindow::new_min(),
            unjittered_rtt: SlidingExtremeWindow::new_min(),
            classifier_low: SlidingExtremeWindow::new_min(),
            classifier_high: SlidingExtremeWindow::new_max(),
            history: VecDeque::with_capacity(RTT_HISTORY_LEN + 1),
            using_gradient,
            gradient_threshold,
        }
    }

    /// Feed one RTT sample observed at `now`.
    ///
    /// The first sample after construction or [`clear`](Self::clear) seeds
    /// the smoothed RTT, so that call leaves `smoothed_rtt() == rtt` exactly.
    /// Horizons are recomputed from the smoothed RTT and the *previous* min
    /// RTT before `rtt` is inserted.
    ///
    /// `rtt` must be finite and non-negative and `now` finite and
    /// non-decreasing. Debug builds panic otherwise; release builds drop
    /// non-finite input, clamp a negative RTT to zero and clamp a late `now`
    /// to the newest timestamp.
    pub fn new_rtt_sample(&mut self, rtt: f64, now: f64) {
        debug_assert!(
            rtt.is_finite() && rtt >= 0.0,
            "rtt ({rtt}) must be finite and non-negative"
        );
        debug_assert!(now.is_finite(), "timestamp ({now}) must be finite");
        if !rtt.is_finite() || !now.is_finite() {
            tracing::warn!(rtt, now, "Ignoring non-finite RTT sample");
            return;
        }
        let rtt = rtt.max(0.0);

        let now = match self.history.back() {
            Some(last) => {
                debug_assert!(
                    now >= last.time,
                    "timestamp moved backwards ({now} < {})",
                    last.time
                );
                now.max(last.time)
            }
            None => now,
        };

        let srtt = match self.srtt {
            // Blending the seed with itself can be off by an ulp
            None => rtt,
            Some(srtt) => SRTT_ALPHA * rtt + (1.0 - SRTT_ALPHA) * srtt,
        };
        self.srtt = Some(srtt);
        self.latest_rtt = rtt;

        let max_time = MIN_HORIZON.max(MIN_RTT_HORIZON_MULTIPLIER * self.min_rtt.extreme());
        let unjittered_horizon = max_time.min(srtt * UNJITTERED_SRTT_FACTOR);
        let classifier_horizon = max_time.min(srtt * CLASSIFIER_SRTT_FACTOR);

        self.min_rtt.update_horizon(max_time);
        self.unjittered_rtt.update_horizon(unjittered_horizon);
        self.classifier_low.update_horizon(classifier_horizon);
        self.classifier_high.update_horizon(classifier_horizon);

        self.min_rtt.new_sample(rtt, now);
        self.unjittered_rtt.new_sample(rtt, now);
        self.classifier_low.new_sample(rtt, now);
        self.classifier_high.new_sample(rtt, now);

        self.history.push_back(Sample {
            time: now,
            value: rtt,
        });
        if self.history.len() > RTT_HISTORY_LEN {
            self.history.pop_front();
        }

        tracing::trace!(
            rtt,
            now,
            srtt,
            min_rtt = self.min_rtt.extreme(),
            unjittered_rtt = self.unjittered_rtt.extreme(),
            max_time,
            classifier_horizon,
            "RTT sample recorded"
        );
    }

    pub fn get_min_rtt(&self) -> f64 {
        self.min_rtt.extreme()
    }

    pub fn get_unjittered_rtt(&self) -> f64 {
        self.unjittered_rtt.extreme()
    }

    pub fn get_latest_rtt(&self) -> f64 {
        self.latest_rtt
    }

    /// Smoothed RTT, `0.0` before the first sample.
    pub fn smoothed_rtt(&self) -> f64 {
        self.srtt.unwrap_or(0.0)
    }

    pub fn classifier_low(&self) -> f64 {
        self.classifier_low.extreme()
    }

    pub fn classifier_high(&self) -> f64 {
        self.classifier_high.extreme()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn has_samples(&self) -> bool {
        !self.min_rtt.is_empty()
    }

    pub fn gradient_enabled(&self) -> bool {
        self.using_gradient
    }

    pub fn gradient_threshold(&self) -> f64 {
        self.gradient_threshold
    }

    /// Delay-based queue-building signal.
    ///
    /// Always `false` before the first sample: the infinite sentinels make
    /// the threshold NaN and the comparison fails.
    pub fn is_copa(&self) -> bool {
        let min_rtt = self.min_rtt.extreme();
        let threshold =
            min_rtt + CLASSIFIER_SPREAD_FRACTION * (self.classifier_high.extreme() - min_rtt);
        self.classifier_low.extreme() < threshold
    }

    /// [`is_copa`](Self::is_copa) gated by a significant RTT gradient.
    ///
    /// With the gradient refinement disabled this is `Ok(self.is_copa())`.
    /// Otherwise returns `InsufficientData` when the classifier fires but the
    /// history holds fewer than two distinct timestamps.
    pub fn is_copa_refined(&self) -> Result<bool> {
        if !self.is_copa() {
            return Ok(false);
        }
        if !self.using_gradient {
            return Ok(true);
        }
        let gradient = self.rtt_gradient()?;
        Ok(gradient.abs() > self.gradient_threshold)
    }

    /// Least-squares slope of RTT over time across the bounded history.
    pub fn rtt_gradient(&self) -> Result<f64> {
        least_squares_slope(&self.history)
    }

    /// Reset to the freshly constructed state, keeping the gradient settings.
    pub fn clear(&mut self) {
        self.srtt = None;
        self.latest_rtt = 0.0;
        self.min_rtt.clear();
        self.unjittered_rtt.clear();
        self.classifier_low.clear();
        self.classifier_high.clear();
        self.history.clear();
    }
}

//! Adaptive delay baseline.
//!
//! Keeps a linearly weighted moving average (WMA) over the most recent RTT
//! samples and runs a debounced controller that nudges a bounded tuning
//! parameter, delta, whenever the latest RTT sits on the same side of the
//! baseline for several consecutive observations.

use std::collections::VecDeque;

use crate::config::{BaselineConfig, DIFF_BAND, MAX_DELTA, MIN_DELTA, STREAK_LEN};
use crate::error::{DelaySignalError, Result};

/// Linearly weighted moving average, oldest value first.
///
/// The value at position `i` carries weight `i + 1`, so the newest sample
/// dominates. An empty history yields `0.0` ("no data yet").
pub fn weighted_moving_average<I>(history: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (weighted_sum, weight_sum) = history.into_iter().zip(1u32..).fold(
        (0.0, 0.0),
        |(weighted_sum, weight_sum), (value, weight)| {
            let weight = f64::from(weight);
            (weighted_sum + value * weight, weight_sum + weight)
        },
    );

    if weight_sum > 0.0 {
        weighted_sum / weight_sum
    } else {
        0.0
    }
}

/// Population standard deviation.
pub fn standard_deviation(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(DelaySignalError::insufficient(1, 0));
    }
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    Ok(variance.sqrt())
}

/// Weighted RTT baseline plus the hysteresis-controlled delta.
///
/// Each flow owns its own instance: the streak counters are per-instance
/// state, so one flow's history never leaks into another's controller.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveDelayBaseline {
    /// Its length is the capacity of `history`. The average itself always
    /// uses linear weights.
    weights: Vec<f64>,
    history: VecDeque<f64>,
    delta: f64,
    initial_delta: f64,
    /// Consecutive observations with `baseline - latest < DIFF_BAND`.
    below_streak: u32,
    /// Consecutive observations that fell through to the second band.
    above_streak: u32,
    adjustments: usize,
}

impl Default for AdaptiveDelayBaseline {
    fn default() -> Self {
        Self::new(&BaselineConfig::default())
    }
}

impl AdaptiveDelayBaseline {
    pub fn new(config: &BaselineConfig) -> Self {
        let weights = (1..=config.history_len).map(|w| w as f64).collect();
        Self::with_weights(weights, config.initial_delta)
    }

    pub fn with_weights(weights: Vec<f64>, initial_delta: f64) -> Self {
        debug_assert!(!weights.is_empty(), "weight vector must not be empty");
        Self {
            history: VecDeque::with_capacity(weights.len()),
            weights,
            delta: initial_delta,
            initial_delta,
            below_streak: 0,
            above_streak: 0,
            adjustments: 0,
        }
    }

    /// Append an RTT to the bounded history, evicting the oldest once full.
    pub fn record_rtt(&mut self, rtt: f64) {
        let capacity = self.weights.len().max(1);
        while self.history.len() >= capacity {
            self.history.pop_front();
        }
        self.history.push_back(rtt);
    }

    /// WMA over the recorded history; `0.0` before any RTT was recorded.
    pub fn weighted_average(&self) -> f64 {
        weighted_moving_average(self.history.iter().copied())
    }

    /// Record `rtt` and run the controller against the refreshed baseline.
    pub fn observe(&mut self, rtt: f64, step: f64) -> f64 {
        self.record_rtt(rtt);
        let baseline = self.weighted_average();
        self.adjust_delta(baseline, rtt, step)
    }

    /// Debounced delta controller.
    ///
    /// With `diff = baseline - latest_rtt`:
    ///
    /// - `diff < 2.0` extends the *below* streak and resets *above*
    /// - otherwise `diff > -2.0` extends the *above* streak and resets *below*
    /// - otherwise (only reachable for NaN) both streaks reset
    ///
    /// Three in a row on *below* lowers delta by `step`, three on *above*
    /// raises it. The result is always clamped to `[0.05, 0.5]`.
    ///
    /// Note the bands overlap on `(-2.0, 2.0)` and the first one wins there,
    /// so *above* only ever counts `diff >= 2.0`. This looks like a defect
    /// (disjoint bands were probably intended) but is kept so existing
    /// tuning tables keep their meaning.
    pub fn adjust_delta(&mut self, baseline: f64, latest_rtt: f64, step: f64) -> f64 {
        let diff = baseline - latest_rtt;

        if diff < DIFF_BAND {
            self.below_streak += 1;
            self.above_streak = 0;
        } else if diff > -DIFF_BAND {
            self.above_streak += 1;
            self.below_streak = 0;
        } else {
            self.below_streak = 0;
            self.above_streak = 0;
        }

        let previous = self.delta;
        if self.below_streak >= STREAK_LEN {
            self.delta -= step;
            self.below_streak = 0;
        } else if self.above_streak >= STREAK_LEN {
            self.delta += step;
            self.above_streak = 0;
        }

        // min/max rather than clamp: a NaN delta collapses to the bound
        self.delta = MIN_DELTA.max(MAX_DELTA.min(self.delta));

        if self.delta != previous {
            self.adjustments += 1;
            tracing::debug!(
                old_delta = previous,
                new_delta = self.delta,
                diff,
                baseline,
                latest_rtt,
                "Delay baseline delta adjusted"
            );
        }

        self.delta
    }

    /// Override delta. Not clamped here; the next `adjust_delta` clamps it.
    pub fn set_delta(&mut self, delta: f64) {
        self.delta = delta;
    }

    pub fn current_delta(&self) -> f64 {
        self.delta
    }

    /// `(below, above)` streak lengths.
    pub fn streaks(&self) -> (u32, u32) {
        (self.below_streak, self.above_streak)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Number of `adjust_delta` calls that changed delta.
    pub fn adjustments(&self) -> usize {
        self.adjustments
    }

    /// Standard deviation of the recorded RTT history.
    pub fn rtt_deviation(&self) -> Result<f64> {
        let values: Vec<f64> = self.history.iter().copied().collect();
        standard_deviation(&values)
    }

    /// Back to the freshly constructed state.
    pub fn clear(&mut self) {
        self.history.clear();
        self.delta = self.initial_delta;
        self.below_streak = 0;
        self.above_streak = 0;
        self.adjustments = 0;
    }
}

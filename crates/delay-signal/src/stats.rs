//! Point-in-time view of a flow's delay signals.
//!
//! [`DelaySignalStats`] copies every derived signal plus the sample counters
//! out of a [`FlowDelaySignals`](crate::FlowDelaySignals) so it can be logged
//! or serialised without borrowing the flow.

use serde::Serialize;

/// Snapshot of a flow's delay signals.
///
/// RTT fields use the caller's time unit. Before the first sample the
/// windowed fields hold their sentinels (`min_rtt` is `+inf`,
/// `classifier_high` is `-inf`); check `total_samples` first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelaySignalStats {
    /// Minimum RTT over the long horizon.
    pub min_rtt: f64,
    /// Minimum RTT over half a smoothed RTT (jitter-filtered RTT).
    pub unjittered_rtt: f64,
    /// Most recent RTT sample.
    pub latest_rtt: f64,
    /// EWMA of the RTT stream.
    pub smoothed_rtt: f64,
    /// Windowed minimum over four smoothed RTTs.
    pub classifier_low: f64,
    /// Windowed maximum over four smoothed RTTs.
    pub classifier_high: f64,
    /// Plain queue-building classifier.
    pub is_congested: bool,
    /// RTT slope over the recent history, when it can be computed.
    pub rtt_gradient: Option<f64>,
    /// Weighted moving average of recent RTTs.
    pub weighted_average: f64,
    /// Current tuning parameter.
    pub delta: f64,
    /// Samples accepted since the last reset.
    pub total_samples: usize,
    /// Samples rejected as invalid since the last reset.
    pub dropped_samples: usize,
    /// Number of delta changes since the last reset.
    pub delta_adjustments: usize,
}

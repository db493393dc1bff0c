use thiserror::Error;

#[derive(Debug, Error)]
pub enum DelaySignalError {
    /// A statistic was requested over fewer samples than it is defined for.
    ///
    /// For the RTT gradient `available` counts *distinct* timestamps, since
    /// repeated timestamps do not contribute to the regression denominator.
    #[error("insufficient data for estimation, need {required} samples, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T, E = DelaySignalError> = std::result::Result<T, E>;

impl DelaySignalError {
    pub(crate) fn insufficient(required: usize, available: usize) -> Self {
        Self::InsufficientData {
            required,
            available,
        }
    }

    /// Whether the error only means "not enough samples yet".
    ///
    /// Callers on the ACK path typically treat this as "no signal" and keep
    /// going, while configuration errors are fatal.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

//! Domain error types.

/// Top-level error type for scalptrader.
#[derive(Debug, thiserror::Error)]
pub enum ScalptraderError {
    #[error("empty bar series")]
    EmptySeries,

    #[error("timestamps not strictly increasing at bar {index}")]
    NonMonotonicTimestamp { index: usize },

    #[error("invalid bar {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("indicator column {indicator} has no values")]
    MissingIndicator { indicator: String },

    #[error("series length mismatch: {bars} bars, {signals} signals")]
    LengthMismatch { bars: usize, signals: usize },

    #[error("data load error: {reason}")]
    DataLoad { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("simulation invariant violated at bar {bar}: {reason}")]
    SimulationInvariant { bar: usize, reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScalptraderError {
    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ScalptraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&ScalptraderError> for std::process::ExitCode {
    fn from(err: &ScalptraderError) -> Self {
        let code: u8 = match err {
            ScalptraderError::Io(_) | ScalptraderError::Csv(_) => 1,
            ScalptraderError::ConfigParse { .. }
            | ScalptraderError::ConfigMissing { .. }
            | ScalptraderError::ConfigInvalid { .. } => 2,
            ScalptraderError::EmptySeries
            | ScalptraderError::NonMonotonicTimestamp { .. }
            | ScalptraderError::InvalidBar { .. }
            | ScalptraderError::MissingIndicator { .. }
            | ScalptraderError::LengthMismatch { .. }
            | ScalptraderError::DataLoad { .. } => 3,
            ScalptraderError::SimulationInvariant { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

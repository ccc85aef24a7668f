//! Domain error types.

/// Top-level error type for signalbourse.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("no data for {symbol}")]
    EmptyResult { symbol: String },

    #[error("malformed series for {symbol}: {reason}")]
    MalformedSeries { symbol: String, reason: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        SignalError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the "signal unavailable" family: not enough history yet, or
    /// nothing returned for the symbol at all.
    pub fn is_data_shortage(&self) -> bool {
        matches!(
            self,
            SignalError::InsufficientData { .. } | SignalError::EmptyResult { .. }
        )
    }
}

impl From<&SignalError> for std::process::ExitCode {
    fn from(err: &SignalError) -> Self {
        let code: u8 = match err {
            SignalError::Io(_) => 1,
            SignalError::ConfigParse { .. }
            | SignalError::ConfigMissing { .. }
            | SignalError::ConfigInvalid { .. } => 2,
            SignalError::DataSource { .. } => 3,
            SignalError::InvalidParameter { .. } => 4,
            SignalError::EmptyResult { .. }
            | SignalError::InsufficientData { .. }
            | SignalError::MalformedSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

//! Error taxonomy shared across engines and adapters.

use chrono::NaiveDate;

/// Top-level error type for stocklens.
#[derive(Debug, thiserror::Error)]
pub enum StocklensError {
    #[error("unknown symbol: {symbol}")]
    InvalidSymbol { symbol: String },

    #[error("insufficient history for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientHistory {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("price data provider unavailable: {reason}")]
    ProviderUnavailable { reason: String },

    #[error("prediction already stored for {symbol} {date} ({model_type})")]
    DuplicateKey {
        symbol: String,
        date: NaiveDate,
        model_type: String,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

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

impl StocklensError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        StocklensError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<&StocklensError> for std::process::ExitCode {
    fn from(err: &StocklensError) -> Self {
        let code: u8 = match err {
            StocklensError::Io(_) => 1,
            StocklensError::ConfigParse { .. }
            | StocklensError::ConfigMissing { .. }
            | StocklensError::ConfigInvalid { .. } => 2,
            StocklensError::ProviderUnavailable { .. } => 3,
            StocklensError::InvalidParameter { .. } => 4,
            StocklensError::InvalidSymbol { .. }
            | StocklensError::InsufficientHistory { .. } => 5,
            StocklensError::DuplicateKey { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

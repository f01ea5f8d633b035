//! Domain error types.

/// Top-level error type for dcasim.
///
/// The first four variants are the engine's taxonomy: bad input data, bad
/// strategy parameters, an undefined value during a simulation fold, and a
/// metric that cannot be derived. The rest belong to the surrounding glue.
#[derive(Debug, thiserror::Error)]
pub enum DcaError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("invalid parameter {param}: {reason}")]
    Config { param: String, reason: String },

    #[error("computation error: {reason}")]
    Computation { reason: String },

    #[error("metrics error: {reason}")]
    Metrics { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DcaError {
    pub fn data(reason: impl Into<String>) -> Self {
        DcaError::Data {
            reason: reason.into(),
        }
    }

    pub fn config(param: impl Into<String>, reason: impl Into<String>) -> Self {
        DcaError::Config {
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub fn computation(reason: impl Into<String>) -> Self {
        DcaError::Computation {
            reason: reason.into(),
        }
    }

    pub fn metrics(reason: impl Into<String>) -> Self {
        DcaError::Metrics {
            reason: reason.into(),
        }
    }
}

impl From<&DcaError> for std::process::ExitCode {
    fn from(err: &DcaError) -> Self {
        let code: u8 = match err {
            DcaError::Io(_) | DcaError::Csv(_) => 1,
            DcaError::ConfigParse { .. }
            | DcaError::ConfigMissing { .. }
            | DcaError::Config { .. } => 2,
            DcaError::Data { .. } => 3,
            DcaError::Computation { .. } => 4,
            DcaError::Metrics { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

use thiserror::Error;

/// Top-level error for the `panel` binary: a message plus the process exit code.
///
/// Exit codes: `2` for user/config errors, `4` for data and runtime errors.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failure to load a panel dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Non-2xx response (404 included under the strict policy).
    #[error("dataset request failed with status {status}")]
    Status { status: u16 },

    /// The payload was JSON but not an array.
    #[error("invalid shape: dataset payload is not a JSON array")]
    InvalidShape,

    /// The payload was an array but a record didn't decode.
    #[error("failed to decode dataset: {message}")]
    Decode { message: String },

    /// Network or I/O failure before any status was seen.
    #[error("dataset transport failure: {message}")]
    Transport { message: String },

    #[error("invalid dataset key '{key}'")]
    InvalidKey { key: String },
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::Status { status: 404 })
    }

    /// Shape problems degrade to "no data" under the lenient policy.
    pub fn is_shape_failure(&self) -> bool {
        matches!(self, LoadError::InvalidShape | LoadError::Decode { .. })
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        let code = match err {
            LoadError::InvalidKey { .. } => 2,
            _ => 4,
        };
        AppError::new(code, err.to_string())
    }
}

use thiserror::Error;

/// Process-level error carrying the exit code the binary should return.
///
/// Exit codes:
/// - `2`: input, configuration or file I/O problems
/// - `3`: the current selection has no data
/// - `4`: terminal/runtime failures
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

    pub fn message(&self) -> &str {
        &self.message
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

/// A forecast or insight was requested over an empty set of records.
///
/// This is a selection problem (filters too narrow, value absent), never a
/// transient fault, so callers surface it and stop the query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No data for this selection ({context}). Change filters or value.")]
pub struct NoDataError {
    pub context: String,
}

impl NoDataError {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
        }
    }
}

impl From<NoDataError> for AppError {
    fn from(err: NoDataError) -> Self {
        AppError::new(3, err.to_string())
    }
}

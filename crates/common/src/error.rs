//! Error types shared across Stepclip crates.
//!
//! Transport-control operations never fail the caller: out-of-range steps
//! are clamped and redundant or degenerate requests are no-ops. The only
//! hard failures are construction-time parameter checks, configuration I/O,
//! and CLI input parsing.

/// Top-level error type for Stepclip operations.
#[derive(Debug, thiserror::Error)]
pub enum StepclipError {
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Video source unavailable: {message}")]
    SourceUnavailable { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Script error: {message}")]
    Script { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using StepclipError.
pub type StepclipResult<T> = Result<T, StepclipError>;

impl StepclipError {
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: msg.into(),
        }
    }

    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script {
            message: msg.into(),
        }
    }
}

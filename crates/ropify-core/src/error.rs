//! Error types and exit status mapping for ropify.
//!
//! `RopifyError` is the single error type command handlers return. Language
//! engine errors (worker, interpreter discovery) are bridged into it with
//! `From` impls in the engine crate.
//!
//! ## Exit Status Mapping
//!
//! - `1`: Guard violations (wrong destination kind, module moved through the
//!   symbol command, no import candidates)
//! - `2`: Invalid arguments (bad paths, offsets, configuration)
//! - `3`: Engine failures (the refactoring library raised)
//! - `4`: Environment errors (no usable interpreter, worker did not start)
//! - `10`: Internal errors (IO, protocol, unexpected state)


use thiserror::Error;

// ============================================================================
// Exit Status
// ============================================================================

/// Process exit status for each error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    /// A guard rejected the request after the session was opened.
    GuardViolation = 1,
    /// Invalid arguments from the caller.
    InvalidArguments = 2,
    /// The refactoring engine failed.
    EngineFailure = 3,
    /// The Python environment is unusable.
    EnvironmentError = 4,
    /// Bugs, IO failures, protocol violations.
    InternalError = 10,
}

impl ExitStatus {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for command handlers.
#[derive(Debug, Error)]
pub enum RopifyError {
    /// A guard check failed. The message is user-facing and printed as is.
    #[error("{message}")]
    Guard { message: String },

    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The refactoring engine raised.
    #[error("{code}: {message}")]
    EngineFailure {
        code: String,
        message: String,
        traceback: Option<String>,
    },

    /// The Python environment could not be used.
    #[error("{message}")]
    Environment { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Result type for ropify operations.
pub type RopifyResult<T> = Result<T, RopifyError>;

impl From<&RopifyError> for ExitStatus {
    fn from(err: &RopifyError) -> Self {
        match err {
            RopifyError::Guard { .. } => ExitStatus::GuardViolation,
            RopifyError::InvalidArguments { .. } => ExitStatus::InvalidArguments,
            RopifyError::Config { .. } => ExitStatus::InvalidArguments,
            RopifyError::EngineFailure { .. } => ExitStatus::EngineFailure,
            RopifyError::Environment { .. } => ExitStatus::EnvironmentError,
            RopifyError::Io(_) => ExitStatus::InternalError,
            RopifyError::Internal { .. } => ExitStatus::InternalError,
        }
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl RopifyError {
    /// Create a guard violation with a user-facing message.
    pub fn guard(message: impl Into<String>) -> Self {
        RopifyError::Guard {
            message: message.into(),
        }
    }

    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        RopifyError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        RopifyError::Internal {
            message: message.into(),
        }
    }

    /// Get the exit status for this error.
    pub fn exit_status(&self) -> ExitStatus {
        ExitStatus::from(self)
    }

    /// Whether this error is reported on the primary output stream.
    pub fn is_guard(&self) -> bool {
        matches!(self, RopifyError::Guard { .. })
    }

    /// Engine-side traceback, if the engine supplied one.
    pub fn traceback(&self) -> Option<&str> {
        match self {
            RopifyError::EngineFailure { traceback, .. } => traceback.as_deref(),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

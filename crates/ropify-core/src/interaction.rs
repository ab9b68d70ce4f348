//! Prompt abstraction for interactive input.
//!
//! Commands ask for a missing destination through the [`Prompter`] trait so
//! the terminal implementation can be swapped for a scripted one in tests.
//! The trait is object-safe.

use thiserror::Error;

use crate::error::RopifyError;

/// Error type for interaction operations
#[derive(Error, Debug)]
pub enum InteractionError {
    /// Input ended before an answer was given (EOF, Ctrl+D)
    #[error("no input received")]
    Eof,

    /// An empty answer was given where a value is required
    #[error("an answer is required")]
    Empty,

    /// IO error during interaction
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for InteractionError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<InteractionError> for RopifyError {
    fn from(err: InteractionError) -> Self {
        match err {
            InteractionError::Io(message) => RopifyError::internal(message),
            other => RopifyError::invalid_args(format!("destination prompt: {}", other)),
        }
    }
}

/// Result type for interaction operations
pub type InteractionResult<T> = Result<T, InteractionError>;

/// Asks the user for values the command line did not supply.
pub trait Prompter {
    /// Ask for a single line of text.
    ///
    /// Implementations trim surrounding whitespace and return
    /// [`InteractionError::Empty`] for a blank answer.
    fn ask_text(&self, prompt: &str) -> InteractionResult<String>;
}

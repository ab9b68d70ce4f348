//! Error bridge implementations for rope-side errors.
//!
//! This module provides `impl From<X> for RopifyError` conversions from the
//! worker and interpreter discovery errors to the unified `RopifyError` type.
//! They live here rather than in `ropify-core` because the source types are
//! specific to the rope engine.

use ropify_core::error::RopifyError;

use crate::env::PythonEnvError;
use crate::worker::WorkerError;

// ============================================================================
// Bridge: WorkerError -> RopifyError
// ============================================================================

impl From<WorkerError> for RopifyError {
    fn from(err: WorkerError) -> Self {
        match err {
            WorkerError::WorkerResponseError {
                code,
                message,
                traceback,
            } => RopifyError::EngineFailure {
                code,
                message,
                traceback,
            },
            WorkerError::SpawnFailed { .. } | WorkerError::PythonNotFound { .. } => {
                RopifyError::Environment {
                    message: err.to_string(),
                }
            }
            WorkerError::Io(io) => RopifyError::Io(io),
            other => RopifyError::internal(other.to_string()),
        }
    }
}

// ============================================================================
// Bridge: PythonEnvError -> RopifyError
// ============================================================================

impl From<PythonEnvError> for RopifyError {
    fn from(err: PythonEnvError) -> Self {
        RopifyError::Environment {
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    mod worker_error_conversion {
        use super::*;

        #[test]
        fn response_error_becomes_engine_failure() {
            let err = RopifyError::from(WorkerError::WorkerResponseError {
                code: "RefactoringError".to_string(),
                message: "cannot move".to_string(),
                traceback: Some("Traceback (most recent call last):".to_string()),
            });
            assert_eq!(err.exit_status().code(), 3);
            assert_eq!(err.to_string(), "RefactoringError: cannot move");
            assert!(err.traceback().is_some());
        }

        #[test]
        fn spawn_failure_is_environment() {
            let err = RopifyError::from(WorkerError::SpawnFailed {
                reason: "No module named 'rope'".to_string(),
            });
            assert_eq!(err.exit_status().code(), 4);
            assert!(err.to_string().contains("rope"));
        }

        #[test]
        fn missing_python_is_environment() {
            let err = RopifyError::from(WorkerError::PythonNotFound {
                path: PathBuf::from("/nope/python3"),
            });
            assert_eq!(err.exit_status().code(), 4);
        }

        #[test]
        fn crash_is_internal() {
            let err = RopifyError::from(WorkerError::WorkerCrashed {
                reason: "unexpected EOF".to_string(),
            });
            assert_eq!(err.exit_status().code(), 10);
        }
    }

    mod env_error_conversion {
        use super::*;

        #[test]
        fn unusable_interpreter_is_environment() {
            let err = RopifyError::from(PythonEnvError::ExplicitInterpreterUnusable {
                path: PathBuf::from("/usr/bin/python2"),
                source_name: "--python".to_string(),
                reason: "version 2.7 is below 3.8".to_string(),
            });
            assert_eq!(err.exit_status().code(), 4);
            assert!(err.to_string().contains("/usr/bin/python2"));
        }
    }
}

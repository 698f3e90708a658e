//! crates/batch/src/error.rs
//!
//! Error types for batch submission.

use std::io;

use platform::CommandError;
use thiserror::Error;

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors that can occur while submitting a batch job.
#[derive(Debug, Error)]
pub enum BatchError {
    /// I/O error while staging the job script.
    #[error("I/O error: {0}")]
    Io(
        #[from]
        #[source]
        io::Error,
    ),
    /// The submit program could not be run or timed out.
    #[error("cannot run scheduler: {0}")]
    Command(
        #[from]
        #[source]
        CommandError,
    ),
    /// The scheduler refused the job.
    #[error("scheduler rejected job (exit {status:?}): {stderr}")]
    Rejected {
        /// Exit status of the submit program.
        status: Option<i32>,
        /// Diagnostic output of the submit program.
        stderr: String,
    },
    /// The scheduler accepted the job but printed no identifier.
    #[error("scheduler returned an empty job id")]
    EmptyJobId,
}

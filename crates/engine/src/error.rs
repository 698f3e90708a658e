//! Error taxonomy of ACL operations.
//!
//! Errors raised before the lock is taken (conflict, contention, quota,
//! listing) never leave partial state behind. Errors raised while executing
//! (command failure, timeout) surface only after the lock was released.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use acl::Principal;
use batch::BatchError;
use platform::CommandError;
use thiserror::Error;

use crate::exit_code::{ExitCode, HasExitCode};

/// Result type for ACL operations.
pub type AclResult<T> = Result<T, AclError>;

/// Failure of an ACL operation.
#[derive(Debug, Error)]
pub enum AclError {
    /// A principal was requested in more than one role.
    #[error("principal(s) present in multiple roles: {}", join_principals(.principals))]
    ValidationConflict {
        /// Offending principals, in request order.
        principals: Vec<Principal>,
    },

    /// The project's lock marker exists.
    #[error("cannot setacl as lock file '{}' has been acquired by other process", .path.display())]
    LockContention {
        /// Lock marker path.
        path: PathBuf,
    },

    /// The project filesystem has too little space to take the lock.
    #[error("insufficient quota ({available} 1k-block available) for {}", .root.display())]
    QuotaExceeded {
        /// Project root.
        root: PathBuf,
        /// Available 1 KiB blocks.
        available: u64,
    },

    /// An external program exited with a failure status.
    #[error("{command} failed (exit {}): {stderr}", display_status(.status))]
    CommandFailure {
        /// Rendered command line.
        command: String,
        /// Exit status, `None` when killed by a signal.
        status: Option<i32>,
        /// Captured diagnostics.
        stderr: String,
    },

    /// An external program exceeded its time bound.
    #[error("{command} timed out after {}s", .after.as_secs())]
    Timeout {
        /// Rendered command line.
        command: String,
        /// Bound that expired.
        after: Duration,
    },

    /// The batch scheduler did not accept the job.
    #[error("fail to submit batch job: {0}")]
    SubmissionFailure(#[source] BatchError),

    /// The current ACL of a path could not be listed.
    #[error("cannot list ACL of {}: {reason}", .path.display())]
    Listing {
        /// Path whose ACL was requested.
        path: PathBuf,
        /// Diagnostic from the listing program.
        reason: String,
    },

    /// A path resolved outside the project root.
    #[error("{} is outside project {}", .path.display(), .root.display())]
    OutsideProject {
        /// Offending path.
        path: PathBuf,
        /// Project root.
        root: PathBuf,
    },

    /// Local file I/O failed.
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl AclError {
    /// Wraps an I/O error with a description of the failed step.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<CommandError> for AclError {
    fn from(error: CommandError) -> Self {
        match error {
            CommandError::Spawn { program, source } => Self::CommandFailure {
                command: program,
                status: None,
                stderr: source.to_string(),
            },
            CommandError::TimedOut { command, after } => Self::Timeout { command, after },
            CommandError::Io { program, source } => {
                Self::io(format!("waiting for {program}"), source)
            }
        }
    }
}

impl From<BatchError> for AclError {
    fn from(error: BatchError) -> Self {
        match error {
            BatchError::Command(CommandError::TimedOut { command, after }) => {
                Self::Timeout { command, after }
            }
            other => Self::SubmissionFailure(other),
        }
    }
}

impl HasExitCode for AclError {
    fn exit_code(&self) -> ExitCode {
        match self {
            Self::ValidationConflict { .. } => ExitCode::Conflict,
            Self::LockContention { .. } => ExitCode::LockContention,
            Self::QuotaExceeded { .. } => ExitCode::Quota,
            Self::CommandFailure { .. } => ExitCode::CommandFailed,
            Self::Timeout { .. } => ExitCode::Timeout,
            Self::SubmissionFailure(_) => ExitCode::Submission,
            Self::OutsideProject { .. } => ExitCode::Syntax,
            Self::Listing { .. } => ExitCode::Listing,
            Self::Io { .. } => ExitCode::FileIo,
        }
    }
}

fn join_principals(principals: &[Principal]) -> String {
    principals
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[allow(clippy::ref_option)]
fn display_status(status: &Option<i32>) -> String {
    status.map_or_else(|| String::from("signal"), |code| code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_lists_principals() {
        let err = AclError::ValidationConflict {
            principals: vec![Principal::parse("alice"), Principal::parse("g:staff")],
        };
        assert_eq!(
            err.to_string(),
            "principal(s) present in multiple roles: alice, g:staff"
        );
        assert_eq!(err.exit_code(), ExitCode::Conflict);
    }

    #[test]
    fn command_errors_map_to_taxonomy() {
        let timeout: AclError = CommandError::TimedOut {
            command: "nfs4_setfacl -s x /p".to_owned(),
            after: Duration::from_secs(5),
        }
        .into();
        assert_eq!(timeout.exit_code(), ExitCode::Timeout);

        let spawn: AclError = CommandError::Spawn {
            program: "nfs4_setfacl".to_owned(),
            source: io::Error::from(io::ErrorKind::NotFound),
        }
        .into();
        assert_eq!(spawn.exit_code(), ExitCode::CommandFailed);
    }

    #[test]
    fn scheduler_timeout_is_a_timeout() {
        let err: AclError = BatchError::Command(CommandError::TimedOut {
            command: "qsub job.sh".to_owned(),
            after: Duration::from_secs(120),
        })
        .into();
        assert!(matches!(err, AclError::Timeout { .. }));

        let err: AclError = BatchError::EmptyJobId.into();
        assert_eq!(err.exit_code(), ExitCode::Submission);
    }

    #[test]
    fn signal_status_is_rendered() {
        let err = AclError::CommandFailure {
            command: "nfs4_setfacl".to_owned(),
            status: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("exit signal"));
    }
}

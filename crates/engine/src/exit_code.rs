//! Process exit codes for ACL operations.
//!
//! Each failure class of the engine maps to its own code so that the
//! provisioning pipeline driving `prjacl` can tell a held lock (retry later)
//! from a rejected request (fix the input) without parsing stderr.
//!
//! # Examples
//!
//! ```
//! use engine::exit_code::ExitCode;
//!
//! assert_eq!(ExitCode::LockContention.as_i32(), 3);
//! assert_eq!(ExitCode::from_i32(4), Some(ExitCode::Quota));
//! ```

use std::fmt;

/// Exit codes returned by `prjacl`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful completion, including no-op requests.
    Ok = 0,

    /// Syntax or usage error.
    ///
    /// Invalid arguments, unknown role names, paths outside the project.
    Syntax = 1,

    /// A principal was requested in more than one role.
    Conflict = 2,

    /// The project lock marker is held by another process.
    LockContention = 3,

    /// The project filesystem has no space left.
    Quota = 4,

    /// The ACL setting program exited with a failure status.
    CommandFailed = 5,

    /// An external program exceeded its time bound.
    Timeout = 6,

    /// The batch scheduler rejected the job.
    Submission = 7,

    /// The current ACL could not be listed.
    Listing = 8,

    /// Local file I/O failed.
    FileIo = 9,

    /// The configuration file is missing or malformed.
    Config = 10,
}

impl ExitCode {
    /// Returns the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a human-readable description of this exit code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Syntax => "syntax or usage error",
            Self::Conflict => "conflicting role assignment",
            Self::LockContention => "project ACL is locked by another process",
            Self::Quota => "insufficient quota",
            Self::CommandFailed => "ACL command failed",
            Self::Timeout => "external command timed out",
            Self::Submission => "batch job submission failed",
            Self::Listing => "cannot list current ACL",
            Self::FileIo => "error in file IO",
            Self::Config => "configuration error",
        }
    }

    /// Returns `true` if this represents a successful exit.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns `true` when retrying the same request later may succeed.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::LockContention | Self::Timeout | Self::Submission)
    }

    /// Creates an exit code from an i32 value.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::Syntax),
            2 => Some(Self::Conflict),
            3 => Some(Self::LockContention),
            4 => Some(Self::Quota),
            5 => Some(Self::CommandFailed),
            6 => Some(Self::Timeout),
            7 => Some(Self::Submission),
            8 => Some(Self::Listing),
            9 => Some(Self::FileIo),
            10 => Some(Self::Config),
            _ => None,
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

/// Types that determine the process exit status.
pub trait HasExitCode {
    /// Returns the exit code associated with this value.
    fn exit_code(&self) -> ExitCode;
}

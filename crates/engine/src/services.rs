//! Collaborators and tunables shared by every backend of one run.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use batch::{DEFAULT_MEMORY, DEFAULT_QUEUE, DEFAULT_WALLTIME, JobScheduler};
use platform::{CommandRunner, IdentityDirectory, LazySubmitter, SpaceProbe};

/// Default bound on the ACL setting program.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(3600);

/// Default bound on the ACL listing program.
pub const DEFAULT_LISTING_TIMEOUT: Duration = Duration::from_secs(300);

/// Default minimum of free 1 KiB blocks needed to take the lock.
pub const DEFAULT_MIN_FREE_BLOCKS: u64 = 1;

/// Program name batch jobs invoke when no path is configured.
pub const DEFAULT_PROGRAM: &str = "prjacl";

/// Resources and entry point of batch jobs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchSettings {
    /// Scheduler queue.
    pub queue: String,
    /// Wall time limit, `HH:MM:SS`.
    pub walltime: String,
    /// Memory limit.
    pub memory: String,
    /// Binary the job runs `apply` with.
    pub program: PathBuf,
    /// Options placed before the `apply` subcommand, such as `--config`.
    pub global_args: Vec<String>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            queue: DEFAULT_QUEUE.to_owned(),
            walltime: DEFAULT_WALLTIME.to_owned(),
            memory: DEFAULT_MEMORY.to_owned(),
            program: PathBuf::from(DEFAULT_PROGRAM),
            global_args: Vec::new(),
        }
    }
}

/// Tunables of the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    /// Bound on one ACL setting run.
    pub command_timeout: Duration,
    /// Bound on one ACL listing.
    pub listing_timeout: Duration,
    /// Free space needed before a mutation starts.
    pub min_free_blocks: u64,
    /// Batch job parameters.
    pub batch: BatchSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            listing_timeout: DEFAULT_LISTING_TIMEOUT,
            min_free_blocks: DEFAULT_MIN_FREE_BLOCKS,
            batch: BatchSettings::default(),
        }
    }
}

/// External collaborators of the engine.
#[derive(Clone)]
pub struct Services {
    /// Runs the filer ACL tools.
    pub runner: Arc<dyn CommandRunner>,
    /// Validates principals.
    pub identities: Arc<dyn IdentityDirectory>,
    /// Reports free space for the quota guard.
    pub space: Arc<dyn SpaceProbe>,
    /// Accepts batch jobs.
    pub scheduler: Arc<dyn JobScheduler>,
    /// Recorded in audit records and handed to batch jobs.
    pub submitter: LazySubmitter,
    /// Timeouts, thresholds and job resources.
    pub settings: EngineSettings,
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("submitter", &self.submitter)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

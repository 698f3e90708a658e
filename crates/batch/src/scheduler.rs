//! crates/batch/src/scheduler.rs
//!
//! Submission of rendered job scripts to the cluster scheduler.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use platform::{CommandRunner, CommandSpec};
use tracing::{debug, error, info};

use crate::error::{BatchError, BatchResult};
use crate::script::JobSpec;

/// Default scheduler submit program.
pub const DEFAULT_SUBMIT_PROGRAM: &str = "qsub";

/// Default bound on the submit program's run time.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Opaque identifier the scheduler assigned to a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    /// Wraps a scheduler-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accepts jobs for asynchronous execution.
pub trait JobScheduler: Send + Sync {
    /// Submits `job` and returns the scheduler's identifier for it.
    fn submit(&self, job: &JobSpec) -> BatchResult<JobId>;
}

/// Submits jobs through a PBS/Torque `qsub` compatible program.
pub struct QsubScheduler {
    program: String,
    timeout: Duration,
    runner: Arc<dyn CommandRunner>,
}

impl QsubScheduler {
    /// Creates a scheduler using `qsub` with the default timeout.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: DEFAULT_SUBMIT_PROGRAM.to_owned(),
            timeout: DEFAULT_SUBMIT_TIMEOUT,
            runner,
        }
    }

    /// Overrides the submit program.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Overrides the submit timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for QsubScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QsubScheduler")
            .field("program", &self.program)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl JobScheduler for QsubScheduler {
    fn submit(&self, job: &JobSpec) -> BatchResult<JobId> {
        let script = job.render();
        debug!(target: "prjacl::batch", "job script:\n{script}");

        // The file must outlive the submit call; it is removed on drop.
        let mut file = tempfile::Builder::new()
            .prefix("prj_setacl_")
            .suffix(".sh")
            .tempfile()?;
        file.write_all(script.as_bytes())?;
        file.flush()?;

        let spec = CommandSpec::new(&self.program)
            .arg(file.path().to_string_lossy())
            .with_timeout(self.timeout);
        let output = self.runner.run(&spec)?;

        if !output.success() {
            error!(target: "prjacl::batch", "fail to submit job: {spec}");
            return Err(BatchError::Rejected {
                status: output.status,
                stderr: output.stderr.trim().to_owned(),
            });
        }

        let id = output.stdout.trim();
        if id.is_empty() {
            return Err(BatchError::EmptyJobId);
        }
        info!(target: "prjacl::batch", "job {} submitted as {id}", job.name());
        Ok(JobId::new(id))
    }
}

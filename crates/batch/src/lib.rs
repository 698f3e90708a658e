#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Deferred execution of ACL changes on the compute cluster.
//!
//! Recursive ACL changes on large projects can run for hours, far longer
//! than an interactive session should block. This crate turns such a change
//! into a scheduler job and hands it to the cluster.
//!
//! # Overview
//!
//! 1. **Render**: [`JobSpec`] produces a PBS script with the resource
//!    directives (`-N`, `-l walltime=…,mem=…`, `-q`, `-m ae`) followed by
//!    one invocation of `prjacl apply`.
//! 2. **Submit**: a [`JobScheduler`] stages the script in a temporary file
//!    and submits it. [`QsubScheduler`] runs `qsub` under a bounded timeout
//!    and returns the [`JobId`] it prints.
//!
//! The job re-checks and takes the project lock itself when it starts, since
//! the submitting process is long gone by then.
//!
//! # Example
//!
//! ```
//! use batch::JobSpec;
//!
//! let job = JobSpec::new("set_roles_3010000.01", ["prjacl", "apply", "/project/3010000.01"]);
//! assert!(job.render().contains("#PBS -q batch"));
//! ```

pub mod error;
pub mod scheduler;
pub mod script;

pub use error::{BatchError, BatchResult};
pub use scheduler::{DEFAULT_SUBMIT_PROGRAM, DEFAULT_SUBMIT_TIMEOUT, JobId, JobScheduler, QsubScheduler};
pub use script::{DEFAULT_MEMORY, DEFAULT_QUEUE, DEFAULT_WALLTIME, JobSpec, shell_quote};

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the command-line front-end of `prjacl`. It parses the arguments
//! with [`clap`], loads the ini configuration, wires the production
//! collaborators into the `engine` backends and reports results.
//!
//! # Commands
//!
//! - `get` prints the roles on project directories.
//! - `set` grants roles, optionally with traverse on the parents and as a
//!   batch job.
//! - `del` removes principals from project ACLs.
//! - `unlock` shows and clears stale project locks.
//! - `apply` (hidden) writes a finished ACE list; batch jobs run it so that
//!   they take the project lock the same way an interactive run does.
//!
//! # Errors
//!
//! [`run`] never panics. Every failure is printed to the error stream and
//! reflected in the returned exit code; see `engine::ExitCode`.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let code = cli::run(["prjacl", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(code, 0);
//! assert!(String::from_utf8_lossy(&stdout).starts_with("prjacl "));
//! ```

pub mod config;
mod frontend;

pub use config::{Config, ConfigError};
pub use frontend::run;

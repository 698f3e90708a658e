#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` turns the command line `-l/--loglevel` number into a
//! [`tracing`] filter and installs the process-wide subscriber that writes
//! diagnostics to stderr.
//!
//! Library crates never configure logging themselves; they emit events with
//! the `tracing` macros under `prjacl::*` targets (`prjacl::acl`,
//! `prjacl::lock`, `prjacl::cmd`, `prjacl::batch`, `prjacl::reconcile`,
//! `prjacl::traverse`) and leave filtering to the binary.
//!
//! # Examples
//!
//! ```
//! use logging::{LoggingConfig, Verbosity};
//!
//! let config = LoggingConfig::from_level(2);
//! assert_eq!(config.verbosity, Verbosity::Info);
//! assert_eq!(config.directive(), "info");
//! ```

mod config;
mod subscriber;
mod verbosity;

pub use config::{LOG_ENV, LoggingConfig};
pub use subscriber::init_tracing;
pub use verbosity::{ParseVerbosityError, Verbosity};

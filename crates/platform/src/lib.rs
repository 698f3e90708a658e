#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Host integration for prjacl.
//!
//! Everything that talks to the operating system sits behind a small trait
//! so the engine can be driven by fakes in tests:
//!
//! - [`CommandRunner`] runs the filer ACL tools and the batch submitter.
//! - [`IdentityDirectory`] checks that users and groups exist.
//! - [`SpaceProbe`] reports free space for the quota check.
//!
//! [`MountTable`] and [`Submitter`] are plain lookups without a trait.

pub mod command;
pub mod identity;
pub mod mounts;
pub mod space;
pub mod submitter;

pub use command::{CommandError, CommandOutput, CommandRunner, CommandSpec, ProcessRunner};
pub use identity::{IdentityDirectory, SystemIdentities};
pub use mounts::{MountEntry, MountTable};
pub use space::{SpaceProbe, StatvfsProbe};
pub use submitter::{LazySubmitter, Submitter, current_user};

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `engine` reconciles abstract project roles with the NFSv4 ACLs on the
//! filers and applies the result safely. It is driven by the `prjacl`
//! front-end through the [`AclBackend`] trait and talks to the host only
//! through the collaborators bundled in [`Services`].
//!
//! # Design
//!
//! - [`RoleResolver`] maps existing ACEs to the closest role.
//! - [`reconcile`] computes new ACE lists from a [`RoleRequest`] or a removal
//!   set. It is pure; the current ACL comes in and the ACL to write goes out.
//! - [`TraversalPropagator`] grants traverse on the ancestors of a path.
//! - [`ApplyGateway`] checks the project lock and quota, curates the list,
//!   then either runs the setting program while holding the lock or submits a
//!   batch job.
//! - [`Nfs4Backend`] wires these together for one project root.
//!
//! # Invariants
//!
//! - Group-scoped entries precede user-scoped entries in every list written.
//! - Conflicting requests, held locks and exhausted quota abort before any
//!   mutation.
//! - A lock taken by the synchronous path is released whatever the outcome.
//!
//! # Errors
//!
//! Operations return [`AclError`]; [`HasExitCode`] maps each variant to the
//! process exit status.
//!
//! # Examples
//!
//! ```
//! use acl::{FilerProfile, parse_principal_list};
//! use engine::reconcile::{RoleRequest, compose_role_acl, is_partitioned};
//!
//! let profile = FilerProfile::netapp();
//! let current = acl::codec::parse_listing("A:fd:OWNER@:rwaDdxnNtTcCoy\n");
//! let request = RoleRequest::new(vec![], parse_principal_list("g:lab"), parse_principal_list("bob"));
//! let aces = compose_role_acl(&profile, &current, &request);
//! assert_eq!(aces[0].to_string(), "A:fdg:lab@dccn.nl:rwaDdxnNtTcy");
//! assert!(is_partitioned(&profile, &aces));
//! ```

pub mod backend;
pub mod error;
pub mod exit_code;
pub mod gateway;
pub mod listing;
pub mod lock;
pub mod reconcile;
pub mod resolver;
pub mod services;
pub mod traverse;

#[cfg(test)]
mod testing;

pub use backend::{
    AclBackend, BackendRules, DelUsersOptions, Nfs4Backend, PathRoles, SetRolesOptions,
    open_backend,
};
pub use error::{AclError, AclResult};
pub use exit_code::{ExitCode, HasExitCode};
pub use gateway::{ApplyGateway, ApplyOptions, ApplyOutcome};
pub use listing::AclLister;
pub use lock::{AuditRecord, LOCK_FILE_NAME, LockGuard, LockMarker};
pub use reconcile::RoleRequest;
pub use resolver::{RoleMap, RoleResolver};
pub use services::{BatchSettings, EngineSettings, Services};
pub use traverse::TraversalPropagator;

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `acl` holds the pure data side of project ACL management: the NFSv4
//! [`Ace`] model, the textual [`codec`] used by the filer tools, the closed
//! set of [`Role`]s, [`Principal`] identities, and the [`PermissionModel`]
//! translating roles into permission masks.
//!
//! Nothing in this crate performs I/O; backends in the `engine` crate feed it
//! listings and hand its output to the filer tools.
//!
//! # Invariants
//!
//! - Mask characters of generated ACEs are drawn from the model's alphabet.
//! - For every role the ALLOW and DENY masks partition the alphabet.
//! - ACE order is never changed by parsing or serialising.
//!
//! # Examples
//!
//! ```
//! use acl::{codec, FilerProfile, Role};
//!
//! let profile = FilerProfile::netapp();
//! let aces = codec::parse_listing("A:fd:OWNER@:rwaDdxnNtTcCoy\nA:fd:alice@dccn.nl:rxntcy\n");
//! assert_eq!(aces.len(), 2);
//! assert_eq!(aces[1].mask, *profile.model().allow_mask(Role::User));
//! ```

pub mod ace;
pub mod codec;
pub mod permission;
pub mod principal;
pub mod profile;
pub mod role;

pub use ace::{Ace, AceFlags, AceType, Mask, ParseAceError};
pub use permission::{ModelError, PermissionModel, RoleMask};
pub use principal::{Principal, parse_principal_list};
pub use profile::{BackendKind, FilerProfile, UnknownBackendError};
pub use role::{Role, UnknownRoleError};

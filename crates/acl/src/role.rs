//! crates/acl/src/role.rs
//!
//! Abstract access tiers granted on project storage.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a role name is not one of the known tiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no such role: {0}")]
pub struct UnknownRoleError(pub String);

/// Access tier on a project directory.
///
/// The declaration order is the priority order used wherever roles are
/// iterated: new ACEs are composed in this order, and best-fit
/// classification breaks ties in favour of the earlier role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Full control including ACL management.
    Admin,
    /// Read and write access.
    Contributor,
    /// Read-only access.
    User,
    /// Pass through a directory without listing it.
    Traverse,
}

impl Role {
    /// All roles in priority order.
    pub const ALL: [Self; 4] = [Self::Admin, Self::Contributor, Self::User, Self::Traverse];

    /// Lower-case name used on the command line and in reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Contributor => "contributor",
            Self::User => "user",
            Self::Traverse => "traverse",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = UnknownRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownRoleError(wanted.to_owned()))
    }
}

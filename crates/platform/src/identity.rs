//! Lookups in the system user and group databases.

use tracing::warn;

/// Answers whether account names resolve on this host.
pub trait IdentityDirectory: Send + Sync {
    /// Reports whether a user account named `name` exists.
    fn user_exists(&self, name: &str) -> bool;

    /// Reports whether a group named `name` exists.
    fn group_exists(&self, name: &str) -> bool;
}

/// Queries the passwd and group databases through NSS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentities;

#[cfg(unix)]
impl IdentityDirectory for SystemIdentities {
    fn user_exists(&self, name: &str) -> bool {
        match nix::unistd::User::from_name(name) {
            Ok(found) => found.is_some(),
            Err(errno) => {
                warn!(target: "prjacl::acl", "user lookup for '{name}' failed: {errno}");
                false
            }
        }
    }

    fn group_exists(&self, name: &str) -> bool {
        match nix::unistd::Group::from_name(name) {
            Ok(found) => found.is_some(),
            Err(errno) => {
                warn!(target: "prjacl::acl", "group lookup for '{name}' failed: {errno}");
                false
            }
        }
    }
}

//! crates/acl/src/profile.rs
//!
//! Per-filer constants injected into a backend adapter at construction.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::permission::PermissionModel;

/// Principals that every ACL carries and that never map to a role.
pub const DEFAULT_PRINCIPALS: [&str; 3] = ["GROUP", "OWNER", "EVERYONE"];

/// Domain suffix appended to principals of newly created ACEs.
pub const DEFAULT_DOMAIN: &str = "dccn.nl";

/// Program listing an NFSv4 ACL.
pub const DEFAULT_GETFACL: &str = "nfs4_getfacl";

/// Program replacing an NFSv4 ACL.
pub const DEFAULT_SETFACL: &str = "nfs4_setfacl";

/// Error returned for an unknown backend name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown backend '{0}' (expected 'netapp' or 'freenas')")]
pub struct UnknownBackendError(pub String);

/// Filer family serving a project directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// NetApp ONTAP filers.
    NetApp,
    /// FreeNAS/TrueNAS filers.
    FreeNas,
}

impl BackendKind {
    /// Name used in configuration files and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NetApp => "netapp",
            Self::FreeNas => "freenas",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = UnknownBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "netapp" => Ok(Self::NetApp),
            "freenas" | "truenas" => Ok(Self::FreeNas),
            other => Err(UnknownBackendError(other.to_owned())),
        }
    }
}

/// Immutable description of how a filer family expresses ACLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilerProfile {
    kind: BackendKind,
    model: PermissionModel,
    default_principals: Vec<String>,
    domain: String,
    getfacl: String,
    setfacl: String,
    directory_trailing_slash: bool,
}

impl FilerProfile {
    /// Profile for NetApp filers.
    ///
    /// A path naming a volume root must end in `/` or the filer reports the
    /// ACL of the junction instead, so directory paths get a trailing slash.
    #[must_use]
    pub fn netapp() -> Self {
        Self {
            kind: BackendKind::NetApp,
            model: PermissionModel::nfs4(),
            default_principals: DEFAULT_PRINCIPALS.iter().map(|&p| p.to_owned()).collect(),
            domain: DEFAULT_DOMAIN.to_owned(),
            getfacl: DEFAULT_GETFACL.to_owned(),
            setfacl: DEFAULT_SETFACL.to_owned(),
            directory_trailing_slash: true,
        }
    }

    /// Profile for FreeNAS filers.
    #[must_use]
    pub fn freenas() -> Self {
        Self {
            kind: BackendKind::FreeNas,
            directory_trailing_slash: false,
            ..Self::netapp()
        }
    }

    /// Profile for the given filer family.
    #[must_use]
    pub fn for_kind(kind: BackendKind) -> Self {
        match kind {
            BackendKind::NetApp => Self::netapp(),
            BackendKind::FreeNas => Self::freenas(),
        }
    }

    /// Overrides the domain suffix for new ACEs.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Overrides the ACL listing and setting programs.
    #[must_use]
    pub fn with_programs(mut self, getfacl: impl Into<String>, setfacl: impl Into<String>) -> Self {
        self.getfacl = getfacl.into();
        self.setfacl = setfacl.into();
        self
    }

    /// Filer family.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Role/mask translation table.
    #[must_use]
    pub const fn model(&self) -> &PermissionModel {
        &self.model
    }

    /// Domain suffix for new ACEs.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// ACL listing program.
    #[must_use]
    pub fn getfacl(&self) -> &str {
        &self.getfacl
    }

    /// ACL setting program.
    #[must_use]
    pub fn setfacl(&self) -> &str {
        &self.setfacl
    }

    /// Whether directory paths passed to the ACL tools need a trailing `/`.
    #[must_use]
    pub const fn directory_trailing_slash(&self) -> bool {
        self.directory_trailing_slash
    }

    /// Reports whether `name` (without domain) is one of the default principals.
    #[must_use]
    pub fn is_default_principal(&self, name: &str) -> bool {
        self.default_principals.iter().any(|p| p == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        assert_eq!("netapp".parse(), Ok(BackendKind::NetApp));
        assert_eq!("FreeNAS".parse(), Ok(BackendKind::FreeNas));
        assert!("ceph".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::FreeNas.to_string(), "freenas");
    }

    #[test]
    fn profiles_differ_in_slash_workaround() {
        assert!(FilerProfile::netapp().directory_trailing_slash());
        assert!(!FilerProfile::freenas().directory_trailing_slash());
        assert_eq!(FilerProfile::freenas().kind(), BackendKind::FreeNas);
        assert_eq!(FilerProfile::for_kind(BackendKind::NetApp).kind(), BackendKind::NetApp);
    }

    #[test]
    fn default_principals() {
        let profile = FilerProfile::netapp();
        assert!(profile.is_default_principal("OWNER"));
        assert!(profile.is_default_principal("EVERYONE"));
        assert!(!profile.is_default_principal("owner"));
        assert!(!profile.is_default_principal("alice"));
    }

    #[test]
    fn overrides() {
        let profile = FilerProfile::netapp()
            .with_domain("example.org")
            .with_programs("/opt/bin/getfacl", "/opt/bin/setfacl");
        assert_eq!(profile.domain(), "example.org");
        assert_eq!(profile.getfacl(), "/opt/bin/getfacl");
        assert_eq!(profile.setfacl(), "/opt/bin/setfacl");
    }
}

//! crates/engine/src/backend.rs
//!
//! Role-level operations on one project, per filer family.
//!
//! An [`AclBackend`] ties the pieces of the engine together for a project
//! root: it lists the current ACL, classifies it into roles, reconciles the
//! requested change, optionally grants traverse on the ancestors, and hands
//! the result to the [`ApplyGateway`].
//!
//! The filer family behind a project is found from the NFS server that
//! exports it, using [`BackendRules`] against the mount table.

use std::path::{Path, PathBuf};

use acl::{Ace, BackendKind, FilerProfile, Principal};
use platform::MountTable;
use tracing::{debug, info, warn};

use crate::error::{AclError, AclResult};
use crate::gateway::{ApplyGateway, ApplyOptions, ApplyOutcome};
use crate::listing::AclLister;
use crate::reconcile::{
    RoleRequest, check_conflicts, compose_removal_acl, compose_role_acl, filter_redundant,
    removable_principals,
};
use crate::resolver::{RoleMap, RoleResolver};
use crate::services::Services;
use crate::traverse::TraversalPropagator;

/// Options of [`AclBackend::set_roles`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetRolesOptions {
    /// Apply to the whole tree below the path.
    pub recursive: bool,
    /// Rewrite entries even when the role is already held.
    pub force: bool,
    /// Grant traverse on the ancestors up to the project root.
    pub traverse: bool,
    /// Follow symbolic links while descending.
    pub follow_symlinks: bool,
    /// Submit a batch job instead of applying in-process.
    pub batch: bool,
}

impl SetRolesOptions {
    const fn apply_options(self) -> ApplyOptions {
        ApplyOptions {
            recursive: self.recursive,
            follow_symlinks: self.follow_symlinks,
            batch: self.batch,
        }
    }
}

/// Options of [`AclBackend::del_users`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DelUsersOptions {
    /// Apply to the whole tree below the path.
    pub recursive: bool,
    /// Remove without checking that the principals have entries.
    pub force: bool,
    /// Follow symbolic links while descending.
    pub follow_symlinks: bool,
    /// Submit a batch job instead of applying in-process.
    pub batch: bool,
}

impl DelUsersOptions {
    const fn apply_options(self) -> ApplyOptions {
        ApplyOptions {
            recursive: self.recursive,
            follow_symlinks: self.follow_symlinks,
            batch: self.batch,
        }
    }
}

/// Roles found on one path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathRoles {
    /// Inspected path.
    pub path: PathBuf,
    /// Principals per role.
    pub roles: RoleMap,
}

/// Role management for one project on one filer family.
pub trait AclBackend {
    /// Filer family served.
    fn kind(&self) -> BackendKind;

    /// Root of the project.
    fn project_root(&self) -> &Path;

    /// Roles on `path`, and on everything below it when `recursive`.
    ///
    /// Paths whose ACL cannot be listed report no roles.
    fn get_roles(&self, path: &Path, recursive: bool) -> AclResult<Vec<PathRoles>>;

    /// Grants the roles in `request` on `path`.
    fn set_roles(
        &self,
        path: &Path,
        request: RoleRequest,
        options: SetRolesOptions,
    ) -> AclResult<ApplyOutcome>;

    /// Removes every entry of `users` from the ACL of `path`.
    fn del_users(
        &self,
        path: &Path,
        users: &[Principal],
        options: DelUsersOptions,
    ) -> AclResult<ApplyOutcome>;

    /// Writes a finished ACE list to `path`.
    fn apply(&self, path: &Path, aces: &[Ace], options: ApplyOptions) -> AclResult<ApplyOutcome>;
}

/// Backend driving the `nfs4_getfacl`/`nfs4_setfacl` tools.
#[derive(Debug)]
pub struct Nfs4Backend {
    project_root: PathBuf,
    profile: FilerProfile,
    services: Services,
}

impl Nfs4Backend {
    /// Backend for the project at `project_root`.
    pub fn new(project_root: impl Into<PathBuf>, profile: FilerProfile, services: Services) -> Self {
        Self {
            project_root: project_root.into(),
            profile,
            services,
        }
    }

    /// Filer constants in use.
    #[must_use]
    pub const fn profile(&self) -> &FilerProfile {
        &self.profile
    }

    /// Absolute form of `path`; relative paths are taken from the project root.
    pub fn resolve(&self, path: &Path) -> AclResult<PathBuf> {
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };
        if resolved.starts_with(&self.project_root) {
            Ok(resolved)
        } else {
            Err(AclError::OutsideProject {
                path: resolved,
                root: self.project_root.clone(),
            })
        }
    }

    fn lister(&self) -> AclLister<'_> {
        AclLister::new(
            &self.profile,
            self.services.runner.as_ref(),
            self.services.settings.listing_timeout,
        )
    }

    fn resolver(&self) -> RoleResolver<'_> {
        RoleResolver::new(&self.profile, self.services.identities.as_ref())
    }

    fn gateway(&self) -> ApplyGateway<'_> {
        ApplyGateway::new(&self.project_root, &self.profile, &self.services)
    }

    fn roles_of(&self, path: &Path) -> RoleMap {
        match self.lister().list(path) {
            Ok(aces) => self.resolver().classify(&aces),
            Err(err) => {
                warn!(target: "prjacl::acl", "{err}");
                RoleMap::new()
            }
        }
    }
}

impl AclBackend for Nfs4Backend {
    fn kind(&self) -> BackendKind {
        self.profile.kind()
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }

    fn get_roles(&self, path: &Path, recursive: bool) -> AclResult<Vec<PathRoles>> {
        let path = self.resolve(path)?;
        if !recursive {
            let roles = self.roles_of(&path);
            return Ok(vec![PathRoles { path, roles }]);
        }

        let mut found = Vec::new();
        for entry in jwalk::WalkDir::new(&path).sort(true).skip_hidden(false) {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    let roles = self.roles_of(&path);
                    found.push(PathRoles { path, roles });
                }
                Err(err) => warn!(target: "prjacl::acl", "skip unreadable entry: {err}"),
            }
        }
        Ok(found)
    }

    fn set_roles(
        &self,
        path: &Path,
        request: RoleRequest,
        options: SetRolesOptions,
    ) -> AclResult<ApplyOutcome> {
        let path = self.resolve(path)?;
        check_conflicts(&request)?;

        let current = self.lister().list(&path)?;
        let request = if options.force {
            request
        } else {
            filter_redundant(request, &self.resolver().classify_unchecked(&current))
        };
        if request.is_empty() {
            warn!(target: "prjacl::reconcile", "nothing to set on {}", path.display());
            return Ok(ApplyOutcome::Unchanged);
        }

        if options.traverse {
            let principals = request.principals();
            TraversalPropagator::new(&self.project_root, &self.profile, &self.services)
                .propagate(&path, &principals)?;
        }

        let aces = compose_role_acl(&self.profile, &current, &request);
        info!(target: "prjacl::reconcile", "setting roles on {}", path.display());
        self.gateway()
            .apply(&path, &aces, options.apply_options(), "set_roles")
    }

    fn del_users(
        &self,
        path: &Path,
        users: &[Principal],
        options: DelUsersOptions,
    ) -> AclResult<ApplyOutcome> {
        let path = self.resolve(path)?;
        let current = self.lister().list(&path)?;

        let removed = if options.force {
            let mut removed: Vec<Principal> = Vec::new();
            for user in users {
                if !removed.contains(user) {
                    removed.push(user.clone());
                }
            }
            removed
        } else {
            removable_principals(&self.profile, &current, users)
        };
        if removed.is_empty() {
            warn!(target: "prjacl::reconcile", "nothing to delete on {}", path.display());
            return Ok(ApplyOutcome::Unchanged);
        }

        let aces = compose_removal_acl(&current, &removed);
        self.gateway()
            .apply(&path, &aces, options.apply_options(), "del_users")
    }

    fn apply(&self, path: &Path, aces: &[Ace], options: ApplyOptions) -> AclResult<ApplyOutcome> {
        let path = self.resolve(path)?;
        self.gateway().apply(&path, aces, options, "apply")
    }
}

/// Backend for the project at `project_root` on the filer `profile` describes.
#[must_use]
pub fn open_backend(
    project_root: impl Into<PathBuf>,
    profile: FilerProfile,
    services: Services,
) -> Box<dyn AclBackend> {
    Box::new(Nfs4Backend::new(project_root, profile, services))
}

/// Server name prefixes mapped to filer families, first match wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendRules {
    rules: Vec<(String, BackendKind)>,
}

impl Default for BackendRules {
    fn default() -> Self {
        Self::new([
            ("atreides".to_owned(), BackendKind::NetApp),
            ("freenas".to_owned(), BackendKind::FreeNas),
        ])
    }
}

impl BackendRules {
    /// Rules in the given order.
    pub fn new(rules: impl IntoIterator<Item = (String, BackendKind)>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// Family of the filer named `server`.
    #[must_use]
    pub fn kind_for_server(&self, server: &str) -> Option<BackendKind> {
        self.rules
            .iter()
            .find(|(prefix, _)| server.starts_with(prefix.as_str()))
            .map(|&(_, kind)| kind)
    }

    /// Family of the filer exporting `path`, from the mount table.
    #[must_use]
    pub fn detect(&self, mounts: &MountTable, path: &Path) -> Option<BackendKind> {
        let server = mounts.nfs_server_for(path)?;
        let kind = self.kind_for_server(server);
        debug!(target: "prjacl::acl", "{} served by {server}: {kind:?}", path.display());
        kind
    }
}

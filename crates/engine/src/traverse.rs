//! crates/engine/src/traverse.rs
//!
//! Granting traverse on the directories above a target.
//!
//! A principal given a role on a sub-directory cannot reach it unless every
//! directory between it and the project root lets them pass. The propagator
//! walks upward from the target's parent to the project root inclusive and
//! adds a directory-inherited traverse entry for every principal that has no
//! entry at that level yet.
//!
//! Levels are applied one at a time and never rolled back: the first failure
//! stops the walk and leaves the levels already handled as they are.

use std::path::Path;

use acl::{FilerProfile, Principal};
use tracing::{debug, info};

use crate::error::AclResult;
use crate::gateway::{ApplyGateway, ApplyOptions};
use crate::listing::AclLister;
use crate::reconcile::compose_traverse_acl;
use crate::services::Services;

/// Adds traverse entries on the ancestors of a path.
pub struct TraversalPropagator<'a> {
    project_root: &'a Path,
    profile: &'a FilerProfile,
    services: &'a Services,
}

impl<'a> TraversalPropagator<'a> {
    /// Propagator bounded by `project_root`.
    pub fn new(project_root: &'a Path, profile: &'a FilerProfile, services: &'a Services) -> Self {
        Self {
            project_root,
            profile,
            services,
        }
    }

    /// Ensures `principals` may traverse every level from the parent of
    /// `target` up to the project root; returns the number of levels changed.
    pub fn propagate(&self, target: &Path, principals: &[Principal]) -> AclResult<usize> {
        let lister = AclLister::new(
            self.profile,
            self.services.runner.as_ref(),
            self.services.settings.listing_timeout,
        );
        let gateway = ApplyGateway::new(self.project_root, self.profile, self.services);

        let start = if target == self.project_root {
            self.project_root
        } else {
            target.parent().unwrap_or(self.project_root)
        };

        let mut changed = 0;
        let mut level = Some(start);
        while let Some(dir) = level.filter(|dir| dir.starts_with(self.project_root)) {
            let current = lister.list(dir)?;
            match compose_traverse_acl(self.profile, &current, principals) {
                Some(aces) => {
                    info!(target: "prjacl::traverse", "granting traverse on {}", dir.display());
                    gateway.apply(dir, &aces, ApplyOptions::new(), "traverse")?;
                    changed += 1;
                }
                None => debug!(target: "prjacl::traverse", "{} already traversable", dir.display()),
            }
            level = if dir == self.project_root { None } else { dir.parent() };
        }
        Ok(changed)
    }
}

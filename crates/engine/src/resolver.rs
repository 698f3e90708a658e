//! Classification of existing ACEs into roles.

use std::collections::BTreeMap;

use acl::{Ace, FilerProfile, Mask, Principal, Role};
use platform::IdentityDirectory;
use tracing::{debug, warn};

/// Principals holding each role, in ACL order.
pub type RoleMap = BTreeMap<Role, Vec<Principal>>;

/// Maps ACEs to the role whose mask they resemble most.
pub struct RoleResolver<'a> {
    profile: &'a FilerProfile,
    identities: &'a dyn IdentityDirectory,
}

impl<'a> RoleResolver<'a> {
    /// Creates a resolver for one filer profile.
    pub fn new(profile: &'a FilerProfile, identities: &'a dyn IdentityDirectory) -> Self {
        Self {
            profile,
            identities,
        }
    }

    /// The role whose ALLOW mask differs least from `mask`.
    ///
    /// The distance is the size of the symmetric difference. Ties go to the
    /// role that comes first in priority order.
    #[must_use]
    pub fn best_fit(&self, mask: &Mask) -> Role {
        let model = self.profile.model();
        Role::ALL
            .into_iter()
            .min_by_key(|&role| {
                let distance = mask.symmetric_difference_len(model.allow_mask(role));
                debug!(target: "prjacl::acl", "diff to role {role}: {distance}");
                distance
            })
            .unwrap_or(Role::Traverse)
    }

    /// The principal an ACE grants a role to, if it takes part in roles.
    ///
    /// Only ALLOW entries of non-default principals carry roles.
    #[must_use]
    pub fn role_principal(&self, ace: &Ace) -> Option<Principal> {
        (ace.is_allow() && !self.profile.is_default_principal(ace.principal_name()))
            .then(|| Principal::from_ace(ace))
    }

    /// Reports whether a principal exists in the identity directories.
    #[must_use]
    pub fn exists(&self, principal: &Principal) -> bool {
        match principal {
            Principal::User(name) => self.identities.user_exists(name),
            Principal::Group(name) => self.identities.group_exists(name),
        }
    }

    /// Role of a single ACE, without identity validation.
    #[must_use]
    pub fn classify_ace(&self, ace: &Ace) -> Option<(Principal, Role)> {
        self.role_principal(ace)
            .map(|principal| (principal, self.best_fit(&ace.mask)))
    }

    /// Roles held in `aces` by principals that exist.
    ///
    /// Entries naming unknown identities are reported and left out.
    #[must_use]
    pub fn classify(&self, aces: &[Ace]) -> RoleMap {
        self.collect(aces, true)
    }

    /// Roles held in `aces`, trusting every principal.
    ///
    /// Used where only membership matters, such as skipping assignments a
    /// principal already holds.
    #[must_use]
    pub fn classify_unchecked(&self, aces: &[Ace]) -> RoleMap {
        self.collect(aces, false)
    }

    fn collect(&self, aces: &[Ace], validate: bool) -> RoleMap {
        let mut roles = RoleMap::new();
        for ace in aces {
            let Some((principal, role)) = self.classify_ace(ace) else {
                continue;
            };
            if validate && !self.exists(&principal) {
                warn!(
                    target: "prjacl::acl",
                    "invalid system user {principal}: permission {}, role {role}", ace.mask
                );
                continue;
            }
            debug!(target: "prjacl::acl", "user {principal}: permission {}, role {role}", ace.mask);
            let holders = roles.entry(role).or_default();
            if !holders.contains(&principal) {
                holders.push(principal);
            }
        }
        roles
    }
}

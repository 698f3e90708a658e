//! Computation of new ACE lists from desired role changes.
//!
//! Everything here is pure: the functions take the current ACL and return the
//! ACL to write, leaving listing and application to the caller.
//!
//! The ACL is evaluated first-match-wins, so every list produced here keeps
//! group-scoped entries ahead of user-scoped ones. Default principals
//! (`OWNER@`, `GROUP@`, `EVERYONE@`) always sit in the user-scoped part.

use acl::{Ace, AceFlags, FilerProfile, Principal, Role};
use tracing::{debug, error, info, warn};

use crate::error::{AclError, AclResult};
use crate::resolver::RoleMap;

/// Roles to grant, one principal list per assignable role.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleRequest {
    /// Principals to become admin.
    pub admins: Vec<Principal>,
    /// Principals to become contributor.
    pub contributors: Vec<Principal>,
    /// Principals to become user.
    pub users: Vec<Principal>,
}

impl RoleRequest {
    /// Creates a request from the three role lists.
    pub fn new(admins: Vec<Principal>, contributors: Vec<Principal>, users: Vec<Principal>) -> Self {
        Self {
            admins,
            contributors,
            users,
        }
    }

    /// Principals requested for `role`; traverse is never requested directly.
    #[must_use]
    pub fn principals_for(&self, role: Role) -> &[Principal] {
        match role {
            Role::Admin => &self.admins,
            Role::Contributor => &self.contributors,
            Role::User => &self.users,
            Role::Traverse => &[],
        }
    }

    fn principals_for_mut(&mut self, role: Role) -> Option<&mut Vec<Principal>> {
        match role {
            Role::Admin => Some(&mut self.admins),
            Role::Contributor => Some(&mut self.contributors),
            Role::User => Some(&mut self.users),
            Role::Traverse => None,
        }
    }

    /// `(role, principals)` pairs in priority order.
    pub fn entries(&self) -> impl Iterator<Item = (Role, &[Principal])> {
        Role::ALL
            .into_iter()
            .map(|role| (role, self.principals_for(role)))
            .filter(|(_, principals)| !principals.is_empty())
    }

    /// Every requested principal once, in priority order.
    #[must_use]
    pub fn principals(&self) -> Vec<Principal> {
        let mut all: Vec<Principal> = Vec::new();
        for (_, principals) in self.entries() {
            for principal in principals {
                if !all.contains(principal) {
                    all.push(principal.clone());
                }
            }
        }
        all
    }

    /// Reports whether no role is requested for anyone.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admins.is_empty() && self.contributors.is_empty() && self.users.is_empty()
    }
}

/// Rejects requests naming a principal in more than one role.
pub fn check_conflicts(request: &RoleRequest) -> AclResult<()> {
    let mut seen: Vec<&Principal> = Vec::new();
    let mut conflicts: Vec<Principal> = Vec::new();
    for role in [Role::Admin, Role::Contributor, Role::User] {
        let mut in_role: Vec<&Principal> = Vec::new();
        for principal in request.principals_for(role) {
            if in_role.contains(&principal) {
                continue;
            }
            in_role.push(principal);
            if seen.contains(&principal) {
                if !conflicts.contains(principal) {
                    error!(
                        target: "prjacl::reconcile",
                        "user {principal} presents in multiple roles."
                    );
                    conflicts.push(principal.clone());
                }
            } else {
                seen.push(principal);
            }
        }
    }

    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(AclError::ValidationConflict {
            principals: conflicts,
        })
    }
}

/// Drops principals that already hold the role they are requested for.
#[must_use]
pub fn filter_redundant(mut request: RoleRequest, current: &RoleMap) -> RoleRequest {
    for (role, holders) in current {
        let Some(wanted) = request.principals_for_mut(*role) else {
            continue;
        };
        wanted.retain(|principal| {
            let redundant = holders.contains(principal);
            if redundant {
                warn!(target: "prjacl::reconcile", "skip redundant role setting: {principal} -> {role}");
            }
            !redundant
        });
    }
    request
}

/// ACL split into the group-scoped part and the user-scoped part.
#[derive(Debug, Default)]
struct Sublists {
    groups: Vec<Ace>,
    users: Vec<Ace>,
}

impl Sublists {
    fn split<'a>(profile: &FilerProfile, aces: impl IntoIterator<Item = &'a Ace>) -> Self {
        let mut lists = Self::default();
        for ace in aces {
            if is_group_scoped(profile, ace) {
                lists.groups.push(ace.clone());
            } else {
                lists.users.push(ace.clone());
            }
        }
        lists
    }

    fn push_front(&mut self, ace: Ace) {
        if ace.is_group() {
            self.groups.insert(0, ace);
        } else {
            self.users.insert(0, ace);
        }
    }

    fn join(self) -> Vec<Ace> {
        let mut aces = self.groups;
        aces.extend(self.users);
        aces
    }
}

fn is_group_scoped(profile: &FilerProfile, ace: &Ace) -> bool {
    ace.is_group() && !profile.is_default_principal(ace.principal_name())
}

fn grant(profile: &FilerProfile, principal: &Principal, role: Role, flags: &str) -> Ace {
    let mut flags = flags.to_owned();
    if principal.is_group() {
        flags.push(AceFlags::IDENTIFIER_GROUP);
    }
    Ace::allow(
        flags,
        principal.qualified(profile.domain()),
        profile.model().allow_mask(role).clone(),
    )
}

/// Builds the ACL granting `request` on top of `current`.
///
/// Entries of requested principals are replaced; every other entry is kept
/// in its relative order. New entries are inherited by files and
/// directories and are placed at the head of their part of the list.
#[must_use]
pub fn compose_role_acl(profile: &FilerProfile, current: &[Ace], request: &RoleRequest) -> Vec<Ace> {
    let requested = request.principals();
    let kept = current
        .iter()
        .filter(|ace| !requested.contains(&Principal::from_ace(ace)));
    let mut lists = Sublists::split(profile, kept);

    for (role, principals) in request.entries() {
        info!(target: "prjacl::reconcile", "setting {role} permission ...");
        for principal in principals {
            lists.push_front(grant(profile, principal, role, "fd"));
        }
    }
    lists.join()
}

/// Builds the ACL granting traverse to principals missing from `current`.
///
/// Returns `None` when every principal already has an entry, which is taken
/// to mean it can already pass through.
#[must_use]
pub fn compose_traverse_acl(
    profile: &FilerProfile,
    current: &[Ace],
    principals: &[Principal],
) -> Option<Vec<Ace>> {
    let present: Vec<Principal> = current.iter().map(Principal::from_ace).collect();
    let missing: Vec<&Principal> = principals
        .iter()
        .filter(|principal| !present.contains(principal))
        .collect();
    if missing.is_empty() {
        return None;
    }

    let mut lists = Sublists::split(profile, current);
    for principal in missing {
        debug!(target: "prjacl::traverse", "adding user to traverse role: {principal}");
        lists.push_front(grant(profile, principal, Role::Traverse, "d"));
    }
    Some(lists.join())
}

/// The requested principals that actually have entries in `current`.
///
/// Principals without entries are reported and left out.
#[must_use]
pub fn removable_principals(profile: &FilerProfile, current: &[Ace], requested: &[Principal]) -> Vec<Principal> {
    let present: Vec<Principal> = current
        .iter()
        .filter(|ace| !profile.is_default_principal(ace.principal_name()))
        .map(Principal::from_ace)
        .collect();

    let mut removable: Vec<Principal> = Vec::new();
    for principal in requested {
        if !present.contains(principal) {
            warn!(target: "prjacl::reconcile", "ignore user not presented in ACL: {principal}");
        } else if !removable.contains(principal) {
            removable.push(principal.clone());
        }
    }
    removable
}

/// `current` without any entry of the `removed` principals.
#[must_use]
pub fn compose_removal_acl(current: &[Ace], removed: &[Principal]) -> Vec<Ace> {
    current
        .iter()
        .filter(|ace| {
            let principal = Principal::from_ace(ace);
            let drop = removed.contains(&principal);
            if drop {
                info!(target: "prjacl::reconcile", "deleting ACEs of user: {principal}");
            }
            !drop
        })
        .cloned()
        .collect()
}

/// Reports whether every group-scoped entry precedes every user-scoped one.
#[must_use]
pub fn is_partitioned(profile: &FilerProfile, aces: &[Ace]) -> bool {
    let first_user = aces
        .iter()
        .position(|ace| !is_group_scoped(profile, ace))
        .unwrap_or(aces.len());
    aces[first_user..]
        .iter()
        .all(|ace| !is_group_scoped(profile, ace))
}

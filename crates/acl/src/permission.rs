//! crates/acl/src/permission.rs
//!
//! Translation between roles and NFSv4 permission masks.
//!
//! Each role is described by a raw mask that may use alias characters as
//! shorthand for groups of rights (for example `R` for the read-like rights
//! `rntcy`). Expanding the aliases and removing duplicates yields the ALLOW
//! mask; the DENY mask is its complement within the universal alphabet, so
//! for every role `ALLOW ∪ DENY` is the alphabet and `ALLOW ∩ DENY` is empty.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::error;

use crate::ace::Mask;
use crate::role::Role;

/// Universal NFSv4 permission alphabet.
pub const NFS4_ALPHABET: &str = "rwaDdxnNtTcCoy";

/// Alias expansions shared by the NFSv4 filers.
pub const NFS4_ALIASES: [(char, &str); 3] = [('R', "rntcy"), ('W', "watTNcCy"), ('X', "xtcy")];

/// Raw role masks shared by the NFSv4 filers.
pub const NFS4_ROLE_MASKS: [(Role, &str); 4] = [
    (Role::Admin, "RXWdDoy"),
    (Role::Contributor, "rwaDdxnNtTcy"),
    (Role::User, "RXy"),
    (Role::Traverse, "x"),
];

/// Errors raised when a permission model is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A role has no raw mask.
    #[error("no permission mask defined for role {0}")]
    MissingRole(Role),
    /// A role expands to a character outside the alphabet.
    #[error("role {role} expands to '{ch}', which is not in the permission alphabet")]
    OutsideAlphabet {
        /// Offending role.
        role: Role,
        /// Character not found in the alphabet.
        ch: char,
    },
}

/// ALLOW and DENY masks of a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMask {
    /// Rights granted by the role.
    pub allow: Mask,
    /// Remaining rights of the alphabet.
    pub deny: Mask,
}

/// Immutable role-to-mask table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionModel {
    alphabet: Mask,
    expanded: BTreeMap<Role, RoleMask>,
}

impl PermissionModel {
    /// Builds and validates a model.
    ///
    /// Every role must have a raw mask and every expanded character must be
    /// drawn from `alphabet`.
    pub fn new<'a, A, R>(alphabet: &str, aliases: A, roles: R) -> Result<Self, ModelError>
    where
        A: IntoIterator<Item = (char, &'a str)>,
        R: IntoIterator<Item = (Role, &'a str)>,
    {
        let alphabet = Mask::from(alphabet);
        let aliases: Vec<(char, String)> = aliases
            .into_iter()
            .map(|(alias, expansion)| (alias, expansion.to_owned()))
            .collect();
        let raw: BTreeMap<Role, String> = roles
            .into_iter()
            .map(|(role, mask)| (role, mask.to_owned()))
            .collect();

        let mut expanded = BTreeMap::new();
        for role in Role::ALL {
            let raw_mask = raw.get(&role).ok_or(ModelError::MissingRole(role))?;
            let allow = expand_with(&alphabet, &aliases, raw_mask);
            if let Some(ch) = allow.iter().find(|&c| !alphabet.contains(c)) {
                return Err(ModelError::OutsideAlphabet { role, ch });
            }
            let deny = alphabet.difference(&allow);
            expanded.insert(role, RoleMask { allow, deny });
        }

        Ok(Self { alphabet, expanded })
    }

    /// The model used by NFSv4 filers.
    #[must_use]
    pub fn nfs4() -> Self {
        Self::new(NFS4_ALPHABET, NFS4_ALIASES, NFS4_ROLE_MASKS)
            .expect("NFS4_ROLE_MASKS covers every role and expands within NFS4_ALPHABET")
    }

    /// The universal permission alphabet.
    #[must_use]
    pub const fn alphabet(&self) -> &Mask {
        &self.alphabet
    }

    /// ALLOW/DENY masks of a role.
    #[must_use]
    pub fn permission(&self, role: Role) -> &RoleMask {
        &self.expanded[&role]
    }

    /// ALLOW mask of a role.
    #[must_use]
    pub fn allow_mask(&self, role: Role) -> &Mask {
        &self.permission(role).allow
    }

    /// Looks up masks by role name.
    ///
    /// Unknown names are logged and yield `None`; callers must treat that as
    /// an empty permission rather than abort.
    #[must_use]
    pub fn permission_by_name(&self, name: &str) -> Option<&RoleMask> {
        match name.parse::<Role>() {
            Ok(role) => Some(self.permission(role)),
            Err(err) => {
                error!(target: "prjacl::acl", "{err}");
                None
            }
        }
    }
}

fn expand_with(alphabet: &Mask, aliases: &[(char, String)], raw: &str) -> Mask {
    let mut chars = Mask::new();
    for c in raw.chars() {
        match aliases.iter().find(|(alias, _)| *alias == c) {
            Some((_, expansion)) => expansion.chars().for_each(|e| {
                chars.insert(e);
            }),
            None => {
                chars.insert(c);
            }
        }
    }

    // Alphabet order first, then anything foreign in first-seen order.
    alphabet.intersection(&chars).union(&chars)
}

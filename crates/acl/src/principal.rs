//! crates/acl/src/principal.rs
//!
//! User and group identities as handled outside a raw ACE.
//!
//! Inside an ACE a group is recognised by the `g` flag; everywhere else
//! (command line, role reports, reconciliation keys) it is written with a
//! `g:` prefix so that a user and a group sharing a name stay distinct.

use std::fmt;

use crate::ace::Ace;

/// A system user or group identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Principal {
    /// A user account.
    User(String),
    /// A group, written `g:name`.
    Group(String),
}

impl Principal {
    /// Prefix marking group principals in textual form.
    pub const GROUP_PREFIX: &'static str = "g:";

    /// Parses `name` or `g:name`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text.strip_prefix(Self::GROUP_PREFIX) {
            Some(group) => Self::Group(group.to_owned()),
            None => Self::User(text.to_owned()),
        }
    }

    /// Derives the principal an ACE refers to.
    #[must_use]
    pub fn from_ace(ace: &Ace) -> Self {
        let name = ace.principal_name().to_owned();
        if ace.is_group() {
            Self::Group(name)
        } else {
            Self::User(name)
        }
    }

    /// Bare identity name without prefix or domain.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::User(name) | Self::Group(name) => name,
        }
    }

    /// Reports whether this is a group identity.
    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Principal string as written into a new ACE (`name@domain`).
    #[must_use]
    pub fn qualified(&self, domain: &str) -> String {
        if domain.is_empty() {
            self.name().to_owned()
        } else {
            format!("{}@{domain}", self.name())
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(name) => f.write_str(name),
            Self::Group(name) => write!(f, "{}{name}", Self::GROUP_PREFIX),
        }
    }
}

/// Splits a comma-separated list into principals, dropping blanks and repeats.
#[must_use]
pub fn parse_principal_list(csv: &str) -> Vec<Principal> {
    let mut principals: Vec<Principal> = Vec::new();
    for item in csv.split(',') {
        if item.trim().is_empty() {
            continue;
        }
        let principal = Principal::parse(item);
        if !principals.contains(&principal) {
            principals.push(principal);
        }
    }
    principals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ace::Mask;

    #[test]
    fn parse_user_and_group() {
        assert_eq!(Principal::parse("alice"), Principal::User("alice".into()));
        assert_eq!(Principal::parse("g:staff"), Principal::Group("staff".into()));
        assert_eq!(Principal::parse("g:staff").to_string(), "g:staff");
    }

    #[test]
    fn from_ace_uses_group_flag() {
        let group = Ace::allow("fdg", "staff@example.org", Mask::from("r"));
        let user = Ace::allow("fd", "staff@example.org", Mask::from("r"));
        assert_eq!(Principal::from_ace(&group), Principal::Group("staff".into()));
        assert_eq!(Principal::from_ace(&user), Principal::User("staff".into()));
    }

    #[test]
    fn qualified_appends_domain() {
        assert_eq!(
            Principal::parse("g:staff").qualified("example.org"),
            "staff@example.org"
        );
        assert_eq!(Principal::parse("bob").qualified(""), "bob");
    }

    #[test]
    fn list_parsing() {
        let list = parse_principal_list(" alice, g:staff,,alice ,bob");
        assert_eq!(
            list,
            vec![
                Principal::User("alice".into()),
                Principal::Group("staff".into()),
                Principal::User("bob".into()),
            ]
        );
        assert!(parse_principal_list("").is_empty());
    }
}

//! crates/acl/src/ace.rs
//!
//! NFSv4 Access Control Entries in their textual form.
//!
//! NFSv4 ACLs are evaluated in order and the first matching ACE wins, so an
//! ACL is always handled as an ordered `Vec<Ace>`. Each ACE in the textual
//! syntax understood by `nfs4_getfacl`/`nfs4_setfacl` is a colon-delimited
//! record:
//!
//! ```text
//! type:flags:principal:mask
//! A:fd:alice@example.org:rwaDdxnNtTcCoy
//! ```
//!
//! - **type**: `A` (allow), `D` (deny), `U` (audit) or `L` (alarm).
//! - **flags**: inheritance bits (`f` file-inherit, `d` directory-inherit, ...)
//!   plus `g` when the principal names a group.
//! - **principal**: identity, optionally suffixed with `@domain`.
//! - **mask**: set of permission characters.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while parsing a single textual ACE.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAceError {
    /// The record did not split into exactly four colon-delimited fields.
    #[error("expected 4 colon-delimited fields, found {found}")]
    FieldCount {
        /// Number of fields found in the record.
        found: usize,
    },
    /// The type field is not one of `A`, `D`, `U`, `L`.
    #[error("invalid ACE type '{0}'")]
    InvalidType(String),
    /// The principal field is empty.
    #[error("ACE principal is empty")]
    EmptyPrincipal,
}

/// NFSv4 ACE type values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AceType {
    /// Access allowed.
    Allow,
    /// Access denied.
    Deny,
    /// Audit (log access attempts).
    Audit,
    /// Alarm (trigger alarm on access).
    Alarm,
}

impl AceType {
    /// Returns the single-letter code used in the textual syntax.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Allow => 'A',
            Self::Deny => 'D',
            Self::Audit => 'U',
            Self::Alarm => 'L',
        }
    }
}

impl FromStr for AceType {
    type Err = ParseAceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Self::Allow),
            "D" => Ok(Self::Deny),
            "U" => Ok(Self::Audit),
            "L" => Ok(Self::Alarm),
            other => Err(ParseAceError::InvalidType(other.to_owned())),
        }
    }
}

impl fmt::Display for AceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// NFSv4 ACE flags kept in their textual form.
///
/// The characters are preserved verbatim so that untouched entries are written
/// back exactly as they were listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AceFlags(String);

impl AceFlags {
    /// ACE applies to files in this directory.
    pub const FILE_INHERIT: char = 'f';
    /// ACE applies to subdirectories.
    pub const DIRECTORY_INHERIT: char = 'd';
    /// Principal is a group.
    pub const IDENTIFIER_GROUP: char = 'g';

    /// Creates flags from their textual form.
    pub fn new(flags: impl Into<String>) -> Self {
        Self(flags.into())
    }

    /// Returns the flags as written in the ACE.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks whether the given flag character is present.
    #[must_use]
    pub fn contains(&self, flag: char) -> bool {
        self.0.contains(flag)
    }

    /// Reports whether the ACE principal is a group identity.
    ///
    /// The check is case-insensitive, matching how listings from different
    /// filers spell the group bit.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.0
            .chars()
            .any(|c| c.eq_ignore_ascii_case(&Self::IDENTIFIER_GROUP))
    }

    /// Returns a copy carrying both file- and directory-inherit bits.
    ///
    /// Existing `f`/`d` characters are removed and re-prepended so the result
    /// always starts with `fd` followed by the remaining flags in order.
    #[must_use]
    pub fn with_inheritance(&self) -> Self {
        let rest: String = self
            .0
            .chars()
            .filter(|&c| c != Self::FILE_INHERIT && c != Self::DIRECTORY_INHERIT)
            .collect();
        Self(format!(
            "{}{}{rest}",
            Self::FILE_INHERIT,
            Self::DIRECTORY_INHERIT
        ))
    }
}

impl fmt::Display for AceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A set of permission characters.
///
/// Masks compare as sets but remember the order in which characters were
/// first seen, so a parsed mask renders back to its original spelling.
#[derive(Debug, Clone, Default)]
pub struct Mask {
    chars: Vec<char>,
}

impl Mask {
    /// Creates an empty mask.
    #[must_use]
    pub const fn new() -> Self {
        Self { chars: Vec::new() }
    }

    /// Builds a mask from characters, dropping duplicates.
    pub fn from_chars<I: IntoIterator<Item = char>>(chars: I) -> Self {
        let mut mask = Self::new();
        for c in chars {
            mask.insert(c);
        }
        mask
    }

    /// Adds a character; returns `false` when it was already present.
    pub fn insert(&mut self, c: char) -> bool {
        if self.chars.contains(&c) {
            false
        } else {
            self.chars.push(c);
            true
        }
    }

    /// Checks whether the character is part of the mask.
    #[must_use]
    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    /// Number of distinct characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Returns true if the mask holds no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Iterates over the characters in mask order.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }

    /// Characters of `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self::from_chars(self.iter().filter(|&c| !other.contains(c)))
    }

    /// Characters present in both masks.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self::from_chars(self.iter().filter(|&c| other.contains(c)))
    }

    /// Characters present in either mask.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::from_chars(self.iter().chain(other.iter()))
    }

    /// Cardinality of the symmetric difference with `other`.
    #[must_use]
    pub fn symmetric_difference_len(&self, other: &Self) -> usize {
        self.difference(other).len() + other.difference(self).len()
    }
}

impl PartialEq for Mask {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|c| other.contains(c))
    }
}

impl Eq for Mask {}

impl From<&str> for Mask {
    fn from(value: &str) -> Self {
        Self::from_chars(value.chars())
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.chars {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// A single NFSv4 Access Control Entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ace {
    /// Type of ACE (allow/deny/audit/alarm).
    pub ace_type: AceType,
    /// ACE flags (inheritance, group indicator, ...).
    pub flags: AceFlags,
    /// Principal identifier, possibly with an `@domain` suffix.
    pub principal: String,
    /// Access mask (permissions).
    pub mask: Mask,
}

impl Ace {
    /// Creates an ALLOW entry.
    pub fn allow(flags: impl Into<String>, principal: impl Into<String>, mask: Mask) -> Self {
        Self {
            ace_type: AceType::Allow,
            flags: AceFlags::new(flags),
            principal: principal.into(),
            mask,
        }
    }

    /// Returns the principal without its `@domain` suffix.
    #[must_use]
    pub fn principal_name(&self) -> &str {
        self.principal
            .split_once('@')
            .map_or(self.principal.as_str(), |(name, _)| name)
    }

    /// Reports whether the entry names a group identity.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.flags.is_group()
    }

    /// Reports whether the entry grants access.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        self.ace_type == AceType::Allow
    }
}

impl fmt::Display for Ace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.ace_type, self.flags, self.principal, self.mask
        )
    }
}

impl FromStr for Ace {
    type Err = ParseAceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().split(':').collect();
        let [ace_type, flags, principal, mask] = fields.as_slice() else {
            return Err(ParseAceError::FieldCount {
                found: fields.len(),
            });
        };

        if principal.is_empty() {
            return Err(ParseAceError::EmptyPrincipal);
        }

        Ok(Self {
            ace_type: ace_type.parse()?,
            flags: AceFlags::new(*flags),
            principal: (*principal).to_owned(),
            mask: Mask::from(*mask),
        })
    }
}

//! crates/acl/src/codec.rs
//!
//! Conversion between ACL listings and ordered ACE lists.
//!
//! `nfs4_getfacl` prints one ACE per line; `nfs4_setfacl -s` expects the whole
//! ACL as a single comma-joined argument. Parsing is lossy-tolerant: lines
//! that are not shaped like an ACE (headers, banners) are skipped with a debug
//! note. A record with the four ACE fields that still fails to parse is
//! skipped with a warning, since rewriting the ACL drops it from the filer.

use tracing::{debug, warn};

use crate::ace::Ace;

/// Separator between ACEs in the `nfs4_setfacl` argument form.
pub const ACE_SEPARATOR: char = ',';

/// Parses a newline-separated ACL listing into ACEs, in listing order.
///
/// Blank lines and `#` comments are ignored; malformed records are skipped.
#[must_use]
pub fn parse_listing(listing: &str) -> Vec<Ace> {
    let mut aces = Vec::new();
    for line in listing.lines() {
        let record = line.trim();
        if record.is_empty() || record.starts_with('#') {
            continue;
        }
        if let Some(ace) = parse_record(record) {
            aces.push(ace);
        }
    }
    aces
}

/// Parses the comma-joined argument form produced by [`serialize`].
#[must_use]
pub fn parse_joined(joined: &str) -> Vec<Ace> {
    let mut aces = Vec::new();
    for record in joined.split(ACE_SEPARATOR) {
        let record = record.trim();
        if record.is_empty() {
            continue;
        }
        if let Some(ace) = parse_record(record) {
            aces.push(ace);
        }
    }
    aces
}

/// Parses one record, reporting why it was skipped.
fn parse_record(record: &str) -> Option<Ace> {
    match record.parse::<Ace>() {
        Ok(ace) => Some(ace),
        Err(error) if looks_like_ace(record) => {
            warn!(target: "prjacl::acl", "dropping unparsable ACE '{record}': {error}");
            None
        }
        Err(error) => {
            debug!(target: "prjacl::acl", "skipping non-ACE line '{record}': {error}");
            None
        }
    }
}

/// Whether `record` has the `type:flags:principal:mask` shape of an ACE.
fn looks_like_ace(record: &str) -> bool {
    record.split(':').count() == 4
}

/// Joins ACEs with commas, preserving their order exactly.
#[must_use]
pub fn serialize(aces: &[Ace]) -> String {
    aces.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&ACE_SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ace::{AceType, Mask};

    const LISTING: &str = "\
# file: /project/3010000.01/
A:fdg:staff@example.org:rxtncy
A:fd:alice@example.org:rwaDdxnNtTcCoy
A:fd:OWNER@:rwaDdxnNtTcCoy
not-an-ace
A:fdg:GROUP@:rxtncy

A:fd:EVERYONE@:rxtncy
";

    #[test]
    fn listing_skips_comments_and_malformed_records() {
        let aces = parse_listing(LISTING);
        assert_eq!(aces.len(), 5);
        assert_eq!(aces[0].principal, "staff@example.org");
        assert_eq!(aces[1].principal, "alice@example.org");
        assert_eq!(aces[4].principal, "EVERYONE@");
        assert!(aces.iter().all(|ace| ace.ace_type == AceType::Allow));
    }

    #[test]
    fn serialize_preserves_order() {
        let aces = vec![
            Ace::allow("fd", "bob@example.org", Mask::from("rx")),
            Ace::allow("fdg", "staff@example.org", Mask::from("r")),
        ];
        assert_eq!(
            serialize(&aces),
            "A:fd:bob@example.org:rx,A:fdg:staff@example.org:r"
        );
    }

    #[test]
    fn serialize_then_parse_reproduces_entries() {
        let aces = parse_listing(LISTING);
        let reparsed = parse_joined(&serialize(&aces));
        assert_eq!(reparsed, aces);
    }

    #[test]
    fn ace_shaped_records_are_told_apart_from_noise() {
        assert!(looks_like_ace("X:fd:bob@example.org:rx"));
        assert!(looks_like_ace("A:fd::rx"));
        assert!(!looks_like_ace("not-an-ace"));
        assert!(!looks_like_ace("# file: /project/3010000.01/"));
    }

    #[test]
    fn unparsable_ace_shaped_records_are_dropped() {
        let aces = parse_listing("X:fd:bob@example.org:rx\nA:fd::rx\nA:fd:OWNER@:rwaDdxnNtTcCoy\n");
        assert_eq!(aces.len(), 1);
        assert_eq!(aces[0].principal, "OWNER@");
        assert!(parse_record("X:fd:bob@example.org:rx").is_none());
    }

    #[test]
    fn empty_inputs() {
        assert!(parse_listing("").is_empty());
        assert!(parse_joined("").is_empty());
        assert_eq!(serialize(&[]), "");
    }
}

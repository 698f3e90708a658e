//! Fetching the current ACL of a path.

use std::path::Path;
use std::time::Duration;

use acl::{Ace, FilerProfile, codec};
use platform::{CommandRunner, CommandSpec};
use tracing::{debug, error};

use crate::error::{AclError, AclResult};

/// Path argument for the filer tools.
///
/// Directories get a trailing `/` on filers that need it to address a
/// volume root rather than its junction.
pub(crate) fn tool_path(profile: &FilerProfile, path: &Path) -> String {
    let mut text = path.display().to_string();
    if profile.directory_trailing_slash() && path.is_dir() && !text.ends_with('/') {
        text.push('/');
    }
    text
}

/// Runs the ACL listing program of a filer.
pub struct AclLister<'a> {
    profile: &'a FilerProfile,
    runner: &'a dyn CommandRunner,
    timeout: Duration,
}

impl<'a> AclLister<'a> {
    /// Lister bounded by `timeout`.
    pub fn new(profile: &'a FilerProfile, runner: &'a dyn CommandRunner, timeout: Duration) -> Self {
        Self {
            profile,
            runner,
            timeout,
        }
    }

    /// ACEs currently attached to `path`, in order.
    pub fn list(&self, path: &Path) -> AclResult<Vec<Ace>> {
        let spec = CommandSpec::new(self.profile.getfacl())
            .arg(tool_path(self.profile, path))
            .with_timeout(self.timeout);
        debug!(target: "prjacl::cmd", "{spec}");

        let output = self.runner.run(&spec)?;
        if !output.success() {
            error!(target: "prjacl::cmd", "{spec} failed: {}", output.stderr.trim());
            return Err(AclError::Listing {
                path: path.to_path_buf(),
                reason: output.stderr.trim().to_owned(),
            });
        }
        Ok(codec::parse_listing(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFiler;

    #[test]
    fn netapp_directories_get_trailing_slash() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("data.txt");
        std::fs::write(&file, b"x").expect("write");

        let netapp = FilerProfile::netapp();
        let freenas = FilerProfile::freenas();
        assert!(tool_path(&netapp, dir.path()).ends_with('/'));
        assert!(!tool_path(&netapp, &file).ends_with('/'));
        assert!(!tool_path(&freenas, dir.path()).ends_with('/'));
    }

    #[test]
    fn listing_parses_stdout() {
        let filer = FakeFiler::default();
        filer.seed("/project/p1", "A:fd:OWNER@:rwaDdxnNtTcCoy\nA:fd:bob@dccn.nl:rxntcy\n");
        let profile = FilerProfile::freenas();

        let aces = AclLister::new(&profile, &filer, Duration::from_secs(5))
            .list(Path::new("/project/p1"))
            .expect("listing");

        assert_eq!(aces.len(), 2);
        assert_eq!(aces[1].principal, "bob@dccn.nl");
    }

    #[test]
    fn failing_listing_is_an_error() {
        let filer = FakeFiler::default();
        let profile = FilerProfile::freenas();
        let err = AclLister::new(&profile, &filer, Duration::from_secs(5))
            .list(Path::new("/project/missing"))
            .unwrap_err();
        assert!(matches!(err, AclError::Listing { .. }));
    }
}

//! Project lock marker doubling as an audit record.
//!
//! The marker `<project_root>/.setacl_lock` is created with `O_CREAT|O_EXCL`
//! right before the ACL setting program runs and holds a JSON record of who
//! applied which ACL. Its presence blocks every other mutation of the
//! project. A crashed holder leaves it behind; [`LockMarker::age`] and the
//! `unlock` command exist for that case.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use acl::Ace;
use platform::Submitter;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, error, warn};

use crate::error::{AclError, AclResult};

/// File name of the lock marker below the project root.
pub const LOCK_FILE_NAME: &str = ".setacl_lock";

/// Who applied which ACL, and when.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Moment the lock was taken.
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    /// Address of the submitting host.
    pub ip: String,
    /// Account of the submitter.
    pub uid: String,
    /// ACEs being applied, in order.
    pub aces: Vec<String>,
}

impl AuditRecord {
    /// Record for `aces` submitted now by `submitter`.
    #[must_use]
    pub fn new(submitter: &Submitter, aces: &[Ace]) -> Self {
        Self {
            time: OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
            ip: submitter.ip().to_owned(),
            uid: submitter.uid().to_owned(),
            aces: aces.iter().map(ToString::to_string).collect(),
        }
    }
}

/// The lock marker of one project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockMarker {
    path: PathBuf,
}

impl LockMarker {
    /// Marker of the project rooted at `root`.
    #[must_use]
    pub fn for_project(root: &Path) -> Self {
        Self {
            path: root.join(LOCK_FILE_NAME),
        }
    }

    /// Reports whether the marker exists.
    #[must_use]
    pub fn is_held(&self) -> bool {
        fs::symlink_metadata(&self.path).is_ok()
    }

    /// Fails with [`AclError::LockContention`] when the marker exists.
    pub fn ensure_free(&self) -> AclResult<()> {
        if self.is_held() {
            error!(
                target: "prjacl::lock",
                "cannot setacl as lock file '{}' has been acquired by other process",
                self.path.display()
            );
            return Err(self.contention());
        }
        Ok(())
    }

    /// Atomically creates the marker holding `record`.
    ///
    /// Losing the creation race is reported as contention. The returned guard
    /// removes the marker when dropped.
    pub fn acquire(&self, record: &AuditRecord) -> AclResult<LockGuard> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .map_err(|err| {
                if err.kind() == io::ErrorKind::AlreadyExists {
                    error!(target: "prjacl::lock", "lock file '{}' appeared concurrently", self.path.display());
                    self.contention()
                } else {
                    AclError::io(format!("cannot create lock file {}", self.path.display()), err)
                }
            })?;
        let guard = LockGuard {
            path: self.path.clone(),
        };
        write_record(file, record)
            .map_err(|err| AclError::io(format!("cannot write lock file {}", self.path.display()), err))?;
        debug!(target: "prjacl::lock", "acquired {}", self.path.display());
        Ok(guard)
    }

    /// Audit record stored in the marker, if it exists and parses.
    pub fn read_record(&self) -> AclResult<Option<AuditRecord>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(AclError::io(
                    format!("cannot read lock file {}", self.path.display()),
                    err,
                ));
            }
        };
        match serde_json::from_str(&text) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!(target: "prjacl::lock", "unreadable audit record in {}: {err}", self.path.display());
                Ok(None)
            }
        }
    }

    /// Time since the marker was last modified, `None` when not held.
    pub fn age(&self) -> AclResult<Option<Duration>> {
        match fs::symlink_metadata(&self.path) {
            Ok(meta) => {
                let modified = meta
                    .modified()
                    .map_err(|err| AclError::io(format!("cannot stat {}", self.path.display()), err))?;
                Ok(Some(
                    SystemTime::now()
                        .duration_since(modified)
                        .unwrap_or(Duration::ZERO),
                ))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AclError::io(format!("cannot stat {}", self.path.display()), err)),
        }
    }

    /// Removes the marker; returns whether one was present.
    pub fn remove(&self) -> AclResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(AclError::io(
                format!("cannot remove lock file {}", self.path.display()),
                err,
            )),
        }
    }

    fn contention(&self) -> AclError {
        AclError::LockContention {
            path: self.path.clone(),
        }
    }
}

fn write_record(mut file: File, record: &AuditRecord) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut file, record)?;
    file.write_all(b"\n")?;
    file.sync_all()
}

/// Holds a project lock; releases it on drop.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // A failed removal must not mask the result of the guarded command.
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(target: "prjacl::lock", "released {}", self.path.display()),
            Err(err) => warn!(target: "prjacl::lock", "cannot remove lock file {}: {err}", self.path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use acl::Mask;

    use super::*;

    fn record() -> AuditRecord {
        AuditRecord::new(
            &Submitter::new("alice", "10.0.0.1"),
            &[Ace::allow("fd", "OWNER@", Mask::from("rwaDdxnNtTcCoy"))],
        )
    }

    #[test]
    fn acquire_writes_record_and_guard_releases() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = LockMarker::for_project(dir.path());

        {
            let _guard = marker.acquire(&record()).expect("acquire");
            assert!(marker.is_held());
            assert!(dir.path().join(LOCK_FILE_NAME).exists());
            let stored = marker.read_record().expect("read").expect("record");
            assert_eq!(stored.uid, "alice");
            assert_eq!(stored.ip, "10.0.0.1");
            assert_eq!(stored.aces, vec!["A:fd:OWNER@:rwaDdxnNtTcCoy"]);
        }

        assert!(!marker.is_held());
    }

    #[test]
    fn second_acquire_is_contention() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = LockMarker::for_project(dir.path());
        let _held = marker.acquire(&record()).expect("first acquire");

        let err = marker.acquire(&record()).unwrap_err();
        assert!(matches!(err, AclError::LockContention { .. }));
        assert!(matches!(marker.ensure_free(), Err(AclError::LockContention { .. })));
    }

    #[test]
    fn record_time_is_rfc3339() {
        let json = serde_json::to_value(record()).expect("serialize");
        let time = json["time"].as_str().expect("time string");
        assert!(time.contains('T'));
        let parsed: AuditRecord = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed.uid, "alice");
    }

    #[test]
    fn age_and_remove() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = LockMarker::for_project(dir.path());
        assert_eq!(marker.age().expect("age"), None);
        assert!(!marker.remove().expect("remove absent"));

        fs::write(&marker.path, "{}").expect("stale marker");
        assert!(marker.age().expect("age").is_some());
        assert_eq!(marker.read_record().expect("read"), None);
        assert!(marker.remove().expect("remove"));
        assert!(marker.ensure_free().is_ok());
    }
}

//! In-memory collaborators for engine tests.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use batch::{BatchResult, JobId, JobScheduler, JobSpec};
use platform::{
    CommandError, CommandOutput, CommandRunner, CommandSpec, IdentityDirectory, LazySubmitter,
    SpaceProbe, Submitter,
};

use crate::services::{EngineSettings, Services};

/// Identity directory answering from fixed name sets.
#[derive(Debug, Default)]
pub(crate) struct StaticIdentities {
    users: HashSet<String>,
    groups: HashSet<String>,
}

impl StaticIdentities {
    pub(crate) fn new<'a>(
        users: impl IntoIterator<Item = &'a str>,
        groups: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            users: users.into_iter().map(str::to_owned).collect(),
            groups: groups.into_iter().map(str::to_owned).collect(),
        }
    }
}

impl IdentityDirectory for StaticIdentities {
    fn user_exists(&self, name: &str) -> bool {
        self.users.contains(name)
    }

    fn group_exists(&self, name: &str) -> bool {
        self.groups.contains(name)
    }
}

fn key(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/".to_owned() } else { trimmed.to_owned() }
}

/// Filer double storing one listing per path.
///
/// A call whose arguments contain `-s` is treated as the setting program:
/// the argument after `-s` is the ACL and the next one the path. Anything
/// else lists the ACL of its last argument. The setting program can be made
/// to exit non-zero or to run past its deadline.
#[derive(Debug, Default)]
pub(crate) struct FakeFiler {
    acls: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<CommandSpec>>,
    fail_set: Mutex<Option<i32>>,
    stall_set: Mutex<Option<Duration>>,
    watched_lock: Mutex<Option<PathBuf>>,
    lock_seen: Mutex<Vec<bool>>,
}

impl FakeFiler {
    pub(crate) fn seed(&self, path: &str, listing: &str) {
        if let Ok(mut acls) = self.acls.lock() {
            acls.insert(key(path), listing.to_owned());
        }
    }

    pub(crate) fn listing(&self, path: &str) -> Option<String> {
        self.acls.lock().ok()?.get(&key(path)).cloned()
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub(crate) fn set_calls(&self) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|spec| spec.arguments().iter().any(|a| a == "-s"))
            .collect()
    }

    pub(crate) fn fail_set_with(&self, status: i32) {
        if let Ok(mut fail) = self.fail_set.lock() {
            *fail = Some(status);
        }
    }

    /// Makes every set call end as if killed after `after`.
    pub(crate) fn stall_set_after(&self, after: Duration) {
        if let Ok(mut stall) = self.stall_set.lock() {
            *stall = Some(after);
        }
    }

    /// Records, on every set call, whether `path` exists at that moment.
    pub(crate) fn watch_lock(&self, path: &Path) {
        if let Ok(mut watched) = self.watched_lock.lock() {
            *watched = Some(path.to_path_buf());
        }
    }

    pub(crate) fn lock_seen(&self) -> Vec<bool> {
        self.lock_seen.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn observe_lock(&self) {
        if let Some(lock) = self.watched_lock.lock().ok().and_then(|p| p.clone()) {
            if let Ok(mut seen) = self.lock_seen.lock() {
                seen.push(lock.exists());
            }
        }
    }

    fn set(&self, args: &[String]) -> CommandOutput {
        if let Some(status) = self.fail_set.lock().ok().and_then(|f| *f) {
            return CommandOutput::failed(status, "Failed setxattr operation: Invalid argument");
        }
        let Some(pos) = args.iter().position(|a| a == "-s") else {
            return CommandOutput::failed(2, "missing -s");
        };
        let (Some(aces), Some(path)) = (args.get(pos + 1), args.get(pos + 2)) else {
            return CommandOutput::failed(2, "missing operands");
        };
        self.seed(path, &aces.split(',').collect::<Vec<_>>().join("\n"));
        CommandOutput::ok("")
    }
}

impl CommandRunner for FakeFiler {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }
        let args = spec.arguments();
        if args.iter().any(|a| a == "-s") {
            self.observe_lock();
            if let Some(after) = self.stall_set.lock().ok().and_then(|s| *s) {
                return Err(CommandError::TimedOut {
                    command: spec.to_string(),
                    after,
                });
            }
            return Ok(self.set(args));
        }
        let path = args.last().map(String::as_str).unwrap_or_default();
        Ok(match self.listing(path) {
            Some(listing) => CommandOutput::ok(listing),
            None => CommandOutput::failed(1, format!("{path}: No such file or directory")),
        })
    }
}

/// Space probe reporting a constant amount.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedSpace(pub(crate) u64);

impl SpaceProbe for FixedSpace {
    fn available_blocks(&self, _path: &Path) -> io::Result<u64> {
        Ok(self.0)
    }
}

/// Scheduler accepting every job under id `1.pbs`.
#[derive(Debug, Default)]
pub(crate) struct RecordingScheduler {
    jobs: Mutex<Vec<JobSpec>>,
}

impl RecordingScheduler {
    pub(crate) fn jobs(&self) -> Vec<JobSpec> {
        self.jobs.lock().map(|j| j.clone()).unwrap_or_default()
    }
}

impl JobScheduler for RecordingScheduler {
    fn submit(&self, job: &JobSpec) -> BatchResult<JobId> {
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.push(job.clone());
        }
        Ok(JobId::new("1.pbs"))
    }
}

/// A wired set of fakes, with handles kept for assertions.
pub(crate) struct Fixture {
    pub(crate) filer: Arc<FakeFiler>,
    pub(crate) scheduler: Arc<RecordingScheduler>,
    pub(crate) services: Services,
}

impl Fixture {
    /// Fakes knowing users alice, bob, carol, dave and group lab.
    pub(crate) fn new() -> Self {
        Self::with_space(1_000_000)
    }

    pub(crate) fn with_space(blocks: u64) -> Self {
        let filer = Arc::new(FakeFiler::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let services = Services {
            runner: filer.clone(),
            identities: Arc::new(StaticIdentities::new(
                ["alice", "bob", "carol", "dave"],
                ["lab"],
            )),
            space: Arc::new(FixedSpace(blocks)),
            scheduler: scheduler.clone(),
            submitter: LazySubmitter::known(Submitter::new("operator", "10.0.0.1")),
            settings: EngineSettings::default(),
        };
        Self {
            filer,
            scheduler,
            services,
        }
    }
}

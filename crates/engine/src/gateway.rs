//! Guarded application of a finished ACE list.
//!
//! Every mutation of a project ACL passes through [`ApplyGateway::apply`],
//! which performs, in order:
//!
//! 1. the lock check (a held marker aborts with no mutation),
//! 2. the quota guard (too little free space aborts with no mutation),
//! 3. curation of the ACE list,
//! 4. either the synchronous path (take the lock with an audit record, run
//!    the setting program under a timeout, release the lock) or the batch
//!    path (submit a job that later re-enters this gateway through
//!    `prjacl apply`).

use std::path::Path;

use acl::{Ace, FilerProfile, Principal, codec};
use batch::{JobId, JobSpec};
use platform::CommandSpec;
use tracing::{debug, error, info, warn};

use crate::error::{AclError, AclResult};
use crate::listing::tool_path;
use crate::lock::{AuditRecord, LockMarker};
use crate::resolver::RoleResolver;
use crate::services::Services;

/// How the setting program is run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Descend into the directory tree (`-R`).
    pub recursive: bool,
    /// Follow symbolic links while descending (`-L`).
    pub follow_symlinks: bool,
    /// Submit a batch job instead of running in-process.
    pub batch: bool,
}

impl ApplyOptions {
    /// Non-recursive synchronous application.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            recursive: false,
            follow_symlinks: false,
            batch: false,
        }
    }

    /// Sets recursive descent.
    #[must_use]
    pub const fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Sets symbolic link following.
    #[must_use]
    pub const fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Sets batch submission.
    #[must_use]
    pub const fn batch(mut self, batch: bool) -> Self {
        self.batch = batch;
        self
    }
}

/// Result of a successful operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Nothing had to change.
    Unchanged,
    /// The ACL was written in-process.
    Applied,
    /// A batch job was accepted by the scheduler.
    Submitted(JobId),
}

impl ApplyOutcome {
    /// Job id for batch submissions.
    #[must_use]
    pub const fn job_id(&self) -> Option<&JobId> {
        match self {
            Self::Submitted(id) => Some(id),
            Self::Unchanged | Self::Applied => None,
        }
    }
}

/// Applies ACE lists below one project root.
pub struct ApplyGateway<'a> {
    project_root: &'a Path,
    profile: &'a FilerProfile,
    services: &'a Services,
}

impl<'a> ApplyGateway<'a> {
    /// Gateway for the project rooted at `project_root`.
    pub fn new(project_root: &'a Path, profile: &'a FilerProfile, services: &'a Services) -> Self {
        Self {
            project_root,
            profile,
            services,
        }
    }

    /// Lock marker of the project.
    #[must_use]
    pub fn lock(&self) -> LockMarker {
        LockMarker::for_project(self.project_root)
    }

    /// Replaces the ACL of `path` with `aces`.
    ///
    /// `label` names the operation in batch job names.
    pub fn apply(
        &self,
        path: &Path,
        aces: &[Ace],
        options: ApplyOptions,
        label: &str,
    ) -> AclResult<ApplyOutcome> {
        if !path.starts_with(self.project_root) {
            return Err(AclError::OutsideProject {
                path: path.to_path_buf(),
                root: self.project_root.to_path_buf(),
            });
        }

        let lock = self.lock();
        lock.ensure_free()?;
        self.check_quota()?;

        let curated = self.curate(aces);
        debug!(target: "prjacl::acl", "new ACL of {}:", path.display());
        for ace in &curated {
            debug!(target: "prjacl::acl", "  {ace}");
        }

        if options.batch {
            self.submit(path, &curated, options, label)
        } else {
            self.execute(&lock, path, &curated, options)
        }
    }

    /// Fails when the project filesystem is below the free space threshold.
    pub fn check_quota(&self) -> AclResult<()> {
        let available = self
            .services
            .space
            .available_blocks(self.project_root)
            .map_err(|err| {
                AclError::io(format!("cannot check quota of {}", self.project_root.display()), err)
            })?;
        if available < self.services.settings.min_free_blocks {
            error!(
                target: "prjacl::acl",
                "insufficient quota ({available} 1k-block available) for {}",
                self.project_root.display()
            );
            return Err(AclError::QuotaExceeded {
                root: self.project_root.to_path_buf(),
                available,
            });
        }
        Ok(())
    }

    /// Normalises default principals and drops entries of unknown identities.
    ///
    /// Default principals always get file and directory inheritance so that
    /// every filer family ends up with the same effective ACL.
    #[must_use]
    pub fn curate(&self, aces: &[Ace]) -> Vec<Ace> {
        let resolver = RoleResolver::new(self.profile, self.services.identities.as_ref());
        aces.iter()
            .filter_map(|ace| {
                if self.profile.is_default_principal(ace.principal_name()) {
                    let mut ace = ace.clone();
                    ace.flags = ace.flags.with_inheritance();
                    return Some(ace);
                }
                let principal = Principal::from_ace(ace);
                if resolver.exists(&principal) {
                    Some(ace.clone())
                } else {
                    warn!(target: "prjacl::acl", "ignore ACE for invalid user: {principal}");
                    None
                }
            })
            .collect()
    }

    /// Arguments of the setting program, flags first.
    #[must_use]
    pub fn setfacl_args(&self, path: &Path, aces: &[Ace], options: ApplyOptions) -> Vec<String> {
        let mut args = Vec::new();
        if options.follow_symlinks {
            args.push("-L".to_owned());
        }
        if options.recursive {
            args.push("-R".to_owned());
        }
        args.push("-s".to_owned());
        args.push(codec::serialize(aces));
        args.push(tool_path(self.profile, path));
        args
    }

    fn execute(
        &self,
        lock: &LockMarker,
        path: &Path,
        aces: &[Ace],
        options: ApplyOptions,
    ) -> AclResult<ApplyOutcome> {
        let record = AuditRecord::new(self.services.submitter.get(), aces);
        let _guard = lock.acquire(&record)?;

        let spec = CommandSpec::new(self.profile.setfacl())
            .args(self.setfacl_args(path, aces, options))
            .with_timeout(self.services.settings.command_timeout);
        info!(target: "prjacl::cmd", "{spec}");

        let output = self.services.runner.run(&spec).map_err(|err| {
            error!(target: "prjacl::cmd", "{err}");
            AclError::from(err)
        })?;
        if !output.success() {
            error!(target: "prjacl::cmd", "{spec} failed: {}", output.stderr.trim());
            return Err(AclError::CommandFailure {
                command: spec.to_string(),
                status: output.status,
                stderr: output.stderr.trim().to_owned(),
            });
        }
        Ok(ApplyOutcome::Applied)
    }

    fn submit(
        &self,
        path: &Path,
        aces: &[Ace],
        options: ApplyOptions,
        label: &str,
    ) -> AclResult<ApplyOutcome> {
        let job = self.job_spec(path, aces, options, label);
        let id = self.services.scheduler.submit(&job).map_err(|err| {
            error!(target: "prjacl::batch", "fail to submit batch job: {err}");
            AclError::from(err)
        })?;
        info!(target: "prjacl::batch", "job submitted: {id}");
        Ok(ApplyOutcome::Submitted(id))
    }

    /// Job re-applying `aces` to `path` through `prjacl apply`.
    ///
    /// The job records the submitting user and host in its audit record,
    /// not the execution node.
    #[must_use]
    pub fn job_spec(&self, path: &Path, aces: &[Ace], options: ApplyOptions, label: &str) -> JobSpec {
        let settings = &self.services.settings.batch;
        let project = self
            .project_root
            .file_name()
            .map_or_else(|| "project".to_owned(), |name| name.to_string_lossy().into_owned());

        let submitter = self.services.submitter.get();

        let mut command = vec![settings.program.display().to_string()];
        command.extend(settings.global_args.iter().cloned());
        command.extend([
            "apply".to_owned(),
            "--project-root".to_owned(),
            self.project_root.display().to_string(),
            "--aces".to_owned(),
            codec::serialize(aces),
            "--backend".to_owned(),
            self.profile.kind().name().to_owned(),
            "--audit-uid".to_owned(),
            submitter.uid().to_owned(),
            "--audit-ip".to_owned(),
            submitter.ip().to_owned(),
        ]);
        if options.recursive {
            command.push("-r".to_owned());
        }
        if options.follow_symlinks {
            command.push("-L".to_owned());
        }
        command.push(path.display().to_string());

        JobSpec::new(format!("{label}_{project}"), command)
            .with_queue(settings.queue.clone())
            .with_resources(settings.walltime.clone(), settings.memory.clone())
    }
}

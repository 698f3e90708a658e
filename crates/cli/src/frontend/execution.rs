use std::cell::OnceCell;
use std::env;
use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use acl::{Ace, BackendKind, FilerProfile, Principal, Role};
use batch::QsubScheduler;
use engine::services::DEFAULT_PROGRAM;
use engine::{
    AclBackend, ApplyOptions, ApplyOutcome, BatchSettings, DelUsersOptions, EngineSettings,
    ExitCode, HasExitCode, LockMarker, RoleRequest, Services, SetRolesOptions, open_backend,
};
use logging::Verbosity;
use platform::{
    CommandRunner, LazySubmitter, MountTable, ProcessRunner, StatvfsProbe, Submitter, SystemIdentities,
};
use tracing::{info, warn};

use super::arguments::{Action, Target};
use crate::config::Config;

/// Production collaborators configured from `config`.
///
/// Batch jobs re-run this binary with the same configuration file and
/// verbosity.
pub(crate) fn system_services(config: &Config, verbosity: Verbosity) -> Services {
    let runner: Arc<dyn CommandRunner> = Arc::new(ProcessRunner);
    let scheduler = QsubScheduler::new(Arc::clone(&runner))
        .with_program(config.batch.submit.clone())
        .with_timeout(config.batch.submit_timeout);
    let program = config
        .batch
        .program
        .clone()
        .or_else(|| env::current_exe().ok())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAM));
    let mut global_args = vec!["-l".to_owned(), verbosity.level().to_string()];
    if let Some(source) = &config.source {
        global_args.push("--config".to_owned());
        global_args.push(source.display().to_string());
    }

    Services {
        runner,
        identities: Arc::new(SystemIdentities),
        space: Arc::new(StatvfsProbe),
        scheduler: Arc::new(scheduler),
        submitter: LazySubmitter::current(),
        settings: EngineSettings {
            command_timeout: config.command_timeout,
            listing_timeout: config.listing_timeout,
            min_free_blocks: config.min_free_blocks,
            batch: BatchSettings {
                queue: config.batch.queue.clone(),
                walltime: config.batch.walltime.clone(),
                memory: config.batch.memory.clone(),
                program,
                global_args,
            },
        },
    }
}

/// State shared by all projects of one invocation.
pub(crate) struct Session<'a, Out, Err> {
    config: &'a Config,
    services: Services,
    mounts: OnceCell<Option<MountTable>>,
    stdout: &'a mut Out,
    stderr: &'a mut Err,
    status: ExitCode,
}

impl<'a, Out: Write, Err: Write> Session<'a, Out, Err> {
    pub(crate) fn new(config: &'a Config, services: Services, stdout: &'a mut Out, stderr: &'a mut Err) -> Self {
        Self {
            config,
            services,
            mounts: OnceCell::new(),
            stdout,
            stderr,
            status: ExitCode::Ok,
        }
    }

    pub(crate) fn run(mut self, action: Action) -> ExitCode {
        match action {
            Action::Get { target, recursive } => self.get(&target, recursive),
            Action::Set {
                target,
                request,
                options,
            } => self.set(&target, &request, options),
            Action::Del {
                target,
                users,
                options,
            } => self.del(&target, users, options),
            Action::Apply {
                project_root,
                aces,
                path,
                backend,
                options,
                submitter,
            } => self.apply(&project_root, &aces, &path, backend, options, submitter),
            Action::Unlock {
                projects,
                basedir,
                max_age,
                force,
            } => self.unlock(&projects, basedir.as_deref(), max_age, force),
        }
        self.status
    }

    fn fail(&mut self, err: &(impl Display + HasExitCode)) {
        let _ = writeln!(self.stderr, "prjacl: {err}");
        self.status = err.exit_code();
    }

    fn usage(&mut self, message: &str) {
        let _ = writeln!(self.stderr, "prjacl: {message}");
        self.status = ExitCode::Syntax;
    }

    fn detect(&self, root: &Path) -> Option<BackendKind> {
        let mounts = self.mounts.get_or_init(|| match MountTable::load() {
            Ok(table) => Some(table),
            Err(err) => {
                warn!(target: "prjacl::acl", "cannot read mount table: {err}");
                None
            }
        });
        self.config.backends.detect(mounts.as_ref()?, root)
    }

    fn backend(&self, root: &Path, explicit: Option<BackendKind>) -> Option<Box<dyn AclBackend>> {
        let Some(kind) = explicit.or_else(|| self.detect(root)) else {
            warn!(target: "prjacl::acl", "skip {}: not served by a supported filer", root.display());
            return None;
        };
        let profile = FilerProfile::for_kind(kind)
            .with_domain(self.config.domain.clone())
            .with_programs(self.config.getfacl.clone(), self.config.setfacl.clone());
        Some(open_backend(root, profile, self.services.clone()))
    }

    /// Project roots of `target` that exist, each with its backend and the
    /// path to operate on.
    fn projects(&mut self, target: &Target, mutating: bool) -> Vec<(Box<dyn AclBackend>, PathBuf)> {
        let basedir = target
            .basedir
            .clone()
            .unwrap_or_else(|| self.config.project_basedir.clone());
        let mut selected = Vec::new();
        for id in &target.projects {
            let root = basedir.join(id);
            if !root.is_dir() {
                warn!(target: "prjacl::acl", "project directory not found: {}", root.display());
                continue;
            }
            if mutating && target.path.is_some() && !self.config.subdir_allowed(id) {
                self.usage(&format!("setting ACL on sub-directories is not enabled for project {id}"));
                continue;
            }
            let path = target
                .path
                .as_ref()
                .map_or_else(|| root.clone(), |path| root.join(path));
            if let Some(backend) = self.backend(&root, target.backend) {
                selected.push((backend, path));
            }
        }
        selected
    }

    fn report_outcome(&mut self, outcome: &ApplyOutcome, path: &Path) {
        match outcome {
            ApplyOutcome::Submitted(id) => {
                let _ = writeln!(self.stdout, "{id}");
            }
            ApplyOutcome::Applied => info!(target: "prjacl::acl", "ACL of {} updated", path.display()),
            ApplyOutcome::Unchanged => info!(target: "prjacl::acl", "ACL of {} unchanged", path.display()),
        }
    }

    fn get(&mut self, target: &Target, recursive: bool) {
        for (backend, path) in self.projects(target, false) {
            match backend.get_roles(&path, recursive) {
                Ok(found) => {
                    for entry in found {
                        let _ = writeln!(self.stdout, "{}:", entry.path.display());
                        for role in Role::ALL {
                            let names: Vec<String> = entry
                                .roles
                                .get(&role)
                                .map(|holders| holders.iter().map(ToString::to_string).collect())
                                .unwrap_or_default();
                            let _ = writeln!(self.stdout, "  {role}: {}", names.join(","));
                        }
                    }
                }
                Err(err) => self.fail(&err),
            }
        }
    }

    fn set(&mut self, target: &Target, request: &RoleRequest, options: SetRolesOptions) {
        if request.is_empty() {
            self.usage("no role given; use --admin, --contributor or --user");
            return;
        }
        for (backend, path) in self.projects(target, true) {
            match backend.set_roles(&path, request.clone(), options) {
                Ok(outcome) => self.report_outcome(&outcome, &path),
                Err(err) => self.fail(&err),
            }
        }
    }

    fn del(&mut self, target: &Target, mut users: Vec<Principal>, options: DelUsersOptions) {
        let me = Principal::User(platform::current_user());
        if users.contains(&me) {
            warn!(target: "prjacl::acl", "cannot remove yourself from the ACL: {me}");
            users.retain(|user| user != &me);
        }
        if users.is_empty() {
            self.usage("no user to delete");
            return;
        }
        for (backend, path) in self.projects(target, true) {
            match backend.del_users(&path, &users, options) {
                Ok(outcome) => self.report_outcome(&outcome, &path),
                Err(err) => self.fail(&err),
            }
        }
    }

    fn apply(
        &mut self,
        project_root: &Path,
        aces: &[Ace],
        path: &Path,
        backend: Option<BackendKind>,
        options: ApplyOptions,
        submitter: Option<Submitter>,
    ) {
        if aces.is_empty() {
            self.usage("refusing to write an empty ACL");
            return;
        }
        if let Some(submitter) = submitter {
            self.services.submitter = LazySubmitter::known(submitter);
        }
        let Some(backend) = self.backend(project_root, backend) else {
            self.usage(&format!("cannot determine the filer of {}", project_root.display()));
            return;
        };
        match backend.apply(path, aces, options) {
            Ok(outcome) => self.report_outcome(&outcome, path),
            Err(err) => self.fail(&err),
        }
    }

    fn unlock(&mut self, projects: &[String], basedir: Option<&Path>, max_age: Duration, force: bool) {
        let basedir = basedir.map_or_else(|| self.config.project_basedir.clone(), Path::to_path_buf);
        for id in projects {
            let marker = LockMarker::for_project(&basedir.join(id));
            let age = match marker.age() {
                Ok(Some(age)) => age,
                Ok(None) => {
                    let _ = writeln!(self.stdout, "{id}: not locked");
                    continue;
                }
                Err(err) => {
                    self.fail(&err);
                    continue;
                }
            };

            match marker.read_record() {
                Ok(Some(record)) => {
                    let _ = writeln!(
                        self.stdout,
                        "{id}: locked by {}@{} at {} ({} ACEs)",
                        record.uid,
                        record.ip,
                        record.time,
                        record.aces.len()
                    );
                }
                Ok(None) => {
                    let _ = writeln!(self.stdout, "{id}: locked, no audit record");
                }
                Err(err) => self.fail(&err),
            }

            if !force && age < max_age {
                let _ = writeln!(
                    self.stderr,
                    "prjacl: {id}: lock is {}s old, younger than {}s; use --force to remove it",
                    age.as_secs(),
                    max_age.as_secs()
                );
                self.status = ExitCode::LockContention;
                continue;
            }
            match marker.remove() {
                Ok(_) => {
                    let _ = writeln!(self.stdout, "{id}: lock removed");
                }
                Err(err) => self.fail(&err),
            }
        }
    }
}

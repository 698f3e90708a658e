//! End-to-end runs of `prjacl` against stand-in filer tools.
//!
//! The stand-ins keep one ACL file per path in a state directory, so the
//! binary sees a consistent filer across invocations.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

const PROJECT: &str = "3010000.01";

const INITIAL_ACL: &str = "\
A::OWNER@:rwaDdxnNtTcCoy
A:g:GROUP@:rxtncy
A::EVERYONE@:tncy
";

struct Site {
    dir: TempDir,
}

impl Site {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let site = Self { dir };
        fs::create_dir_all(site.project()).expect("project dir");
        fs::create_dir_all(site.state()).expect("state dir");
        fs::create_dir_all(site.path("bin")).expect("bin dir");

        let state = site.state();
        let key = r#"key=$(printf '%s' "$target" | sed 's:/*$::; s:/:_:g')"#;
        site.script(
            "getfacl",
            &format!(
                "target=\"$1\"\n{key}\n\
                 [ -f \"{state}/$key\" ] || {{ echo \"Failed to instantiate ACL\" >&2; exit 1; }}\n\
                 cat \"{state}/$key\"\n",
                state = state.display()
            ),
        );
        site.script(
            "setfacl",
            &format!(
                "while [ $# -gt 0 ]; do\n\
                 case \"$1\" in\n\
                 -s) aces=\"$2\"; shift 2 ;;\n\
                 -R|-L) shift ;;\n\
                 *) target=\"$1\"; shift ;;\n\
                 esac\n\
                 done\n\
                 {key}\n\
                 [ -e \"{root}/.setacl_lock\" ] || {{ echo \"lock not held\" >&2; exit 9; }}\n\
                 printf '%s\\n' \"$aces\" | tr ',' '\\n' > \"{state}/$key\"\n",
                root = site.project().display(),
                state = state.display()
            ),
        );
        site.script(
            "qsub",
            &format!("cp \"$1\" \"{}/job.sh\"\necho 42.pbs\n", state.display()),
        );

        let config = format!(
            "[PPS]\nPROJECT_BASEDIR = {basedir}\n\n\
             [ACL]\nDOMAIN = example.org\nGETFACL = {bin}/getfacl\nSETFACL = {bin}/setfacl\n\n\
             [BATCH]\nSUBMIT = {bin}/qsub\nPROGRAM = {program}\n",
            basedir = site.path("project").display(),
            bin = site.path("bin").display(),
            program = env!("CARGO_BIN_EXE_prjacl"),
        );
        fs::write(site.config(), config).expect("config");
        site.seed(&site.project(), INITIAL_ACL);
        site
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn project(&self) -> PathBuf {
        self.path("project").join(PROJECT)
    }

    fn state(&self) -> PathBuf {
        self.path("state")
    }

    fn config(&self) -> PathBuf {
        self.path("config.ini")
    }

    fn lock(&self) -> PathBuf {
        self.project().join(".setacl_lock")
    }

    fn script(&self, name: &str, body: &str) {
        let path = self.path("bin").join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    }

    fn key(path: &Path) -> String {
        path.to_string_lossy().trim_end_matches('/').replace('/', "_")
    }

    fn seed(&self, path: &Path, acl: &str) {
        fs::write(self.state().join(Self::key(path)), acl).expect("seed ACL");
    }

    fn acl(&self, path: &Path) -> String {
        fs::read_to_string(self.state().join(Self::key(path))).expect("ACL state")
    }

    fn prjacl(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_prjacl"));
        cmd.env_remove("PRJACL_LOG")
            .env_remove("PRJACL_CONFIG")
            .arg("--config")
            .arg(self.config());
        cmd
    }
}

#[test]
fn set_then_get_then_del() {
    let site = Site::new();

    site.prjacl()
        .args(["set", "--admin", "daemon", "--user", "g:root", "--backend", "freenas", PROJECT])
        .assert()
        .success();

    let acl = site.acl(&site.project());
    assert!(acl.contains("A:fd:daemon@example.org:rwaDdxnNtTcCoy\n"), "{acl}");
    assert!(acl.contains("A:fdg:root@example.org:rxntcy\n"), "{acl}");
    assert!(acl.contains("A:fd:OWNER@:rwaDdxnNtTcCoy\n"), "{acl}");
    assert!(!site.lock().exists());

    site.prjacl()
        .args(["get", "--backend", "freenas", PROJECT])
        .assert()
        .success()
        .stdout(contains(format!("{}:\n", site.project().display())))
        .stdout(contains("  admin: daemon\n"))
        .stdout(contains("  user: g:root\n"));

    site.prjacl()
        .args(["del", "daemon", "--backend", "freenas", PROJECT])
        .assert()
        .success();

    let acl = site.acl(&site.project());
    assert!(!acl.contains("daemon@"), "{acl}");
    assert!(acl.contains("root@example.org"), "{acl}");
}

#[test]
fn held_lock_refuses_changes() {
    let site = Site::new();
    fs::write(site.lock(), "{}").expect("lock");

    site.prjacl()
        .args(["set", "--admin", "daemon", "--backend", "freenas", PROJECT])
        .assert()
        .code(3);

    assert_eq!(site.acl(&site.project()), INITIAL_ACL);
    assert!(site.lock().exists());
}

#[test]
fn conflicting_roles_are_rejected() {
    let site = Site::new();

    site.prjacl()
        .args(["set", "--admin", "daemon", "--user", "daemon", "--backend", "freenas", PROJECT])
        .assert()
        .code(2)
        .stderr(contains("daemon"));

    assert_eq!(site.acl(&site.project()), INITIAL_ACL);
}

#[test]
fn unreadable_acl_fails_mutations_but_not_reports() {
    let site = Site::new();
    fs::remove_file(site.state().join(Site::key(&site.project()))).expect("drop ACL state");

    site.prjacl()
        .args(["del", "daemon", "--backend", "freenas", PROJECT])
        .assert()
        .code(8)
        .stderr(contains("Failed to instantiate ACL"));

    site.prjacl()
        .args(["get", "--backend", "freenas", PROJECT])
        .assert()
        .success()
        .stdout(contains("  admin: \n"));
}

#[test]
fn unlock_keeps_fresh_locks_unless_forced() {
    let site = Site::new();
    fs::write(site.lock(), "not json").expect("lock");

    site.prjacl()
        .args(["unlock", PROJECT])
        .assert()
        .code(3)
        .stdout(contains("locked, no audit record"))
        .stderr(contains("--force"));
    assert!(site.lock().exists());

    site.prjacl()
        .args(["unlock", "-f", PROJECT])
        .assert()
        .success()
        .stdout(contains("lock removed"));
    assert!(!site.lock().exists());

    site.prjacl()
        .args(["unlock", PROJECT])
        .assert()
        .success()
        .stdout(contains("not locked"));
}

#[test]
fn batch_job_applies_the_composed_acl() {
    let site = Site::new();

    site.prjacl()
        .args(["-l", "2", "set", "-b", "--contributor", "daemon", "--backend", "freenas", PROJECT])
        .assert()
        .success()
        .stdout("42.pbs\n");

    // Submission does not touch the ACL.
    assert_eq!(site.acl(&site.project()), INITIAL_ACL);

    let job = site.state().join("job.sh");
    let script = fs::read_to_string(&job).expect("job script");
    assert!(script.contains(&format!("#PBS -N set_roles_{PROJECT}")));
    assert!(script.contains(" -l 2 --config "));
    assert!(script.contains(" apply --project-root "));
    assert!(script.contains(" --audit-uid ") && script.contains(" --audit-ip "));

    let status = StdCommand::new("sh")
        .arg(&job)
        .env_remove("PRJACL_LOG")
        .status()
        .expect("run job");
    assert!(status.success());

    let acl = site.acl(&site.project());
    assert!(acl.contains("A:fd:daemon@example.org:rwaDdxnNtTcy\n"), "{acl}");
    assert!(!site.lock().exists());
}

#[test]
fn missing_projects_are_skipped_with_a_warning() {
    let site = Site::new();

    site.prjacl()
        .args(["get", "--backend", "freenas", "3099999.99"])
        .assert()
        .success()
        .stdout("")
        .stderr(contains("project directory not found").or(contains("3099999.99")));
}

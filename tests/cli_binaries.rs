use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::{contains, starts_with};

fn prjacl() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_prjacl"));
    cmd.env_remove("PRJACL_CONFIG").env_remove("PRJACL_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    prjacl()
        .arg("--help")
        .assert()
        .success()
        .stderr("")
        .stdout(contains("Usage:"))
        .stdout(contains("get").and(contains("set")).and(contains("del")))
        .stdout(contains("unlock"));
}

#[test]
fn version_goes_to_stdout() {
    prjacl()
        .arg("--version")
        .assert()
        .success()
        .stdout(starts_with("prjacl "));
}

#[test]
fn without_operands_shows_usage_and_fails() {
    prjacl().assert().code(1).stderr(contains("Usage:"));
}

#[test]
fn unknown_subcommand_is_a_syntax_error() {
    prjacl()
        .arg("chmod")
        .assert()
        .code(1)
        .stderr(contains("unrecognized subcommand"));
}

#[test]
fn loglevel_out_of_range_is_rejected() {
    prjacl().args(["-l", "7", "get", "3010000.01"]).assert().code(1);
}

#[test]
fn missing_config_file_exits_with_config_status() {
    prjacl()
        .args(["--config", "/nonexistent/prjacl.ini", "get", "3010000.01"])
        .assert()
        .code(10)
        .stderr(contains("prjacl: failed to read '/nonexistent/prjacl.ini'"));
}

#[test]
fn malformed_config_reports_the_line() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("config.ini");
    std::fs::write(&config, "[ACL]\nCOMMAND_TIMEOUT = soon\n").expect("write config");

    prjacl()
        .arg("--config")
        .arg(&config)
        .args(["get", "3010000.01"])
        .assert()
        .code(10)
        .stderr(contains("line 2"));
}

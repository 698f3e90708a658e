use std::path::PathBuf;
use std::time::Duration;

use acl::{BackendKind, Principal, parse_principal_list};
use platform::Submitter;

use super::arguments::{Action, parse_args};
use super::run;

#[test]
fn set_collects_role_lists_and_flags() {
    let parsed = parse_args([
        "prjacl", "-l", "3", "set", "--admin", "alice,g:lab", "--user", "bob", "--user", "carol",
        "-r", "-t", "-b", "-L", "--backend", "freenas", "3010000.01", "3010000.02",
    ])
    .expect("parse");

    assert_eq!(parsed.loglevel, 3);
    let Action::Set {
        target,
        request,
        options,
    } = parsed.action
    else {
        panic!("expected set");
    };
    assert_eq!(request.admins, parse_principal_list("alice,g:lab"));
    assert!(request.contributors.is_empty());
    assert_eq!(request.users, parse_principal_list("bob,carol"));
    assert!(options.recursive && options.traverse && options.batch && options.follow_symlinks);
    assert!(!options.force);
    assert_eq!(target.projects, vec!["3010000.01", "3010000.02"]);
    assert_eq!(target.backend, Some(BackendKind::FreeNas));
}

#[test]
fn del_takes_user_list_before_projects() {
    let parsed = parse_args(["prjacl", "del", "bob,g:lab", "3010000.01", "-p", "data", "-f"])
        .expect("parse");

    let Action::Del {
        target,
        users,
        options,
    } = parsed.action
    else {
        panic!("expected del");
    };
    assert_eq!(users, vec![Principal::parse("bob"), Principal::parse("g:lab")]);
    assert_eq!(target.path, Some(PathBuf::from("data")));
    assert!(options.force);
}

#[test]
fn apply_parses_joined_aces() {
    let parsed = parse_args([
        "prjacl",
        "apply",
        "--project-root",
        "/project/3010000.01",
        "--aces",
        "A:fd:OWNER@:rwaDdxnNtTcCoy,A:fd:bob@dccn.nl:rxntcy",
        "-r",
        "/project/3010000.01/data",
    ])
    .expect("parse");

    let Action::Apply {
        project_root,
        aces,
        path,
        options,
        submitter,
        ..
    } = parsed.action
    else {
        panic!("expected apply");
    };
    assert_eq!(submitter, None);
    assert_eq!(project_root, PathBuf::from("/project/3010000.01"));
    assert_eq!(aces.len(), 2);
    assert_eq!(path, PathBuf::from("/project/3010000.01/data"));
    assert!(options.recursive && !options.batch);
}

#[test]
fn apply_carries_the_submitting_user() {
    let parsed = parse_args([
        "prjacl",
        "apply",
        "--project-root",
        "/project/3010000.01",
        "--aces",
        "A:fd:OWNER@:rwaDdxnNtTcCoy",
        "--audit-uid",
        "alice",
        "--audit-ip",
        "10.0.0.7",
        "/project/3010000.01",
    ])
    .expect("parse");

    let Action::Apply { submitter, .. } = parsed.action else {
        panic!("expected apply");
    };
    assert_eq!(submitter, Some(Submitter::new("alice", "10.0.0.7")));
}

#[test]
fn apply_needs_both_audit_values() {
    assert!(
        parse_args([
            "prjacl",
            "apply",
            "--project-root",
            "/project/3010000.01",
            "--aces",
            "A:fd:OWNER@:rwaDdxnNtTcCoy",
            "--audit-uid",
            "alice",
            "/project/3010000.01",
        ])
        .is_err()
    );
}

#[test]
fn unlock_defaults_to_one_day() {
    let parsed = parse_args(["prjacl", "unlock", "3010000.01"]).expect("parse");
    let Action::Unlock { max_age, force, .. } = parsed.action else {
        panic!("expected unlock");
    };
    assert_eq!(max_age, Duration::from_secs(86_400));
    assert!(!force);
}

#[test]
fn invalid_arguments_are_usage_errors() {
    assert!(parse_args(["prjacl", "set", "--backend", "lustre", "p"]).is_err());
    assert!(parse_args(["prjacl", "-l", "7", "get", "p"]).is_err());
    assert!(parse_args(["prjacl", "get"]).is_err());

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(["prjacl", "frobnicate"], &mut stdout, &mut stderr);
    assert_eq!(code, 1);
    assert!(!stderr.is_empty());
}

#[test]
fn help_goes_to_stdout() {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = run(["prjacl", "--help"], &mut stdout, &mut stderr);
    assert_eq!(code, 0);
    let help = String::from_utf8(stdout).expect("utf8");
    assert!(help.contains("set"));
    assert!(!help.contains("apply"));
    assert!(stderr.is_empty());
}

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use acl::{Ace, BackendKind, Principal, codec, parse_principal_list};
use clap::ArgMatches;
use engine::{ApplyOptions, DelUsersOptions, RoleRequest, SetRolesOptions};
use platform::Submitter;

use super::command_builder::clap_command;

/// Which projects an operation addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Target {
    pub(crate) projects: Vec<String>,
    pub(crate) path: Option<PathBuf>,
    pub(crate) basedir: Option<PathBuf>,
    pub(crate) backend: Option<BackendKind>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Get {
        target: Target,
        recursive: bool,
    },
    Set {
        target: Target,
        request: RoleRequest,
        options: SetRolesOptions,
    },
    Del {
        target: Target,
        users: Vec<Principal>,
        options: DelUsersOptions,
    },
    Apply {
        project_root: PathBuf,
        aces: Vec<Ace>,
        path: PathBuf,
        backend: Option<BackendKind>,
        options: ApplyOptions,
        /// Who submitted the batch job, when run on its behalf.
        submitter: Option<Submitter>,
    },
    Unlock {
        projects: Vec<String>,
        basedir: Option<PathBuf>,
        max_age: Duration,
        force: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ParsedArgs {
    pub(crate) loglevel: u8,
    pub(crate) config: Option<PathBuf>,
    pub(crate) action: Action,
}

pub(crate) fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from("prjacl"));
    }

    let mut matches = clap_command().try_get_matches_from(args)?;
    let loglevel = matches.get_one::<u8>("loglevel").copied().unwrap_or(0);
    let config = matches.remove_one::<PathBuf>("config");

    let action = match matches.remove_subcommand() {
        Some((name, mut sub)) => match name.as_str() {
            "get" => Action::Get {
                recursive: sub.get_flag("recursive"),
                target: target(&mut sub),
            },
            "set" => Action::Set {
                request: RoleRequest::new(
                    principals(&mut sub, "admin"),
                    principals(&mut sub, "contributor"),
                    principals(&mut sub, "user"),
                ),
                options: SetRolesOptions {
                    recursive: sub.get_flag("recursive"),
                    force: sub.get_flag("force"),
                    traverse: sub.get_flag("traverse"),
                    follow_symlinks: sub.get_flag("follow-symlinks"),
                    batch: sub.get_flag("batch"),
                },
                target: target(&mut sub),
            },
            "del" => Action::Del {
                users: principals(&mut sub, "users"),
                options: DelUsersOptions {
                    recursive: sub.get_flag("recursive"),
                    force: sub.get_flag("force"),
                    follow_symlinks: sub.get_flag("follow-symlinks"),
                    batch: sub.get_flag("batch"),
                },
                target: target(&mut sub),
            },
            "apply" => Action::Apply {
                project_root: sub.remove_one::<PathBuf>("project-root").unwrap_or_default(),
                aces: sub
                    .remove_one::<String>("aces")
                    .map(|list| codec::parse_joined(&list))
                    .unwrap_or_default(),
                path: sub.remove_one::<PathBuf>("target").unwrap_or_default(),
                backend: sub.remove_one::<BackendKind>("backend"),
                options: ApplyOptions::new()
                    .recursive(sub.get_flag("recursive"))
                    .follow_symlinks(sub.get_flag("follow-symlinks")),
                submitter: sub
                    .remove_one::<String>("audit-uid")
                    .zip(sub.remove_one::<String>("audit-ip"))
                    .map(|(uid, ip)| Submitter::new(uid, ip)),
            },
            "unlock" => Action::Unlock {
                max_age: Duration::from_secs(sub.get_one::<u64>("max-age").copied().unwrap_or(0)),
                force: sub.get_flag("force"),
                basedir: sub.remove_one::<PathBuf>("basedir"),
                projects: project_ids(&mut sub),
            },
            other => {
                return Err(clap_command().error(
                    clap::error::ErrorKind::InvalidSubcommand,
                    format!("unrecognised command '{other}'"),
                ));
            }
        },
        None => {
            return Err(clap_command().error(
                clap::error::ErrorKind::MissingSubcommand,
                "a command is required",
            ));
        }
    };

    Ok(ParsedArgs {
        loglevel,
        config,
        action,
    })
}

fn project_ids(matches: &mut ArgMatches) -> Vec<String> {
    matches
        .remove_many::<String>("projects")
        .map(Iterator::collect)
        .unwrap_or_default()
}

fn target(matches: &mut ArgMatches) -> Target {
    Target {
        projects: project_ids(matches),
        path: matches.remove_one::<PathBuf>("path"),
        basedir: matches.remove_one::<PathBuf>("basedir"),
        backend: matches.remove_one::<BackendKind>("backend"),
    }
}

/// Principals from every occurrence of a comma-list option, without repeats.
fn principals(matches: &mut ArgMatches, id: &str) -> Vec<Principal> {
    let lists: Vec<String> = matches
        .remove_many::<String>(id)
        .map(Iterator::collect)
        .unwrap_or_default();
    parse_principal_list(&lists.join(","))
}

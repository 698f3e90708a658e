use std::path::PathBuf;

use acl::BackendKind;
use clap::{Arg, ArgAction, Command, value_parser};

fn backend_kind(value: &str) -> Result<BackendKind, acl::UnknownBackendError> {
    value.parse()
}

fn project_ids() -> Arg {
    Arg::new("projects")
        .value_name("PRJ_ID")
        .help("Project identifiers.")
        .required(true)
        .num_args(1..)
        .action(ArgAction::Append)
}

fn basedir() -> Arg {
    Arg::new("basedir")
        .long("basedir")
        .short('d')
        .value_name("DIR")
        .help("Directory holding the project roots (default from configuration).")
        .value_parser(value_parser!(PathBuf))
}

fn subpath() -> Arg {
    Arg::new("path")
        .long("path")
        .short('p')
        .value_name("PATH")
        .help("Path below the project root (default: the root itself).")
        .value_parser(value_parser!(PathBuf))
}

fn backend() -> Arg {
    Arg::new("backend")
        .long("backend")
        .value_name("KIND")
        .help("Filer family (netapp, freenas) instead of detecting it from the mounts.")
        .value_parser(backend_kind)
}

fn flag(id: &'static str, long: &'static str, short: Option<char>, help: &'static str) -> Arg {
    let arg = Arg::new(id).long(long).help(help).action(ArgAction::SetTrue);
    match short {
        Some(short) => arg.short(short),
        None => arg,
    }
}

fn recursive() -> Arg {
    flag("recursive", "recursive", Some('r'), "Descend into the directory tree.")
}

fn force() -> Arg {
    flag("force", "force", Some('f'), "Rewrite entries even when nothing seems to change.")
}

fn batch() -> Arg {
    flag("batch", "batch", Some('b'), "Submit a batch job instead of applying in-process.")
}

fn follow_symlinks() -> Arg {
    flag("follow-symlinks", "follow-symlinks", Some('L'), "Follow symbolic links while descending.")
}

fn role_list(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .value_name("LIST")
        .help(help)
        .action(ArgAction::Append)
}

pub(crate) fn clap_command() -> Command {
    Command::new("prjacl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Role-based ACL management for project storage.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("loglevel")
                .long("loglevel")
                .short('l')
                .value_name("LEVEL")
                .help("Verbosity: 0 warning, 1 error, 2 info, 3 debug.")
                .value_parser(value_parser!(u8).range(0..=3))
                .default_value("0")
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Configuration file (default $PRJACL_CONFIG or /etc/prjacl/config.ini).")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("get")
                .about("Print the roles on project directories.")
                .arg(subpath())
                .arg(recursive())
                .arg(basedir())
                .arg(backend())
                .arg(project_ids()),
        )
        .subcommand(
            Command::new("set")
                .about("Grant roles on project directories.")
                .arg(role_list("admin", "Comma list of principals to make admin; g: marks groups."))
                .arg(role_list("contributor", "Comma list of principals to make contributor."))
                .arg(role_list("user", "Comma list of principals to make user."))
                .arg(subpath())
                .arg(recursive())
                .arg(force())
                .arg(flag("traverse", "traverse", Some('t'), "Grant traverse on the parent directories."))
                .arg(batch())
                .arg(follow_symlinks())
                .arg(basedir())
                .arg(backend())
                .arg(project_ids()),
        )
        .subcommand(
            Command::new("del")
                .about("Remove principals from project ACLs.")
                .arg(
                    Arg::new("users")
                        .value_name("ULIST")
                        .help("Comma list of principals to remove; g: marks groups.")
                        .required(true),
                )
                .arg(subpath())
                .arg(recursive())
                .arg(force())
                .arg(batch())
                .arg(follow_symlinks())
                .arg(basedir())
                .arg(backend())
                .arg(project_ids()),
        )
        .subcommand(
            Command::new("apply")
                .about("Write a finished ACE list; run by batch jobs.")
                .hide(true)
                .arg(
                    Arg::new("project-root")
                        .long("project-root")
                        .value_name("DIR")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(Arg::new("aces").long("aces").value_name("LIST").required(true))
                .arg(recursive())
                .arg(follow_symlinks())
                .arg(backend())
                .arg(
                    Arg::new("audit-uid")
                        .long("audit-uid")
                        .value_name("USER")
                        .requires("audit-ip"),
                )
                .arg(
                    Arg::new("audit-ip")
                        .long("audit-ip")
                        .value_name("ADDR")
                        .requires("audit-uid"),
                )
                .arg(
                    Arg::new("target")
                        .value_name("PATH")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("unlock")
                .about("Show and clear stale project locks.")
                .arg(
                    Arg::new("max-age")
                        .long("max-age")
                        .value_name("SECS")
                        .help("Only remove locks older than this many seconds.")
                        .value_parser(value_parser!(u64))
                        .default_value("86400"),
                )
                .arg(flag("force", "force", Some('f'), "Remove the lock whatever its age."))
                .arg(basedir())
                .arg(project_ids()),
        )
}

mod arguments;
mod command_builder;
mod execution;

#[cfg(test)]
mod tests;

use std::ffi::OsString;
use std::io::Write;

use engine::{ExitCode, HasExitCode};
use logging::{LoggingConfig, init_tracing};

use crate::config::Config;
use arguments::parse_args;
use execution::{Session, system_services};

/// Parses `arguments`, runs the requested command and returns the exit code.
///
/// Diagnostics go to `stderr`; role listings, lock reports and batch job ids
/// go to `stdout`.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    let parsed = match parse_args(arguments) {
        Ok(parsed) => parsed,
        Err(error) => {
            let rendered = error.render().to_string();
            if error.use_stderr() {
                let _ = write!(stderr, "{rendered}");
                return ExitCode::Syntax.as_i32();
            }
            let _ = write!(stdout, "{rendered}");
            return ExitCode::Ok.as_i32();
        }
    };

    let logging = LoggingConfig::from_level(parsed.loglevel).with_env();
    init_tracing(&logging);

    let config = match Config::load(parsed.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            let _ = writeln!(stderr, "prjacl: {error}");
            return error.exit_code().as_i32();
        }
    };

    let services = system_services(&config, logging.verbosity);
    Session::new(&config, services, stdout, stderr)
        .run(parsed.action)
        .as_i32()
}

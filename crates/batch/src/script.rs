//! crates/batch/src/script.rs
//!
//! Job script generation for deferred ACL changes.
//!
//! The script carries the scheduler resource directives followed by a single
//! invocation of the ACL tool's `apply` entry point, so a job takes and
//! releases the project lock through the same routine as an interactive run.

use std::fmt::Write as _;

/// Default scheduler queue.
pub const DEFAULT_QUEUE: &str = "batch";

/// Default wall-clock limit.
pub const DEFAULT_WALLTIME: &str = "06:00:00";

/// Default memory request.
pub const DEFAULT_MEMORY: &str = "2gb";

/// A job to be rendered into a scheduler script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    name: String,
    queue: String,
    walltime: String,
    memory: String,
    command: Vec<String>,
}

impl JobSpec {
    /// Creates a job running `command` with default resources.
    pub fn new<I, S>(name: impl Into<String>, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            queue: DEFAULT_QUEUE.to_owned(),
            walltime: DEFAULT_WALLTIME.to_owned(),
            memory: DEFAULT_MEMORY.to_owned(),
            command: command.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the target queue.
    #[must_use]
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    /// Sets the wall-clock limit and memory request.
    #[must_use]
    pub fn with_resources(mut self, walltime: impl Into<String>, memory: impl Into<String>) -> Self {
        self.walltime = walltime.into();
        self.memory = memory.into();
        self
    }

    /// Job name shown by the scheduler.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command line the job runs.
    #[must_use]
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Renders the PBS job script.
    #[must_use]
    pub fn render(&self) -> String {
        let mut script = String::new();
        let _ = writeln!(script, "#!/bin/sh");
        let _ = writeln!(script, "#PBS -N {}", self.name);
        let _ = writeln!(
            script,
            "#PBS -l walltime={},mem={}",
            self.walltime, self.memory
        );
        let _ = writeln!(script, "#PBS -q {}", self.queue);
        let _ = writeln!(script, "#PBS -m ae");
        let _ = writeln!(script, "#");
        let line = self
            .command
            .iter()
            .map(|arg| shell_quote(arg))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(script, "exec {line}");
        script
    }
}

/// Quote a string for safe shell usage.
pub fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s.chars().all(|c| {
            c.is_alphanumeric()
                || c == '-'
                || c == '_'
                || c == '/'
                || c == '.'
                || c == ':'
                || c == '='
                || c == '@'
                || c == '+'
        })
    {
        return s.to_owned();
    }

    let mut result = String::from("'");
    for ch in s.chars() {
        if ch == '\'' {
            result.push_str("'\\''");
        } else {
            result.push(ch);
        }
    }
    result.push('\'');
    result
}

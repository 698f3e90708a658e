//! Configuration file parsing.
//!
//! The file is ini-style: `[SECTION]` headers followed by `KEY = value`
//! lines. Blank lines and lines starting with `#` or `;` are ignored.
//!
//! ```ini
//! [PPS]
//! PROJECT_BASEDIR = /project
//! PRJ_SUBDIR_ENABLED = 3010000.01, 3055000.01
//!
//! [ACL]
//! DOMAIN = dccn.nl
//! COMMAND_TIMEOUT = 3600
//!
//! [BATCH]
//! QUEUE = batch
//!
//! [BACKENDS]
//! atreides = netapp
//! freenas = freenas
//! ```
//!
//! Every setting has a default, so a missing default file is not an error.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use acl::BackendKind;
use acl::profile::{DEFAULT_DOMAIN, DEFAULT_GETFACL, DEFAULT_SETFACL};
use batch::{DEFAULT_MEMORY, DEFAULT_QUEUE, DEFAULT_SUBMIT_PROGRAM, DEFAULT_SUBMIT_TIMEOUT, DEFAULT_WALLTIME};
use engine::exit_code::{ExitCode, HasExitCode};
use engine::services::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_LISTING_TIMEOUT, DEFAULT_MIN_FREE_BLOCKS};
use engine::BackendRules;
use thiserror::Error;
use tracing::{debug, warn};

/// Location of the system-wide configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/prjacl/config.ini";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_ENV: &str = "PRJACL_CONFIG";

/// Default directory holding the project roots.
pub const DEFAULT_PROJECT_BASEDIR: &str = "/project";

/// Errors raised while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        /// Configuration file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The file is malformed.
    #[error("{}: line {line}: {message}", .path.display())]
    Parse {
        /// Configuration file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What is wrong.
        message: String,
    },
}

impl ConfigError {
    fn parse(path: &Path, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    /// Line number of a parse error.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } => Some(*line),
            Self::Io { .. } => None,
        }
    }
}

impl HasExitCode for ConfigError {
    fn exit_code(&self) -> ExitCode {
        ExitCode::Config
    }
}

/// `[BATCH]` settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Scheduler queue.
    pub queue: String,
    /// Job wall time, `HH:MM:SS`.
    pub walltime: String,
    /// Job memory.
    pub memory: String,
    /// Submission program.
    pub submit: String,
    /// Bound on one submission.
    pub submit_timeout: Duration,
    /// Binary invoked by jobs; the running executable when unset.
    pub program: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            queue: DEFAULT_QUEUE.to_owned(),
            walltime: DEFAULT_WALLTIME.to_owned(),
            memory: DEFAULT_MEMORY.to_owned(),
            submit: DEFAULT_SUBMIT_PROGRAM.to_owned(),
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            program: None,
        }
    }
}

/// Complete prjacl configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the project roots.
    pub project_basedir: PathBuf,
    /// Projects allowed to take sub-directory ACLs.
    pub subdir_enabled: Vec<String>,
    /// Domain suffix of new principals.
    pub domain: String,
    /// ACL listing program.
    pub getfacl: String,
    /// ACL setting program.
    pub setfacl: String,
    /// Bound on one ACL setting run.
    pub command_timeout: Duration,
    /// Bound on one ACL listing.
    pub listing_timeout: Duration,
    /// Free 1 KiB blocks required before mutating.
    pub min_free_blocks: u64,
    /// Batch job settings.
    pub batch: BatchConfig,
    /// Server prefix to filer family rules.
    pub backends: BackendRules,
    /// File the settings were read from, if any.
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_basedir: PathBuf::from(DEFAULT_PROJECT_BASEDIR),
            subdir_enabled: Vec::new(),
            domain: DEFAULT_DOMAIN.to_owned(),
            getfacl: DEFAULT_GETFACL.to_owned(),
            setfacl: DEFAULT_SETFACL.to_owned(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            listing_timeout: DEFAULT_LISTING_TIMEOUT,
            min_free_blocks: DEFAULT_MIN_FREE_BLOCKS,
            batch: BatchConfig::default(),
            backends: BackendRules::default(),
            source: None,
        }
    }
}

impl Config {
    /// Loads the configuration for one run.
    ///
    /// An explicit path, or one named by [`CONFIG_ENV`], must exist. The
    /// default path is used when present; defaults apply otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
            return Self::from_file(Path::new(&path));
        }
        let default = Path::new(DEFAULT_CONFIG_PATH);
        if default.is_file() {
            Self::from_file(default)
        } else {
            debug!(target: "prjacl::acl", "no configuration at {DEFAULT_CONFIG_PATH}, using defaults");
            Ok(Self::default())
        }
    }

    /// Reads and parses `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&text, path)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parses configuration text; `path` is only used in errors.
    pub fn parse(input: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut section: Option<String> = None;
        let mut backend_rules: Option<Vec<(String, BackendKind)>> = None;

        for (index, line) in input.lines().enumerate() {
            let number = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or_else(|| ConfigError::parse(path, number, "unterminated section header"))?
                    .trim();
                if name.is_empty() {
                    return Err(ConfigError::parse(path, number, "section name must be non-empty"));
                }
                section = Some(name.to_ascii_uppercase());
                continue;
            }

            let (key, value) = trimmed
                .split_once('=')
                .ok_or_else(|| ConfigError::parse(path, number, "expected 'key = value' format"))?;
            let key = key.trim();
            let value = value.trim();
            let Some(section) = section.as_deref() else {
                return Err(ConfigError::parse(path, number, "setting outside of a section"));
            };

            match section {
                "BACKENDS" => {
                    let kind: BackendKind = value
                        .parse()
                        .map_err(|err| ConfigError::parse(path, number, format!("{err}")))?;
                    backend_rules
                        .get_or_insert_with(Vec::new)
                        .push((key.to_owned(), kind));
                }
                "PPS" | "ACL" | "BATCH" => {
                    config.apply(section, &key.to_ascii_uppercase(), value, path, number)?;
                }
                other => {
                    warn!(target: "prjacl::acl", "{}: line {number}: ignoring setting in unknown section [{other}]", path.display());
                }
            }
        }

        if let Some(rules) = backend_rules {
            config.backends = BackendRules::new(rules);
        }
        Ok(config)
    }

    fn apply(
        &mut self,
        section: &str,
        key: &str,
        value: &str,
        path: &Path,
        line: usize,
    ) -> Result<(), ConfigError> {
        match (section, key) {
            ("PPS", "PROJECT_BASEDIR") => self.project_basedir = PathBuf::from(value),
            ("PPS", "PRJ_SUBDIR_ENABLED") => {
                self.subdir_enabled = value
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_owned)
                    .collect();
            }
            ("ACL", "DOMAIN") => self.domain = value.to_owned(),
            ("ACL", "GETFACL") => self.getfacl = non_empty(value, path, line)?,
            ("ACL", "SETFACL") => self.setfacl = non_empty(value, path, line)?,
            ("ACL", "COMMAND_TIMEOUT") => self.command_timeout = seconds(value, path, line)?,
            ("ACL", "LISTING_TIMEOUT") => self.listing_timeout = seconds(value, path, line)?,
            ("ACL", "MIN_FREE_BLOCKS") => self.min_free_blocks = number(value, path, line)?,
            ("BATCH", "QUEUE") => self.batch.queue = non_empty(value, path, line)?,
            ("BATCH", "WALLTIME") => self.batch.walltime = non_empty(value, path, line)?,
            ("BATCH", "MEMORY") => self.batch.memory = non_empty(value, path, line)?,
            ("BATCH", "SUBMIT") => self.batch.submit = non_empty(value, path, line)?,
            ("BATCH", "SUBMIT_TIMEOUT") => self.batch.submit_timeout = seconds(value, path, line)?,
            ("BATCH", "PROGRAM") => {
                self.batch.program = Some(PathBuf::from(non_empty(value, path, line)?));
            }
            _ => {
                warn!(target: "prjacl::acl", "{}: line {line}: unknown setting {key} in [{section}]", path.display());
            }
        }
        Ok(())
    }

    /// Reports whether `project` may take ACLs on sub-directories.
    #[must_use]
    pub fn subdir_allowed(&self, project: &str) -> bool {
        self.subdir_enabled.iter().any(|id| id == project)
    }
}

fn non_empty(value: &str, path: &Path, line: usize) -> Result<String, ConfigError> {
    if value.is_empty() {
        Err(ConfigError::parse(path, line, "value must be non-empty"))
    } else {
        Ok(value.to_owned())
    }
}

fn number(value: &str, path: &Path, line: usize) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::parse(path, line, format!("'{value}' is not a non-negative integer")))
}

fn seconds(value: &str, path: &Path, line: usize) -> Result<Duration, ConfigError> {
    match number(value, path, line)? {
        0 => Err(ConfigError::parse(path, line, "timeout must be positive")),
        secs => Ok(Duration::from_secs(secs)),
    }
}

//! crates/logging/src/verbosity.rs
//! Numeric log levels accepted on the command line.

use std::fmt;
use std::str::FromStr;

use tracing::level_filters::LevelFilter;

/// Log level selected with `-l/--loglevel`.
///
/// The numbering is historical: `0` is the quiet default showing warnings and
/// errors, `1` shows errors only, `2` adds progress information and `3`
/// everything down to debug output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Verbosity {
    /// Warnings and errors (`0`).
    #[default]
    Warning,
    /// Errors only (`1`).
    Error,
    /// Informational messages (`2`).
    Info,
    /// Debug output (`3`).
    Debug,
}

impl Verbosity {
    /// Maps a numeric level; values above 3 saturate at [`Verbosity::Debug`].
    #[must_use]
    pub const fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Warning,
            1 => Self::Error,
            2 => Self::Info,
            _ => Self::Debug,
        }
    }

    /// The numeric level this verbosity was selected with.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Warning => 0,
            Self::Error => 1,
            Self::Info => 2,
            Self::Debug => 3,
        }
    }

    /// Most verbose tracing level that is emitted.
    #[must_use]
    pub const fn level_filter(self) -> LevelFilter {
        match self {
            Self::Warning => LevelFilter::WARN,
            Self::Error => LevelFilter::ERROR,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
        }
    }

    /// `EnvFilter` directive equivalent to this verbosity.
    #[must_use]
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Warning => "warn",
            Self::Error => "error",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directive())
    }
}

/// Error for a log level that is not a small integer.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid log level '{0}' (expected 0-3)")]
pub struct ParseVerbosityError(String);

impl FromStr for Verbosity {
    type Err = ParseVerbosityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map(Self::from_level)
            .map_err(|_| ParseVerbosityError(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_warning() {
        assert_eq!(Verbosity::default(), Verbosity::Warning);
        assert_eq!(Verbosity::default().level_filter(), LevelFilter::WARN);
    }

    #[test]
    fn error_level_is_quieter_than_default() {
        assert!(Verbosity::Error.level_filter() < Verbosity::Warning.level_filter());
    }

    #[test]
    fn parse_rejects_words() {
        assert!("debug".parse::<Verbosity>().is_err());
        assert_eq!(" 2 ".parse::<Verbosity>(), Ok(Verbosity::Info));
    }

    #[test]
    fn parse_error_names_the_value() {
        let err = "loud".parse::<Verbosity>().unwrap_err();
        assert_eq!(err.to_string(), "invalid log level 'loud' (expected 0-3)");
        let _: &dyn std::error::Error = &err;
    }
}

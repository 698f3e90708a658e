//! crates/logging/src/config.rs
//! Filter configuration combining the CLI level with environment overrides.

use tracing_subscriber::EnvFilter;

use super::verbosity::Verbosity;

/// Environment variable whose value, when set, replaces the level directive.
pub const LOG_ENV: &str = "PRJACL_LOG";

/// How diagnostics are filtered before they reach stderr.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level chosen on the command line.
    pub verbosity: Verbosity,
    /// Raw `EnvFilter` directive, typically taken from [`LOG_ENV`].
    pub env_directive: Option<String>,
}

impl LoggingConfig {
    /// Config for a numeric `-l` level without overrides.
    #[must_use]
    pub fn from_level(level: u8) -> Self {
        Self {
            verbosity: Verbosity::from_level(level),
            ..Self::default()
        }
    }

    /// Picks up [`LOG_ENV`] from the process environment.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        self.env_directive = std::env::var(LOG_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        self
    }

    /// The directive string handed to [`EnvFilter`].
    ///
    /// An environment directive replaces the level-derived one entirely.
    #[must_use]
    pub fn directive(&self) -> String {
        self.env_directive
            .clone()
            .unwrap_or_else(|| self.verbosity.directive().to_owned())
    }

    /// Builds the filter, falling back to the plain level when the directive
    /// does not parse.
    #[must_use]
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_new(self.directive()).unwrap_or_else(|_| {
            EnvFilter::default().add_directive(self.verbosity.level_filter().into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_from_level() {
        assert_eq!(LoggingConfig::from_level(3).directive(), "debug");
        assert_eq!(LoggingConfig::from_level(1).directive(), "error");
    }

    #[test]
    fn env_directive_replaces_level() {
        let config = LoggingConfig {
            env_directive: Some("prjacl=trace".to_owned()),
            ..LoggingConfig::from_level(0)
        };
        assert_eq!(config.directive(), "prjacl=trace");
    }

    #[test]
    fn unparsable_env_directive_keeps_the_level() {
        let config = LoggingConfig {
            env_directive: Some("prjacl=loud".to_owned()),
            ..LoggingConfig::from_level(1)
        };
        assert_eq!(
            config.filter().max_level_hint(),
            Some(tracing::level_filters::LevelFilter::ERROR)
        );
    }
}

//! Integration tests for log level mapping.
//!
//! The `-l` numbering is not monotonic in verbosity: level 1 is quieter than
//! the default level 0. These tests pin that mapping down.

use logging::{LoggingConfig, Verbosity};
use tracing::level_filters::LevelFilter;

// ============================================================================
// Numeric levels
// ============================================================================

#[test]
fn level_0_shows_warnings() {
    let verbosity = Verbosity::from_level(0);
    assert_eq!(verbosity, Verbosity::Warning);
    assert_eq!(verbosity.level_filter(), LevelFilter::WARN);
}

#[test]
fn level_1_shows_errors_only() {
    let verbosity = Verbosity::from_level(1);
    assert_eq!(verbosity, Verbosity::Error);
    assert_eq!(verbosity.level_filter(), LevelFilter::ERROR);
}

#[test]
fn level_2_and_3_increase_verbosity() {
    assert_eq!(Verbosity::from_level(2).level_filter(), LevelFilter::INFO);
    assert_eq!(Verbosity::from_level(3).level_filter(), LevelFilter::DEBUG);
}

#[test]
fn levels_above_3_saturate() {
    assert_eq!(Verbosity::from_level(9), Verbosity::Debug);
}

#[test]
fn levels_round_trip() {
    for level in 0..=3 {
        assert_eq!(Verbosity::from_level(level).level(), level);
    }
}

// ============================================================================
// Filter directives
// ============================================================================

#[test]
fn config_directive_follows_level() {
    for (level, expected) in [(0, "warn"), (1, "error"), (2, "info"), (3, "debug")] {
        assert_eq!(LoggingConfig::from_level(level).directive(), expected);
    }
}

#[test]
fn invalid_env_directive_falls_back_to_level() {
    let config = LoggingConfig {
        env_directive: Some("prjacl=loud".to_owned()),
        ..LoggingConfig::from_level(2)
    };
    assert_eq!(config.filter().max_level_hint(), Some(LevelFilter::INFO));
}

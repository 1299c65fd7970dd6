// tests/cli.rs

use clap::Parser;
use tsc_util::cli::{CliArgs, LogLevel};
use tracing::level_filters::LevelFilter;
use tsc_util::logging::{build_filter, parse_level_str};

#[test]
fn test_defaults() {
    let args = CliArgs::try_parse_from(["tsc-util"]).unwrap();
    assert!(!args.watch);
    assert_eq!(args.project, "tsconfig.json");
    assert_eq!(args.log_level, None);
    assert_eq!(args.idle_exit, None);
}

#[test]
fn test_watch_and_log_level_flags() {
    let args = CliArgs::try_parse_from(["tsc-util", "-w", "--logLevel", "debug"]).unwrap();
    assert!(args.watch);
    assert_eq!(args.log_level, Some(LogLevel::Debug));

    let args = CliArgs::try_parse_from(["tsc-util", "-l", "warn", "-p", "jsconfig.json"]).unwrap();
    assert_eq!(args.log_level, Some(LogLevel::Warn));
    assert_eq!(args.project, "jsconfig.json");

    assert!(CliArgs::try_parse_from(["tsc-util", "--logLevel", "loud"]).is_err());
}

#[test]
fn test_log_level_env_values() {
    assert_eq!(parse_level_str("WARNING"), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str(" trace "), Some(tracing::Level::TRACE));
    assert_eq!(parse_level_str("verbose"), None);
}

#[test]
fn test_log_filter_priority() {
    let flag_wins = build_filter(Some(LogLevel::Debug), Some("error"));
    assert_eq!(flag_wins.max_level_hint(), Some(LevelFilter::DEBUG));

    let bare_level = build_filter(None, Some("Warning"));
    assert_eq!(bare_level.max_level_hint(), Some(LevelFilter::WARN));

    let directives = build_filter(None, Some("tsc_util::watch=trace,info"));
    assert_eq!(directives.max_level_hint(), Some(LevelFilter::TRACE));

    assert_eq!(build_filter(None, None).max_level_hint(), Some(LevelFilter::INFO));
}

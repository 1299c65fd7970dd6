// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `tsc-util`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tsc-util",
    version,
    about = "Compile a TypeScript project and mirror its pass-through files into outDir.",
    long_about = None
)]
pub struct CliArgs {
    /// Incrementally compile the TypeScript files.
    #[arg(short, long)]
    pub watch: bool,

    /// Specify the log level.
    ///
    /// If omitted, `TSC_UTIL_LOG` or `info` is used.
    #[arg(short = 'l', long = "logLevel", visible_alias = "log-level", value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Name of the config file, searched for from the current directory upward.
    #[arg(short, long, value_name = "NAME", default_value = "tsconfig.json")]
    pub project: String,

    /// In watch mode, exit after this many seconds without file activity.
    #[arg(long, value_name = "SECONDS")]
    pub idle_exit: Option<u64>,

    /// Path to the `tsc` binary (defaults to `node_modules/.bin/tsc`, then `tsc`).
    #[arg(long, value_name = "PATH")]
    pub tsc: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

// src/lib.rs

pub mod cli;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod finder;
pub mod fs;
pub mod glob;
pub mod logging;
pub mod passthrough;
pub mod resolver;
pub mod rewrite;
pub mod runner;
pub mod types;
pub mod vpath;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cli::CliArgs;
use crate::compiler::TscCompiler;
use crate::config::load_config;
use crate::errors::Result;
use crate::finder::FileFinder;
use crate::fs::{FileSystem, RealFileSystem};
use crate::resolver::FileSetResolver;
use crate::rewrite::RegexModuleParser;
use crate::runner::Runner;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config discovery (current directory upward)
/// - file-set resolution
/// - the `tsc` compiler process
/// - (with `--watch`) the pass-through file watcher and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let cwd = std::env::current_dir()?;
    let config = Arc::new(load_config(fs.as_ref(), &args.project, &cwd, true)?);
    info!(
        config = %config.config_file_path().display(),
        root = %config.root_path().display(),
        out = %config.out_path().display(),
        "loaded config"
    );

    let resolver = FileSetResolver::new(Arc::clone(&config), FileFinder::new(Arc::clone(&fs)));
    let compiler = Arc::new(TscCompiler::locate(config.base_path(), args.tsc.as_deref()));
    let parser = Arc::new(RegexModuleParser::new()?);
    let runner = Runner::new(resolver, compiler, fs, parser);

    if args.watch {
        runner
            .run_watch(args.idle_exit.map(Duration::from_secs))
            .await
    } else {
        runner.run_batch().await.map(|_| ())
    }
}

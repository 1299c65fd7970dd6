// src/compiler/tsc.rs

//! `tsc` run as a child process.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use super::{CompileFuture, Compiler, Diagnostic, DiagnosticParser};
use crate::config::CompilerOptions;
use crate::errors::{Result, TscUtilError};

#[cfg(windows)]
const LOCAL_TSC: &str = "node_modules/.bin/tsc.cmd";
#[cfg(not(windows))]
const LOCAL_TSC: &str = "node_modules/.bin/tsc";

#[derive(Debug, Clone)]
pub struct TscCompiler {
    program: PathBuf,
    cwd: PathBuf,
}

impl TscCompiler {
    pub fn new(program: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            cwd: cwd.into(),
        }
    }

    /// Pick the compiler binary: `override_path`, else the project's local
    /// `node_modules/.bin/tsc`, else `tsc` from `PATH`.
    pub fn locate(base: &Path, override_path: Option<&str>) -> Self {
        let program = match override_path {
            Some(path) => PathBuf::from(path),
            None => {
                let local = base.join(LOCAL_TSC);
                if local.is_file() { local } else { PathBuf::from("tsc") }
            }
        };
        debug!(program = %program.display(), "using compiler");
        Self::new(program, base)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Full argument list for one invocation.
    pub fn command_args(files: &[PathBuf], options: &CompilerOptions, watch: bool) -> Vec<String> {
        let mut args = vec!["--pretty".to_string(), "false".to_string()];
        if watch {
            args.push("--watch".to_string());
            args.push("--preserveWatchOutput".to_string());
        }
        args.extend(options_to_args(options));
        args.extend(files.iter().map(|f| f.to_string_lossy().into_owned()));
        args
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(&self.cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, err: std::io::Error) -> TscUtilError {
        TscUtilError::CompilerError(format!(
            "failed to start {}: {err}",
            self.program.display()
        ))
    }
}

/// Render compiler options as `tsc` flags.
///
/// Objects (such as `paths`) have no command-line form and are skipped.
pub fn options_to_args(options: &CompilerOptions) -> Vec<String> {
    let mut args = Vec::new();
    let mut flag = |name: &str, value: Option<String>| {
        args.push(format!("--{name}"));
        args.extend(value);
    };

    if let Some(target) = options.target {
        flag("target", Some(target.as_str().to_string()));
    }
    if let Some(jsx) = options.jsx.and_then(|j| j.as_str()) {
        flag("jsx", Some(jsx.to_string()));
    }
    if let Some(lib) = &options.lib {
        let names: Vec<&str> = lib.iter().map(|l| l.name()).collect();
        flag("lib", Some(names.join(",")));
    }
    if let Some(root) = &options.root_dir {
        flag("rootDir", Some(root.clone()));
    }
    if let Some(out) = &options.out_dir {
        flag("outDir", Some(out.clone()));
    }
    match options.allow_js {
        Some(true) => flag("allowJs", None),
        Some(false) => flag("allowJs", Some("false".to_string())),
        None => {}
    }

    for (key, value) in &options.extra {
        match value {
            Value::Bool(true) => flag(key.as_str(), None),
            Value::Bool(false) => flag(key.as_str(), Some("false".to_string())),
            Value::String(s) => flag(key.as_str(), Some(s.clone())),
            Value::Number(n) => flag(key.as_str(), Some(n.to_string())),
            Value::Array(items) if items.iter().all(Value::is_string) => {
                let joined: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                flag(key.as_str(), Some(joined.join(",")));
            }
            _ => trace!(option = %key, "option has no command-line form; skipped"),
        }
    }
    args
}

impl Compiler for TscCompiler {
    fn compile<'a>(
        &'a self,
        files: &'a [PathBuf],
        options: &'a CompilerOptions,
    ) -> CompileFuture<'a, Vec<Diagnostic>> {
        Box::pin(async move {
            let args = Self::command_args(files, options, false);
            info!(program = %self.program.display(), files = files.len(), "compiling");
            let output = self
                .command(&args)
                .output()
                .await
                .map_err(|e| self.spawn_error(e))?;

            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            let diagnostics = DiagnosticParser::new()?.parse_all(&text);
            debug!(
                exit_code = output.status.code().unwrap_or(-1),
                diagnostics = diagnostics.len(),
                "compiler exited"
            );
            Ok(diagnostics)
        })
    }

    fn watch<'a>(
        &'a self,
        files: &'a [PathBuf],
        options: &'a CompilerOptions,
        sink: mpsc::Sender<Diagnostic>,
    ) -> CompileFuture<'a, ()> {
        Box::pin(async move {
            let args = Self::command_args(files, options, true);
            info!(program = %self.program.display(), files = files.len(), "starting compiler in watch mode");
            let mut child = self.command(&args).spawn().map_err(|e| self.spawn_error(e))?;

            // Always consume stderr so buffers don't fill; log at debug.
            if let Some(stderr) = child.stderr.take() {
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        debug!("tsc stderr: {}", line);
                    }
                });
            }

            let mut parser = DiagnosticParser::new()?;
            if let Some(stdout) = child.stdout.take() {
                let mut lines = BufReader::new(stdout).lines();
                while let Some(line) = lines.next_line().await? {
                    for diag in parser.push_line(&line) {
                        if sink.send(diag).await.is_err() {
                            return Ok(());
                        }
                    }
                }
            }
            if let Some(diag) = parser.finish() {
                let _ = sink.send(diag).await;
            }

            let status = child.wait().await?;
            if status.success() {
                Ok(())
            } else {
                Err(TscUtilError::CompilerError(format!(
                    "compiler exited with code {}",
                    status.code().unwrap_or(-1)
                )))
            }
        })
    }
}

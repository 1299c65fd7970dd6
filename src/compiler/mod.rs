// src/compiler/mod.rs

//! The compiler capability and its diagnostics.
//!
//! - [`Compiler`] abstracts over the process that type-checks and emits.
//!   Production code uses [`TscCompiler`]; tests provide their own.
//! - [`DiagnosticParser`] turns `tsc --pretty false` output into
//!   [`Diagnostic`] values.
//! - [`report_diagnostic`] logs a diagnostic at the level of its category.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use regex::Regex;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::CompilerOptions;
use crate::errors::Result;

mod tsc;

pub use tsc::{TscCompiler, options_to_args};

pub type CompileFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Type-checks and emits a set of files.
pub trait Compiler: Send + Sync + fmt::Debug {
    /// Compile once and return every diagnostic.
    fn compile<'a>(
        &'a self,
        files: &'a [PathBuf],
        options: &'a CompilerOptions,
    ) -> CompileFuture<'a, Vec<Diagnostic>>;

    /// Compile incrementally until the compiler exits, streaming diagnostics
    /// (including watch status messages) into `sink`.
    fn watch<'a>(
        &'a self,
        files: &'a [PathBuf],
        options: &'a CompilerOptions,
        sink: mpsc::Sender<Diagnostic>,
    ) -> CompileFuture<'a, ()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Error,
    Warning,
    Suggestion,
    Message,
}

impl DiagnosticCategory {
    fn parse(s: &str) -> Self {
        match s {
            "error" => DiagnosticCategory::Error,
            "warning" => DiagnosticCategory::Warning,
            "suggestion" => DiagnosticCategory::Suggestion,
            _ => DiagnosticCategory::Message,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCategory::Error => "error",
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Suggestion => "suggestion",
            DiagnosticCategory::Message => "message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: Option<u32>,
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    pub fn message(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            code: None,
            file: None,
            line: None,
            column: None,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    /// `TS2304`, or `-` for status messages.
    pub fn code_label(&self) -> String {
        match self.code {
            Some(code) => format!("TS{code}"),
            None => "-".to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(
                f,
                "{}({},{}): ",
                file.display(),
                self.line.unwrap_or(0),
                self.column.unwrap_or(0)
            )?;
        }
        match self.code {
            Some(code) => write!(f, "{} TS{code}: {}", self.category.as_str(), self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Line-by-line parser for `tsc --pretty false` output.
///
/// Indented lines continue the previous diagnostic; any other text line
/// (watch status, summary) becomes a `Message`.
#[derive(Debug)]
pub struct DiagnosticParser {
    located: Regex,
    global: Regex,
    timestamp: Regex,
    current: Option<Diagnostic>,
}

impl DiagnosticParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            located: Regex::new(
                r"^(.+)\((\d+),(\d+)\): (error|warning|suggestion|message) TS(\d+): (.*)$",
            )?,
            global: Regex::new(r"^(error|warning|suggestion|message) TS(\d+): (.*)$")?,
            timestamp: Regex::new(r"^\[[^\]]+\]\s*(?:-\s*)?")?,
            current: None,
        })
    }

    /// Feed one output line; returns the diagnostics it completed.
    pub fn push_line(&mut self, line: &str) -> Vec<Diagnostic> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut done = Vec::new();

        if line.trim().is_empty() {
            done.extend(self.current.take());
            return done;
        }

        if line.starts_with(char::is_whitespace) {
            if let Some(current) = self.current.as_mut() {
                current.message.push('\n');
                current.message.push_str(line.trim());
                return done;
            }
        }

        done.extend(self.current.take());
        if let Some(caps) = self.located.captures(line) {
            self.current = Some(Diagnostic {
                category: DiagnosticCategory::parse(&caps[4]),
                code: caps[5].parse().ok(),
                file: Some(PathBuf::from(&caps[1])),
                line: caps[2].parse().ok(),
                column: caps[3].parse().ok(),
                message: caps[6].to_string(),
            });
        } else if let Some(caps) = self.global.captures(line) {
            self.current = Some(Diagnostic {
                category: DiagnosticCategory::parse(&caps[1]),
                code: caps[2].parse().ok(),
                file: None,
                line: None,
                column: None,
                message: caps[3].to_string(),
            });
        } else {
            let text = self.timestamp.replace(line.trim(), "");
            done.push(Diagnostic::message(DiagnosticCategory::Message, text));
        }
        done
    }

    /// Flush the diagnostic still being assembled.
    pub fn finish(&mut self) -> Option<Diagnostic> {
        self.current.take()
    }

    /// Parse a complete output text.
    pub fn parse_all(mut self, output: &str) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for line in output.lines() {
            out.extend(self.push_line(line));
        }
        out.extend(self.finish());
        out
    }
}

/// Log `diag` at the level matching its category.
pub fn report_diagnostic(diag: &Diagnostic) {
    let code = diag.code_label();
    let file = diag
        .file
        .as_ref()
        .map(|f| f.display().to_string())
        .unwrap_or_default();
    let line = diag.line.unwrap_or(0);
    let column = diag.column.unwrap_or(0);
    match diag.category {
        DiagnosticCategory::Error => {
            error!(code = %code, file = %file, line, column, "{}", diag.message)
        }
        DiagnosticCategory::Warning => {
            warn!(code = %code, file = %file, line, column, "{}", diag.message)
        }
        DiagnosticCategory::Suggestion | DiagnosticCategory::Message => {
            info!(code = %code, file = %file, line, column, "{}", diag.message)
        }
    }
}

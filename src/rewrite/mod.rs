// src/rewrite/mod.rs

//! Module references inside pass-through files.
//!
//! A [`ModuleParser`] finds the `import`/`export ... from`/`require` references
//! of a file and returns a [`ModuleSource`] that can drop or retarget them and
//! render the edited text.

use std::ops::Range;
use std::path::Path;

use crate::errors::Result;

mod regex_parser;

pub use regex_parser::RegexModuleParser;

/// Modules that only matter while running from source; references to them
/// are removed from copied files.
pub const SUPPORT_MODULES: [&str; 2] = ["source-map-support", "ts-node"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// `import x from '…'`
    Import,
    /// `import '…'`
    SideEffectImport,
    /// `export … from '…'`
    Export,
    /// `require('…')`
    Require,
    /// `import('…')`
    DynamicImport,
}

/// One module reference found in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub kind: RefKind,
    pub spec: String,
    /// Byte range of the spec text (inside the quotes).
    pub span: Range<usize>,
    /// Byte range of the line(s) holding the reference, newline included.
    pub line: Range<usize>,
}

impl ModuleRef {
    pub fn is_relative(&self) -> bool {
        self.spec.starts_with("./") || self.spec.starts_with("../")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    Remove,
    Retarget(String),
}

/// Parsed file text plus pending edits to its references.
#[derive(Debug, Clone)]
pub struct ModuleSource {
    text: String,
    refs: Vec<ModuleRef>,
    edits: Vec<Option<Edit>>,
}

impl ModuleSource {
    pub fn new(text: impl Into<String>, refs: Vec<ModuleRef>) -> Self {
        let edits = vec![None; refs.len()];
        Self {
            text: text.into(),
            refs,
            edits,
        }
    }

    pub fn refs(&self) -> &[ModuleRef] {
        &self.refs
    }

    /// Drop the line holding reference `index`.
    pub fn remove(&mut self, index: usize) {
        if let Some(edit) = self.edits.get_mut(index) {
            *edit = Some(Edit::Remove);
        }
    }

    /// Point reference `index` at `spec`.
    pub fn retarget(&mut self, index: usize, spec: impl Into<String>) {
        if let Some(edit) = self.edits.get_mut(index) {
            if *edit != Some(Edit::Remove) {
                *edit = Some(Edit::Retarget(spec.into()));
            }
        }
    }

    /// Render the text with all edits applied.
    pub fn to_text(&self) -> String {
        let mut edits: Vec<(Range<usize>, &str)> = self
            .refs
            .iter()
            .zip(&self.edits)
            .filter_map(|(r, edit)| match edit {
                Some(Edit::Remove) => Some((r.line.clone(), "")),
                Some(Edit::Retarget(spec)) if *spec != r.spec => Some((r.span.clone(), spec.as_str())),
                _ => None,
            })
            .collect();
        edits.sort_by(|a, b| a.0.start.cmp(&b.0.start).then(b.0.end.cmp(&a.0.end)));

        // Drop edits that fall inside an earlier removal.
        let mut applied = Vec::with_capacity(edits.len());
        let mut covered_until = 0;
        for (range, replacement) in edits {
            if range.start < covered_until {
                continue;
            }
            covered_until = range.end;
            applied.push((range, replacement));
        }

        let mut out = self.text.clone();
        for (range, replacement) in applied.into_iter().rev() {
            out.replace_range(range, replacement);
        }
        out
    }
}

/// Finds module references in file text.
pub trait ModuleParser: Send + Sync + std::fmt::Debug {
    fn parse(&self, path: &Path, text: &str) -> Result<ModuleSource>;
}

/// Parse `text`, drop support-module references and retarget relative ones
/// through `move_spec`.
pub fn rewrite_references<F>(
    parser: &dyn ModuleParser,
    path: &Path,
    text: &str,
    move_spec: F,
) -> Result<String>
where
    F: Fn(&str) -> String,
{
    let mut source = parser.parse(path, text)?;
    let plan: Vec<(usize, Option<String>)> = source
        .refs()
        .iter()
        .enumerate()
        .filter_map(|(idx, r)| {
            if SUPPORT_MODULES.iter().any(|m| r.spec.contains(m)) {
                Some((idx, None))
            } else if r.is_relative() {
                Some((idx, Some(move_spec(&r.spec))))
            } else {
                None
            }
        })
        .collect();

    for (idx, target) in plan {
        match target {
            None => source.remove(idx),
            Some(spec) => source.retarget(idx, spec),
        }
    }
    Ok(source.to_text())
}

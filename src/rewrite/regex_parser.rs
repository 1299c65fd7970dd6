// src/rewrite/regex_parser.rs

use std::ops::Range;
use std::path::Path;

use regex::{Captures, Regex};

use super::{ModuleParser, ModuleRef, ModuleSource, RefKind};
use crate::errors::Result;

const QUOTED: &str = r#"(?:'([^'\n]*)'|"([^"\n]*)")"#;

/// Line-oriented reference finder built on `regex`.
///
/// It does not understand comments or template strings; a reference written
/// inside one is still reported.
#[derive(Debug, Clone)]
pub struct RegexModuleParser {
    from_clause: Regex,
    side_effect: Regex,
    require: Regex,
    dynamic_import: Regex,
}

impl RegexModuleParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            from_clause: Regex::new(&format!(r#"\b(import|export)\b[^'";]*?\bfrom\s*{QUOTED}"#))?,
            side_effect: Regex::new(&format!(r"\bimport\s*{QUOTED}"))?,
            require: Regex::new(&format!(r"\brequire\s*\(\s*{QUOTED}\s*\)"))?,
            dynamic_import: Regex::new(&format!(r"\bimport\s*\(\s*{QUOTED}\s*\)"))?,
        })
    }
}

fn spec_group<'t>(caps: &Captures<'t>, first: usize) -> Option<regex::Match<'t>> {
    caps.get(first).or_else(|| caps.get(first + 1))
}

/// Byte range of the full lines touched by `start..end`.
fn line_range(text: &str, start: usize, end: usize) -> Range<usize> {
    let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = text[end..]
        .find('\n')
        .map(|i| end + i + 1)
        .unwrap_or(text.len());
    line_start..line_end
}

impl ModuleParser for RegexModuleParser {
    fn parse(&self, _path: &Path, text: &str) -> Result<ModuleSource> {
        let mut refs: Vec<ModuleRef> = Vec::new();
        let mut push = |kind: RefKind, stmt_start: usize, spec: regex::Match<'_>| {
            if refs.iter().any(|r| r.span.start == spec.start()) {
                return;
            }
            refs.push(ModuleRef {
                kind,
                spec: spec.as_str().to_string(),
                span: spec.range(),
                line: line_range(text, stmt_start, spec.end()),
            });
        };

        for caps in self.from_clause.captures_iter(text) {
            let kind = match caps.get(1).map(|m| m.as_str()) {
                Some("export") => RefKind::Export,
                _ => RefKind::Import,
            };
            if let (Some(whole), Some(spec)) = (caps.get(0), spec_group(&caps, 2)) {
                push(kind, whole.start(), spec);
            }
        }
        let simple = [
            (&self.dynamic_import, RefKind::DynamicImport),
            (&self.side_effect, RefKind::SideEffectImport),
            (&self.require, RefKind::Require),
        ];
        for (re, kind) in simple {
            for caps in re.captures_iter(text) {
                if let (Some(whole), Some(spec)) = (caps.get(0), spec_group(&caps, 1)) {
                    push(kind, whole.start(), spec);
                }
            }
        }

        refs.sort_by_key(|r| r.span.start);
        Ok(ModuleSource::new(text, refs))
    }
}

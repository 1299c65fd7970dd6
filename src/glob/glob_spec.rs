// src/glob/glob_spec.rs

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::errors::{Result, TscUtilError};
use crate::vpath::{extname, to_virtual};

/// Extensions the watcher copies through instead of compiling.
pub const WATCH_EXTENSIONS: [&str; 2] = [".js", ".d.ts"];

const DEFAULT_EXTENSIONS: [&str; 2] = [".ts", ".tsx"];
const JS_EXTENSIONS: [&str; 2] = [".js", ".jsx"];

/// One include/exclude pattern bound to the directory it is relative to.
///
/// The last segment decides the class:
///
/// | last segment          | class     | include glob                  |
/// |-----------------------|-----------|-------------------------------|
/// | `*` or `**`           | wildcard  | `lib/*.{ts,tsx}`              |
/// | has an extension      | file      | unchanged                     |
/// | anything else         | directory | `lib/**/*.{ts,tsx}`           |
#[derive(Debug, Clone)]
pub struct GlobSpec {
    pattern: String,
    segments: Vec<String>,
    base_path: PathBuf,
    allowed_extensions: Vec<String>,
    matcher: Regex,
}

impl GlobSpec {
    /// Parse `pattern` relative to `base_path` with the default `.ts`/`.tsx`
    /// extension set. Leading `./` segments and trailing `/` are dropped.
    pub fn new(pattern: &str, base_path: impl AsRef<Path>) -> Result<Self> {
        let absolute = pattern.starts_with('/');
        let segments: Vec<String> = pattern
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            return Err(TscUtilError::InvalidPattern(pattern.to_string()));
        }

        let joined = segments.join("/");
        let pattern = if absolute { format!("/{joined}") } else { joined };
        let matcher = Regex::new(&build_regex(&pattern, &segments, None))?;

        Ok(Self {
            pattern,
            segments,
            base_path: base_path.as_ref().to_path_buf(),
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            matcher,
        })
    }

    /// Replace the allowed extension set (each entry with its leading dot).
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Add `.js`/`.jsx` to the allowed extensions.
    pub fn with_allow_js(mut self, allow_js: bool) -> Self {
        if allow_js {
            for ext in JS_EXTENSIONS {
                if !self.allowed_extensions.iter().any(|e| e == ext) {
                    self.allowed_extensions.push(ext.to_string());
                }
            }
        }
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    fn last_segment(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_wildcard_spec(&self) -> bool {
        matches!(self.last_segment(), "*" | "**")
    }

    pub fn is_file_spec(&self) -> bool {
        !self.is_wildcard_spec() && has_extension(self.last_segment())
    }

    pub fn is_directory_spec(&self) -> bool {
        !self.is_wildcard_spec() && !has_extension(self.last_segment())
    }

    pub fn is_recursive_spec(&self) -> bool {
        self.segments.iter().any(|s| s == "**")
    }

    /// True if a segment other than `**` holds `*` or `?`.
    pub fn has_wildcard(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s != "**" && s.contains(['*', '?']))
    }

    pub fn has_extension(&self) -> bool {
        has_extension(self.last_segment())
    }

    pub fn is_absolute(&self) -> bool {
        is_absolute_pattern(&self.pattern)
    }

    /// Brace group of the allowed extensions without their dots: `{ts,tsx}`.
    pub fn ext_alternation(&self) -> String {
        let exts: Vec<&str> = self
            .allowed_extensions
            .iter()
            .map(|e| e.trim_start_matches('.'))
            .collect();
        format!("{{{}}}", exts.join(","))
    }

    /// Glob selecting the compiler inputs this pattern names.
    pub fn to_include_glob(&self, full_path: bool) -> String {
        let glob = if self.is_directory_spec() {
            format!("{}/**/*.{}", self.pattern, self.ext_alternation())
        } else if self.last_segment() == "**" {
            format!("{}/*.{}", self.pattern, self.ext_alternation())
        } else if self.is_wildcard_spec() {
            format!("{}.{}", self.pattern, self.ext_alternation())
        } else {
            self.pattern.clone()
        };
        self.prefixed(glob, full_path)
    }

    /// Glob selecting everything this pattern excludes.
    pub fn to_exclude_glob(&self, full_path: bool) -> String {
        let glob = if self.is_directory_spec() {
            format!("{}/**/*", self.pattern)
        } else {
            self.pattern.clone()
        };
        self.prefixed(glob, full_path)
    }

    /// Globs for the watcher, one per pass-through extension.
    ///
    /// The trailing `*`/`**` of a wildcard spec is dropped first; file specs
    /// are watched as they are.
    pub fn to_watch_dir_paths(&self, full_path: bool) -> Vec<String> {
        if self.is_file_spec() {
            return vec![self.prefixed(self.pattern.clone(), full_path)];
        }

        let stripped = if self.is_wildcard_spec() {
            let keep = &self.segments[..self.segments.len() - 1];
            let joined = keep.join("/");
            if self.pattern.starts_with('/') {
                format!("/{joined}")
            } else {
                joined
            }
        } else {
            self.pattern.clone()
        };

        let mut exts: Vec<&str> = self
            .allowed_extensions
            .iter()
            .map(String::as_str)
            .filter(|e| WATCH_EXTENSIONS.contains(e))
            .collect();
        if exts.is_empty() {
            exts = WATCH_EXTENSIONS.to_vec();
        }

        exts.into_iter()
            .map(|ext| {
                let glob = if stripped.is_empty() {
                    format!("**/*{ext}")
                } else {
                    format!("{stripped}/**/*{ext}")
                };
                self.prefixed(glob, full_path)
            })
            .collect()
    }

    /// Regular expression for path membership.
    ///
    /// `**` matches zero or more directory levels, `*` zero or more
    /// non-separator characters, `?` one non-separator character and `{a,b}`
    /// either alternative. With `full_path` the expression is anchored at the
    /// base path; otherwise it may start at any separator.
    pub fn to_match_regex(&self, full_path: bool) -> Result<Regex> {
        let base = full_path.then(|| virtual_base(&self.base_path));
        Ok(Regex::new(&build_regex(&self.pattern, &self.segments, base.as_deref()))?)
    }

    /// True if the forward-slash rendering of `path` satisfies the pattern.
    pub fn matches(&self, path: impl AsRef<Path>) -> bool {
        self.matcher.is_match(&to_virtual(path.as_ref()))
    }

    /// True if `path` or one of its ancestors satisfies the pattern.
    pub fn matches_within(&self, path: impl AsRef<Path>) -> bool {
        let mut candidate = to_virtual(path.as_ref());
        loop {
            if self.matcher.is_match(&candidate) {
                return true;
            }
            match candidate.rfind('/') {
                Some(0) | None => return false,
                Some(idx) => candidate.truncate(idx),
            }
        }
    }

    fn prefixed(&self, glob: String, full_path: bool) -> String {
        if !full_path || is_absolute_pattern(&glob) {
            return glob;
        }
        let base = virtual_base(&self.base_path);
        if base.is_empty() || base == "." {
            glob
        } else {
            format!("{base}/{glob}")
        }
    }
}

impl fmt::Display for GlobSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn has_extension(segment: &str) -> bool {
    extname(segment).len() > 1
}

fn is_absolute_pattern(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    pattern.starts_with('/')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

fn virtual_base(base: &Path) -> String {
    to_virtual(base).trim_end_matches('/').to_string()
}

fn build_regex(pattern: &str, segments: &[String], base: Option<&str>) -> String {
    let mut re = String::new();
    if pattern.starts_with('/') {
        re.push_str("^/");
    } else if is_absolute_pattern(pattern) {
        re.push('^');
    } else {
        match base {
            Some(base) if !base.is_empty() && base != "." => {
                re.push('^');
                re.push_str(&regex::escape(base));
                re.push('/');
            }
            _ => re.push_str("(?:^|/)"),
        }
    }

    let last = segments.len().saturating_sub(1);
    for (idx, seg) in segments.iter().enumerate() {
        if seg == "**" {
            re.push_str(if idx == last { ".*" } else { "(?:[^/]*/)*" });
            continue;
        }
        push_segment(&mut re, seg);
        if idx != last {
            re.push('/');
        }
    }
    re.push('$');
    re
}

fn push_segment(re: &mut String, segment: &str) {
    let mut in_brace = false;
    let mut buf = [0u8; 4];
    for c in segment.chars() {
        match c {
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            '{' if !in_brace => {
                in_brace = true;
                re.push_str("(?:");
            }
            ',' if in_brace => re.push('|'),
            '}' if in_brace => {
                in_brace = false;
                re.push(')');
            }
            other => re.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    if in_brace {
        re.push(')');
    }
}

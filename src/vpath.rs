// src/vpath.rs

//! Normalized path values that render the same way on every host.
//!
//! Internally a [`VirtualPath`] keeps the host separator (so it can be handed
//! to the OS unchanged); [`VirtualPath::to_virtual_path`] always renders with
//! forward slashes so the result can be embedded in glob patterns.

use std::fmt;
use std::path::{Component, MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path, PathBuf};

use crate::errors::{Result, TscUtilError};

pub const BASE_DELIM: char = '/';
pub const WINDOWS_DELIM: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualPath {
    path: String,
}

impl VirtualPath {
    /// Lexically normalize `raw`; fails with `InvalidPath` on an empty string.
    pub fn normalize(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref();
        if raw.is_empty() {
            return Err(TscUtilError::InvalidPath);
        }
        Ok(Self {
            path: normalize_str(raw),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::normalize(path.to_string_lossy())
    }

    /// Append `segments` and normalize the result (like `path.join`).
    pub fn join<I, S>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut joined = self.path.clone();
        for seg in segments {
            let seg = seg.as_ref();
            if seg.is_empty() {
                continue;
            }
            joined.push(MAIN_SEPARATOR);
            joined.push_str(seg);
        }
        Self {
            path: normalize_str(&joined),
        }
    }

    pub fn dirname(&self) -> Self {
        let (prefix, segs) = self.parts();
        let path = match segs.len() {
            0 => return self.clone(),
            1 if prefix.is_empty() => ".".to_string(),
            1 => prefix.to_string(),
            n => format!("{prefix}{}", segs[..n - 1].join(MAIN_SEPARATOR_STR)),
        };
        Self { path }
    }

    pub fn basename(&self) -> &str {
        let (_, segs) = self.parts();
        segs.last().copied().unwrap_or("")
    }

    /// Extension of the last segment including its dot (`.ts` for `a.d.ts`);
    /// empty for dot-files and names without a dot.
    pub fn extname(&self) -> &str {
        extname(self.basename())
    }

    /// Non-root segments in order.
    pub fn segments(&self) -> Vec<&str> {
        self.parts().1
    }

    pub fn is_absolute(&self) -> bool {
        let (prefix, _) = split_root(&self.path);
        prefix.ends_with(is_sep)
            || (cfg!(windows) && has_drive(&self.path))
    }

    pub fn is_relative(&self) -> bool {
        !self.is_absolute()
    }

    /// True if `prefix` is this path or one of its ancestors (segment-wise).
    pub fn starts_with(&self, prefix: &VirtualPath) -> bool {
        let (own_root, own) = self.parts();
        let (other_root, other) = prefix.parts();
        if own_root != other_root {
            return false;
        }
        other.len() <= own.len() && own.iter().zip(other.iter()).all(|(a, b)| a == b)
    }

    /// Lexical relative path from `base` to `self` (empty when equal).
    pub fn relative_to(&self, base: &VirtualPath) -> String {
        let (own_root, own) = self.parts();
        let (base_root, base_segs) = base.parts();
        if own_root != base_root {
            return self.path.clone();
        }
        let common = own
            .iter()
            .zip(base_segs.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let mut out: Vec<&str> = Vec::new();
        out.extend(std::iter::repeat_n("..", base_segs.len() - common));
        out.extend(own[common..].iter().copied());
        out.join(MAIN_SEPARATOR_STR)
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.path)
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }

    pub fn to_os_path(&self) -> String {
        self.path.clone()
    }

    pub fn to_virtual_path(&self) -> String {
        to_virtual_str(&self.path)
    }

    fn parts(&self) -> (&str, Vec<&str>) {
        let (prefix, rest) = split_root(&self.path);
        let segs = rest
            .split(is_sep)
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        (prefix, segs)
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_virtual_path())
    }
}

impl TryFrom<&str> for VirtualPath {
    type Error = TscUtilError;

    fn try_from(value: &str) -> Result<Self> {
        Self::normalize(value)
    }
}

impl TryFrom<&Path> for VirtualPath {
    type Error = TscUtilError;

    fn try_from(value: &Path) -> Result<Self> {
        Self::from_path(value)
    }
}

/// Forward-slash rendering of any host path.
pub fn to_virtual(path: &Path) -> String {
    to_virtual_str(&path.to_string_lossy())
}

/// Lexical normalization of a host path without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    if raw.is_empty() {
        return PathBuf::from(".");
    }
    PathBuf::from(normalize_str(&raw))
}

pub(crate) fn extname(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &name[idx..],
    }
}

fn to_virtual_str(path: &str) -> String {
    if MAIN_SEPARATOR == WINDOWS_DELIM {
        path.replace(WINDOWS_DELIM, "/")
    } else {
        path.to_string()
    }
}

fn is_sep(c: char) -> bool {
    c == BASE_DELIM || (MAIN_SEPARATOR == WINDOWS_DELIM && c == WINDOWS_DELIM)
}

fn has_drive(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Split off the root prefix: `/` on unix; `C:`, `C:\` or `\` on Windows.
fn split_root(path: &str) -> (&str, &str) {
    let mut end = 0;
    if MAIN_SEPARATOR == WINDOWS_DELIM && has_drive(path) {
        end = 2;
    }
    if path[end..].starts_with(is_sep) {
        end += 1;
    }
    path.split_at(end)
}

fn normalize_str(raw: &str) -> String {
    let (prefix, rest) = split_root(raw);
    let absolute = prefix.ends_with(is_sep);
    let mut out: Vec<&str> = Vec::new();
    for seg in rest.split(is_sep) {
        match seg {
            "" | "." => {}
            ".." => {
                if out.last().is_some_and(|last| *last != "..") {
                    out.pop();
                } else if !absolute {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    let prefix = if absolute {
        format!("{}{}", &prefix[..prefix.len() - 1], MAIN_SEPARATOR)
    } else {
        prefix.to_string()
    };
    let body = out.join(MAIN_SEPARATOR_STR);
    if prefix.is_empty() && body.is_empty() {
        ".".to_string()
    } else {
        format!("{prefix}{body}")
    }
}

/// Lexical relative path from directory `from` to `to` (like `path.relative`).
///
/// Both inputs are normalized first. Paths on different roots return `to`.
pub fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = normalize_path(from);
    let to = normalize_path(to);
    let from_parts: Vec<Component<'_>> = from
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let to_parts: Vec<Component<'_>> = to
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let root_len = |parts: &[Component<'_>]| {
        parts
            .iter()
            .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
            .count()
    };
    if from_parts[..root_len(&from_parts)] != to_parts[..root_len(&to_parts)] {
        return to;
    }

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut out = PathBuf::new();
    for _ in common..from_parts.len() {
        out.push("..");
    }
    for part in &to_parts[common..] {
        out.push(part.as_os_str());
    }
    out
}

// src/glob/mod.rs

//! Glob patterns from the config and the three shapes they are translated to.
//!
//! - include/exclude globs for the file finder ([`GlobSpec::to_include_glob`],
//!   [`GlobSpec::to_exclude_glob`]),
//! - directory globs for the watcher ([`GlobSpec::to_watch_dir_paths`]),
//! - a path matcher for routing and ignore tests ([`GlobSpec::matches`]).

mod glob_spec;

pub use glob_spec::{GlobSpec, WATCH_EXTENSIONS};

/// True if `segment` holds glob syntax.
pub fn is_glob_segment(segment: &str) -> bool {
    segment.contains(['*', '?', '{', '[', '}', ']'])
}

/// Leading directory part of `pattern` that contains no glob syntax.
///
/// `src/**/*.ts` gives `src`, `/abs/lib/*.js` gives `/abs/lib`, and a pattern
/// without wildcards gives the pattern itself.
pub fn literal_prefix(pattern: &str) -> String {
    let absolute = pattern.starts_with('/');
    let literal: Vec<&str> = pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .take_while(|s| !is_glob_segment(s))
        .collect();
    let joined = literal.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

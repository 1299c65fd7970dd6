// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Compilation target (`compilerOptions.target`).
///
/// Unrecognised strings map to [`ScriptTarget::Latest`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum ScriptTarget {
    Es3,
    Es5,
    Es2015,
    Es2016,
    Es2017,
    Es2018,
    EsNext,
    #[default]
    Latest,
}

impl ScriptTarget {
    /// Name accepted by `tsc --target`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptTarget::Es3 => "es3",
            ScriptTarget::Es5 => "es5",
            ScriptTarget::Es2015 => "es2015",
            ScriptTarget::Es2016 => "es2016",
            ScriptTarget::Es2017 => "es2017",
            ScriptTarget::Es2018 => "es2018",
            ScriptTarget::EsNext | ScriptTarget::Latest => "esnext",
        }
    }
}

impl FromStr for ScriptTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "es3" => ScriptTarget::Es3,
            "es5" => ScriptTarget::Es5,
            "es6" | "es2015" => ScriptTarget::Es2015,
            "es7" | "es2016" => ScriptTarget::Es2016,
            "es2017" => ScriptTarget::Es2017,
            "es2018" => ScriptTarget::Es2018,
            "esnext" => ScriptTarget::EsNext,
            _ => ScriptTarget::Latest,
        })
    }
}

impl From<String> for ScriptTarget {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(target) => target,
            Err(never) => match never {},
        }
    }
}

/// JSX emit mode (`compilerOptions.jsx`).
///
/// Unrecognised strings map to [`JsxEmit::None`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum JsxEmit {
    #[default]
    None,
    Preserve,
    React,
    ReactNative,
}

impl JsxEmit {
    /// Name accepted by `tsc --jsx`; `None` has no flag.
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            JsxEmit::None => None,
            JsxEmit::Preserve => Some("preserve"),
            JsxEmit::React => Some("react"),
            JsxEmit::ReactNative => Some("react-native"),
        }
    }
}

impl From<String> for JsxEmit {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "preserve" => JsxEmit::Preserve,
            "react" => JsxEmit::React,
            "react-native" => JsxEmit::ReactNative,
            _ => JsxEmit::None,
        }
    }
}

/// One entry of `compilerOptions.lib`, stored under its canonical name.
///
/// `es6` and `es7` are folded into `es2015` / `es2016`; the declaration file
/// that backs the entry is `lib.<name>.d.ts`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct LibName(String);

impl LibName {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("lib.{}.d.ts", self.0)
    }
}

impl From<String> for LibName {
    fn from(s: String) -> Self {
        let lower = s.trim().to_lowercase();
        let canonical = match lower.as_str() {
            "es6" => "es2015".to_string(),
            "es7" => "es2016".to_string(),
            _ => lower,
        };
        LibName(canonical)
    }
}

impl From<&str> for LibName {
    fn from(s: &str) -> Self {
        LibName::from(s.to_string())
    }
}

impl fmt::Display for LibName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

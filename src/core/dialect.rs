//! Source dialects.
//!
//! Plain `.tex` documents go straight to the renderer. `.shn` stream sources
//! are first run through `coursetex`, and their preamble lines may carry a
//! stream prefix such as `<shn>` that the inserted block has to repeat.

use std::fmt;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    static ref STREAM_PREFIX_RE: Regex = Regex::new(r"(<[a-z]+>)\\usepackage\{hyperref\}").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Plain LaTeX
    Tex,
    /// Multi-stream source for the `coursetex` preprocessor
    Stream,
}

impl Dialect {
    /// Pick the dialect from a file extension; anything but `.shn` is LaTeX.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("shn") => Dialect::Stream,
            _ => Dialect::Tex,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Dialect::Tex => "tex",
            Dialect::Stream => "shn",
        }
    }

    /// Per-line prefix for inserted preamble lines.
    pub fn line_prefix(self, source: &str) -> String {
        match self {
            Dialect::Tex => String::new(),
            Dialect::Stream => STREAM_PREFIX_RE
                .captures(source)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        }
    }

    /// Whether a file found during batch discovery should be processed.
    pub fn is_batch_candidate(self, path: &Path, source: &str) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        match self {
            Dialect::Tex => source.contains("\\documentclass"),
            Dialect::Stream => !stem.starts_with("old") && !name.contains("backup"),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Tex => write!(f, "tex"),
            Dialect::Stream => write!(f, "stream"),
        }
    }
}

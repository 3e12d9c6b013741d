//! Document title derivation for PDF and HTML metadata.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::Profile;
use crate::core::dialect::Dialect;
use crate::core::scanner::braced_group;

lazy_static! {
    static ref COMMAND_WITH_ARG_RE: Regex = Regex::new(r"\\[a-zA-Z]+\*?\{([^{}]*)\}").unwrap();
    static ref BARE_COMMAND_RE: Regex = Regex::new(r"\\([a-zA-Z]+\*?|\\)\s*").unwrap();
    static ref HEADER_COMMENT_RE: Regex = Regex::new(r"^%+\s*(.+)").unwrap();
}

/// Title for a document.
///
/// Profile title table by stem, then `\title{..}`, then (stream dialect
/// only) the first header comment, then the stem with `_` escaped.
pub fn derive_title(path: &Path, source: &str, dialect: Dialect, profile: &Profile) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    if let Some(title) = profile.titles.get(stem) {
        return title.clone();
    }
    if let Some(title) = title_command(source) {
        return title;
    }
    if dialect == Dialect::Stream {
        if let Some(comment) = header_comment(source) {
            let prefix = profile.title_prefix.as_deref().unwrap_or_default();
            return format!("{}{}", prefix, comment);
        }
    }
    stem.replace('_', "\\_")
}

/// Plain text of the first non-empty `\title{..}`, formatting removed.
pub fn title_command(source: &str) -> Option<String> {
    let mut search_from = 0usize;
    while let Some(found) = source[search_from..].find("\\title") {
        let after = search_from + found + "\\title".len();
        search_from = after;
        let rest = &source[after..];
        let trimmed = rest.trim_start();
        // `\titlefont` and friends are other commands.
        if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
            continue;
        }
        let group_start = after + (rest.len() - trimmed.len());
        let group_start = skip_optional_arg(source, group_start);
        let Some(body) = braced_group(source, group_start) else {
            continue;
        };
        let text = strip_formatting(body);
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}

/// First `%` comment line with text, `%` runs trimmed.
pub fn header_comment(source: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let caps = HEADER_COMMENT_RE.captures(line)?;
        let text = caps.get(1)?.as_str().trim_matches('%').trim();
        (!text.is_empty()).then(|| text.to_string())
    })
}

fn skip_optional_arg(source: &str, pos: usize) -> usize {
    if !source[pos..].starts_with('[') {
        return pos;
    }
    match source[pos..].find(']') {
        Some(close) => {
            let after = pos + close + 1;
            after + (source[after..].len() - source[after..].trim_start().len())
        }
        None => pos,
    }
}

fn strip_formatting(raw: &str) -> String {
    let mut text = raw.to_string();
    // Innermost `\cmd{x}` first until nothing changes.
    loop {
        let next = COMMAND_WITH_ARG_RE.replace_all(&text, "$1").into_owned();
        if next == text {
            break;
        }
        text = next;
    }
    let text = BARE_COMMAND_RE.replace_all(&text, " ");
    text.replace(['{', '}'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_title_wins() {
        let mut profile = Profile::default();
        profile
            .titles
            .insert("Cprog".to_string(), "ECE 474: Structure of C Programs".to_string());
        let title = derive_title(
            Path::new("notes/Cprog.shn"),
            "\\title{Ignored}",
            Dialect::Stream,
            &profile,
        );
        assert_eq!(title, "ECE 474: Structure of C Programs");
    }

    #[test]
    fn test_title_command_strips_nested_formatting() {
        let src = r"\title{Real-Time \textbf{Scheduling \emph{Basics}}\\ Part 1}";
        assert_eq!(title_command(src).as_deref(), Some("Real-Time Scheduling Basics Part 1"));
    }

    #[test]
    fn test_title_command_with_short_title() {
        let src = r"\title[Short]{Long \LaTeX{} Title}";
        assert_eq!(title_command(src).as_deref(), Some("Long Title"));
    }

    #[test]
    fn test_titlefont_is_not_title() {
        let src = "\\titlefont{x}\n\\title{Real}";
        assert_eq!(title_command(src).as_deref(), Some("Real"));
    }

    #[test]
    fn test_header_comment_for_stream_dialect() {
        let mut profile = Profile::default();
        profile.title_prefix = Some("ECE 474: ".to_string());
        let src = "%%%% Interrupts and Timers %%%%\n\\documentclass{beamer}\n";
        let title = derive_title(Path::new("Interrupts.shn"), src, Dialect::Stream, &profile);
        assert_eq!(title, "ECE 474: Interrupts and Timers");

        // Plain LaTeX ignores header comments.
        let title = derive_title(Path::new("Interrupts.tex"), src, Dialect::Tex, &profile);
        assert_eq!(title, "Interrupts");
    }

    #[test]
    fn test_stem_fallback_escapes_underscores() {
        let title = derive_title(
            Path::new("hw_io_notes.tex"),
            "\\documentclass{article}",
            Dialect::Tex,
            &Profile::default(),
        );
        assert_eq!(title, "hw\\_io\\_notes");
    }
}

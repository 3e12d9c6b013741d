//! Preamble patcher
//!
//! Injects the accessibility block (font encoding, language, PDF metadata
//! and a `\pdftooltip` fallback) into a LaTeX preamble exactly once.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::Profile;

/// Substrings that all appear in a patched preamble.
pub const PATCH_MARKERS: [&str; 4] = ["fontenc", "lmodern", "pdftitle", "pdfcomment"];

lazy_static! {
    // The optional `<xyz>` stream prefix is part of the declaration.
    static ref IMAGE_SUPPORT_RE: Regex =
        Regex::new(r"(?:<[a-z]+>)?\\usepackage(?:\[[^\]]*\])?\{graphicx\}").unwrap();
    static ref HYPERREF_RE: Regex =
        Regex::new(r"(?:<[a-z]+>)?\\usepackage(?:\[[^\]]*\])?\{hyperref\}").unwrap();
    static ref DOCUMENT_CLASS_RE: Regex =
        Regex::new(r"\\documentclass(?:\[[^\]]*\])?\{[^}]+\}").unwrap();
}

/// Where the accessibility block goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertionPoint {
    /// Before the `graphicx` declaration; every existing `hyperref`
    /// declaration is dropped in favour of the block's own.
    BeforeImageSupport {
        at: usize,
        superseded: Vec<Range<usize>>,
    },
    /// In place of the first `hyperref` declaration.
    ReplaceHyperref { range: Range<usize> },
    /// Right after `\documentclass{..}`.
    AfterDocumentClass { at: usize },
}

/// True when every patch marker is already present.
pub fn already_patched(source: &str) -> bool {
    PATCH_MARKERS.iter().all(|marker| source.contains(marker))
}

/// Choose the anchor, in priority order. `None` when the source has no
/// recognizable anchor at all.
pub fn find_insertion_point(source: &str) -> Option<InsertionPoint> {
    if let Some(graphicx) = IMAGE_SUPPORT_RE.find(source) {
        let superseded = HYPERREF_RE
            .find_iter(source)
            .map(|m| whole_line_range(source, m.range()))
            .collect();
        return Some(InsertionPoint::BeforeImageSupport {
            at: line_start_if_blank_before(source, graphicx.start()),
            superseded,
        });
    }
    if let Some(hyperref) = HYPERREF_RE.find(source) {
        return Some(InsertionPoint::ReplaceHyperref {
            range: hyperref.range(),
        });
    }
    DOCUMENT_CLASS_RE
        .find(source)
        .map(|m| InsertionPoint::AfterDocumentClass { at: m.end() })
}

/// Render the block, one `prefix` per line, without a trailing newline.
pub fn accessibility_block(profile: &Profile, title: &str, prefix: &str) -> String {
    let lines = [
        "\\usepackage[T1]{fontenc}".to_string(),
        "\\usepackage{lmodern}".to_string(),
        "\\usepackage[utf8]{inputenc}".to_string(),
        format!("\\usepackage[{}]{{babel}}", profile.babel_language),
        "\\usepackage[pdftex,".to_string(),
        format!("    pdftitle={{{}}},", title),
        format!("    pdfauthor={{{}}},", profile.author),
        format!("    pdflang={{{}}},", profile.pdf_lang),
        format!("    pdfsubject={{{}}},", profile.subject),
        format!("    pdfkeywords={{{}}},", profile.keywords),
        "    colorlinks=true,".to_string(),
        "    linkcolor=blue,".to_string(),
        "    urlcolor=blue,".to_string(),
        "    citecolor=blue,".to_string(),
        "    unicode]{hyperref}".to_string(),
        "\\IfFileExists{pdfcomment.sty}{\\usepackage{pdfcomment}}{\\newcommand{\\pdftooltip}[2]{#1}}"
            .to_string(),
    ];
    lines
        .iter()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Insert the accessibility block. Idempotent: an already patched source is
/// returned unchanged, and only the first matching anchor is used.
pub fn patch_preamble(source: &str, title: &str, prefix: &str, profile: &Profile) -> String {
    if already_patched(source) {
        return source.to_string();
    }
    let Some(point) = find_insertion_point(source) else {
        log::warn!("no \\documentclass or package anchor found; preamble left as is");
        return source.to_string();
    };

    let block = accessibility_block(profile, title, prefix);
    match point {
        InsertionPoint::BeforeImageSupport { at, superseded } => {
            let mut out = String::with_capacity(source.len() + block.len() + 1);
            let mut cursor = 0usize;
            let mut inserted = false;
            for range in superseded
                .iter()
                .cloned()
                .chain(std::iter::once(source.len()..source.len()))
            {
                if !inserted && at <= range.start {
                    out.push_str(&source[cursor..at]);
                    out.push_str(&block);
                    out.push('\n');
                    cursor = at;
                    inserted = true;
                }
                out.push_str(&source[cursor..range.start]);
                cursor = range.end;
            }
            out.push_str(&source[cursor..]);
            out
        }
        InsertionPoint::ReplaceHyperref { range } => {
            format!("{}{}{}", &source[..range.start], block, &source[range.end..])
        }
        InsertionPoint::AfterDocumentClass { at } => {
            format!("{}\n{}{}", &source[..at], block, &source[at..])
        }
    }
}

/// Widen a declaration's range to its whole line when nothing else shares it.
fn whole_line_range(source: &str, range: Range<usize>) -> Range<usize> {
    let line_start = source[..range.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[range.end..]
        .find('\n')
        .map_or(source.len(), |i| range.end + i);
    let alone = source[line_start..range.start].trim().is_empty()
        && source[range.end..line_end].trim().is_empty();
    if alone {
        let end = if line_end < source.len() { line_end + 1 } else { line_end };
        line_start..end
    } else {
        range
    }
}

/// Step back over indentation so the block starts on its own line.
fn line_start_if_blank_before(source: &str, pos: usize) -> usize {
    let line_start = source[..pos].rfind('\n').map_or(0, |i| i + 1);
    if source[line_start..pos].trim().is_empty() {
        line_start
    } else {
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile::default()
    }

    #[test]
    fn test_block_has_every_marker() {
        let block = accessibility_block(&profile(), "T", "");
        assert!(already_patched(&block));
        assert!(block.contains("pdftitle={T},"));
        assert!(block.contains("\\usepackage[english]{babel}"));
        assert!(!block.ends_with('\n'));
    }

    #[test]
    fn test_block_prefix_on_every_line() {
        let block = accessibility_block(&profile(), "T", "<shn>");
        assert!(block.lines().all(|line| line.starts_with("<shn>")));
    }

    #[test]
    fn test_after_document_class() {
        let src = "\\documentclass[11pt]{article}\n\\begin{document}\nHi\n\\end{document}\n";
        let out = patch_preamble(src, "My Title", "", &profile());
        assert!(out.starts_with("\\documentclass[11pt]{article}\n\\usepackage[T1]{fontenc}\n"));
        assert!(out.contains("pdftitle={My Title}"));
        assert!(out.contains("{#1}}\n\\begin{document}"));
    }

    #[test]
    fn test_replace_bare_hyperref() {
        let src = "\\documentclass{article}\n\\usepackage{amsmath}\n\\usepackage{hyperref}\n\\begin{document}\n";
        let out = patch_preamble(src, "T", "", &profile());
        assert_eq!(out.matches("{hyperref}").count(), 1);
        assert!(out.contains("\\usepackage{amsmath}\n\\usepackage[T1]{fontenc}"));
        assert!(out.contains("{#1}}\n\\begin{document}"));
    }

    #[test]
    fn test_before_graphicx_and_drop_hyperref() {
        let src = "\\documentclass{article}\n\\usepackage{hyperref}\n\\usepackage[final]{graphicx}\n\\begin{document}\n";
        let out = patch_preamble(src, "T", "", &profile());
        assert_eq!(out.matches("{hyperref}").count(), 1);
        assert!(out.contains("{#1}}\n\\usepackage[final]{graphicx}\n"));
        assert!(out.starts_with("\\documentclass{article}\n\\usepackage[T1]{fontenc}"));
    }

    #[test]
    fn test_hyperref_after_graphicx_is_dropped_too() {
        let src = "\\documentclass{article}\n\\usepackage{graphicx}\n\\usepackage[colorlinks]{hyperref}\n";
        let out = patch_preamble(src, "T", "", &profile());
        assert_eq!(out.matches("{hyperref}").count(), 1);
        assert!(!out.contains("colorlinks]"));
        assert!(out.ends_with("\\usepackage{graphicx}\n"));
    }

    #[test]
    fn test_stream_prefixed_anchor() {
        let src = "\\documentclass{beamer}\n<shn>\\usepackage{graphicx}\n<shn>\\usepackage{hyperref}\n<shn>\\usepackage{listings}\n";
        let out = patch_preamble(src, "T", "<shn>", &profile());
        assert!(out.contains("<shn>\\usepackage[T1]{fontenc}"));
        assert!(out.contains("{#1}}\n<shn>\\usepackage{graphicx}\n<shn>\\usepackage{listings}\n"));
        assert_eq!(out.matches("{hyperref}").count(), 1);
    }

    #[test]
    fn test_only_first_anchor_used() {
        let src = "\\documentclass{article}\n\\usepackage{graphicx}\n% again\n\\usepackage{graphicx}\n";
        let out = patch_preamble(src, "T", "", &profile());
        assert_eq!(out.matches("fontenc").count(), 1);
    }

    #[test]
    fn test_idempotent() {
        let src = "\\documentclass{article}\n\\usepackage{graphicx}\n\\begin{document}\n";
        let once = patch_preamble(src, "T", "", &profile());
        let twice = patch_preamble(&once, "Other", "", &profile());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_anchor_returns_input() {
        let src = "just some text";
        assert_eq!(patch_preamble(src, "T", "", &profile()), src);
        assert_eq!(find_insertion_point(src), None);
    }

    #[test]
    fn test_partial_markers_not_patched() {
        assert!(!already_patched("\\usepackage[T1]{fontenc}\n\\usepackage{lmodern}"));
    }
}

//! Directive scanner
//!
//! Finds `\includegraphics` directives and the `\pdftooltip{..}{..}`
//! constructs that may already wrap them. Wrapper detection is a single
//! tokenizer pass that records, for every wrapper occurrence, the half-open
//! byte span of its first argument; asking whether a directive is wrapped is
//! then an interval-containment query.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

/// Tooltip-wrapping construct from the `pdfcomment` package.
pub const WRAPPER_TOKEN: &str = "\\pdftooltip";

lazy_static! {
    /// `\includegraphics[opts]{`, with the starred form accepted. The target
    /// argument is read with a brace walk so `{{fig.1}.png}` stays whole.
    static ref DIRECTIVE_HEAD_RE: Regex =
        Regex::new(r"\\includegraphics\*?(\[[^\]]*\])?\{").unwrap();
}

/// One image-inclusion directive found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Byte span of the whole directive text
    pub span: Range<usize>,
    /// Bracketed options including the brackets, verbatim
    pub options: Option<String>,
    /// Target filename as written (may include a path or grouping braces)
    pub target: String,
}

impl Directive {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }

    /// Target reduced to its last path component, grouping braces removed.
    pub fn file_name(&self) -> String {
        basename(&ungrouped(&self.target)).to_string()
    }
}

/// Last component of a `/` or `\` separated path.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim();
    trimmed
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(trimmed)
}

/// Drop graphicx grouping braces: `{fig.1}.png` → `fig.1.png`.
pub fn ungrouped(target: &str) -> String {
    target.chars().filter(|c| !matches!(c, '{' | '}')).collect()
}

/// Contents of the brace group opening at `open`. Escaped braces do not
/// count; `None` when the group never closes.
pub fn braced_group(source: &str, open: usize) -> Option<&str> {
    let bytes = source.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[open + 1..i]);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// All directives in source order.
pub fn find_directives(source: &str) -> Vec<Directive> {
    let mut found = Vec::new();
    let mut covered_until = 0usize;
    for caps in DIRECTIVE_HEAD_RE.captures_iter(source) {
        let Some(head) = caps.get(0) else {
            continue;
        };
        if head.start() < covered_until {
            continue;
        }
        let open = head.end() - 1;
        let Some(target) = braced_group(source, open) else {
            continue;
        };
        if target.is_empty() {
            continue;
        }
        let end = open + target.len() + 2;
        found.push(Directive {
            span: head.start()..end,
            options: caps.get(1).map(|m| m.as_str().to_string()),
            target: target.to_string(),
        });
        covered_until = end;
    }
    found
}

/// Parse `text` as exactly one directive (surrounding whitespace ignored).
pub fn parse_directive(text: &str) -> Option<Directive> {
    let trimmed = text.trim();
    let mut found = find_directives(trimmed);
    if found.len() != 1 || found[0].span != (0..trimmed.len()) {
        return None;
    }
    found.pop()
}

/// One `\pdftooltip{first}{second}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperSpan {
    /// Offset of the backslash starting the token
    pub start: usize,
    /// Inside of the first argument. Runs to end of input when never closed.
    pub first_arg: Range<usize>,
    /// Inside of the second argument, present only when it was closed
    pub second_arg: Option<Range<usize>>,
}

impl WrapperSpan {
    /// Offset just past the construct's final closing brace.
    pub fn end(&self) -> usize {
        match &self.second_arg {
            Some(second) => second.end + 1,
            None => self.first_arg.end + 1,
        }
    }
}

enum Frame {
    Plain,
    First(usize),
    Second(usize, usize),
}

/// Record every wrapper construct in `source`, ordered by start offset.
///
/// Backslash escapes (`\{`, `\}`, `\\`) never count as braces.
pub fn scan_wrappers(source: &str) -> Vec<WrapperSpan> {
    let bytes = source.as_bytes();
    let token = WRAPPER_TOKEN.as_bytes();
    let len = bytes.len();

    let mut spans: Vec<WrapperSpan> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    // Wrapper whose first argument just closed; a following `{` opens its second.
    let mut awaiting_second: Option<usize> = None;
    let mut i = 0usize;

    while i < len {
        match bytes[i] {
            b'\\' => {
                awaiting_second = None;
                if bytes[i..].starts_with(token) {
                    let mut j = i + token.len();
                    if j < len && bytes[j].is_ascii_alphabetic() {
                        i = j;
                        continue;
                    }
                    while j < len && bytes[j].is_ascii_whitespace() {
                        j += 1;
                    }
                    if j < len && bytes[j] == b'{' {
                        spans.push(WrapperSpan {
                            start: i,
                            first_arg: j + 1..len,
                            second_arg: None,
                        });
                        stack.push(Frame::First(spans.len() - 1));
                        i = j + 1;
                    } else {
                        i = j;
                    }
                    continue;
                }
                i += 2;
                continue;
            }
            b'{' => {
                let frame = match awaiting_second.take() {
                    Some(idx) => Frame::Second(idx, i + 1),
                    None => Frame::Plain,
                };
                stack.push(frame);
            }
            b'}' => {
                awaiting_second = None;
                match stack.pop() {
                    Some(Frame::First(idx)) => {
                        spans[idx].first_arg.end = i;
                        awaiting_second = Some(idx);
                    }
                    Some(Frame::Second(idx, start)) => {
                        spans[idx].second_arg = Some(start..i);
                    }
                    Some(Frame::Plain) | None => {}
                }
            }
            b if b.is_ascii_whitespace() => {}
            _ => awaiting_second = None,
        }
        i += 1;
    }

    spans
}

/// Precomputed wrapper spans answering "is this offset wrapped?".
#[derive(Debug, Clone, Default)]
pub struct WrapperIndex {
    spans: Vec<WrapperSpan>,
}

impl WrapperIndex {
    pub fn build(source: &str) -> Self {
        Self {
            spans: scan_wrappers(source),
        }
    }

    /// True when `pos` lies inside the first argument of some wrapper.
    pub fn is_wrapped(&self, pos: usize) -> bool {
        let candidates = self.spans.partition_point(|s| s.first_arg.start <= pos);
        self.spans[..candidates]
            .iter()
            .rev()
            .any(|s| s.first_arg.contains(&pos))
    }
}

/// One-shot form of [`WrapperIndex::is_wrapped`].
pub fn is_wrapped(source: &str, pos: usize) -> bool {
    WrapperIndex::build(source).is_wrapped(pos)
}

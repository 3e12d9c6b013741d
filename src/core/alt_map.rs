//! Alt-text map extraction, pre-conversion stripping and HTML injection.
//!
//! The renderer never sees `\pdftooltip`: the map is read from the wrapped
//! source, the wrappers are stripped to bare directives, and the descriptions
//! are put back as `alt` attributes on the rendered `<img>` tags.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::core::scanner::{basename, parse_directive, scan_wrappers};
use crate::core::wrapper::unescape_latex;

/// Image basename → alt text. Iterates in first-seen order.
pub type AltMap = IndexMap<String, String>;

lazy_static! {
    static ref IMG_TAG_RE: Regex = Regex::new(r"<img\s[^>]*>").unwrap();
    static ref SRC_ATTR_RE: Regex = Regex::new(r#"\ssrc\s*=\s*"([^"]+)""#).unwrap();
    static ref ALT_ATTR_RE: Regex = Regex::new(r"\salt\s*=").unwrap();
}

/// Wrapped directives as (directive text, alt text, whole construct span).
fn wrapped_directives(source: &str) -> Vec<(String, String, std::ops::Range<usize>)> {
    let mut found = Vec::new();
    let mut covered_until = 0usize;
    for span in scan_wrappers(source) {
        if span.start < covered_until {
            continue;
        }
        let Some(second) = span.second_arg.clone() else {
            continue;
        };
        let first = &source[span.first_arg.clone()];
        if parse_directive(first).is_none() {
            continue;
        }
        covered_until = span.end();
        found.push((
            first.trim().to_string(),
            source[second].to_string(),
            span.start..span.end(),
        ));
    }
    found
}

/// Build the alt map from a wrapped source. Later duplicates of a basename
/// overwrite earlier ones.
pub fn extract_alt_map(source: &str) -> AltMap {
    let mut map = AltMap::new();
    for (directive, alt, _) in wrapped_directives(source) {
        let Some(parsed) = parse_directive(&directive) else {
            continue;
        };
        let alt = unescape_latex(alt.trim());
        map.insert(parsed.file_name(), alt);
    }
    map
}

/// Prepare a wrapped source for the renderer: unwrap every wrapped directive
/// and drop the `pdfcomment` lines it cannot parse.
pub fn strip_for_converter(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut prev = 0usize;
    for (directive, _, range) in wrapped_directives(source) {
        out.push_str(&source[prev..range.start]);
        out.push_str(&directive);
        prev = range.end;
    }
    out.push_str(&source[prev..]);

    out.split_inclusive('\n')
        .filter(|line| !references_pdfcomment(line))
        .collect()
}

fn references_pdfcomment(line: &str) -> bool {
    (line.contains("IfFileExists") && line.contains("pdfcomment"))
        || line.contains("usepackage{pdfcomment}")
}

/// Add `alt` as the first attribute of every `<img>` that lacks one and whose
/// source basename is in the map.
pub fn inject_alt_map(markup: &str, map: &AltMap) -> String {
    inject_alt_map_counted(markup, map).0
}

/// [`inject_alt_map`] plus the number of tags that received an `alt`.
pub fn inject_alt_map_counted(markup: &str, map: &AltMap) -> (String, usize) {
    if map.is_empty() {
        return (markup.to_string(), 0);
    }
    let mut injected = 0usize;
    let out = IMG_TAG_RE
        .replace_all(markup, |caps: &Captures| {
            let tag = &caps[0];
            if ALT_ATTR_RE.is_match(tag) {
                return tag.to_string();
            }
            let Some(src) = SRC_ATTR_RE.captures(tag).and_then(|c| c.get(1)) else {
                return tag.to_string();
            };
            match map.get(basename(src.as_str())) {
                Some(alt) => {
                    injected += 1;
                    format!("<img alt=\"{}\"{}", escape_attr(alt), &tag["<img".len()..])
                }
                None => tag.to_string(),
            }
        })
        .into_owned();
    (out, injected)
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_basename_and_trim() {
        let src = r"\pdftooltip{\includegraphics[width=3in]{figs/a.png}}{  A plot  }";
        let map = extract_alt_map(src);
        assert_eq!(map.len(), 1);
        assert_eq!(map["a.png"], "A plot");
    }

    #[test]
    fn test_extract_last_duplicate_wins() {
        let src = concat!(
            r"\pdftooltip{\includegraphics{x/a.png}}{first}",
            "\n",
            r"\pdftooltip{\includegraphics{y/a.png}}{second}",
        );
        let map = extract_alt_map(src);
        assert_eq!(map.len(), 1);
        assert_eq!(map["a.png"], "second");
    }

    #[test]
    fn test_extract_keeps_nested_authored_text() {
        let src = r"\pdftooltip{\includegraphics{a.png}}{Plot of $x^{2}$, 10\% error}";
        assert_eq!(extract_alt_map(src)["a.png"], "Plot of $x^{2}$, 10% error");
    }

    #[test]
    fn test_extract_ignores_non_directive_tooltips() {
        let src = r"\pdftooltip{\textbf{hover me}}{tip} \pdftooltip{\includegraphics{b.png}}{B}";
        let map = extract_alt_map(src);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b.png"]);
    }

    #[test]
    fn test_strip_unwraps_and_drops_pdfcomment_lines() {
        let src = concat!(
            "\\usepackage{lmodern}\n",
            "\\IfFileExists{pdfcomment.sty}{\\usepackage{pdfcomment}}{\\newcommand{\\pdftooltip}[2]{#1}}\n",
            "\\begin{document}\n",
            "\\pdftooltip{\\includegraphics[scale=0.5]{a.png}}{Alt}\n",
            "\\end{document}\n",
        );
        let out = strip_for_converter(src);
        assert_eq!(
            out,
            "\\usepackage{lmodern}\n\\begin{document}\n\\includegraphics[scale=0.5]{a.png}\n\\end{document}\n"
        );
    }

    #[test]
    fn test_inject_adds_alt_first() {
        let mut map = AltMap::new();
        map.insert("a.png".to_string(), "A \"quoted\" plot".to_string());
        let html = r#"<p><img src="figs/a.png" style="width:50%" /></p>"#;
        assert_eq!(
            inject_alt_map(html, &map),
            r#"<p><img alt="A &quot;quoted&quot; plot" src="figs/a.png" style="width:50%" /></p>"#
        );
    }

    #[test]
    fn test_inject_never_overrides_existing_alt() {
        let mut map = AltMap::new();
        map.insert("a.png".to_string(), "From map".to_string());
        let html = r#"<img src="a.png" alt="Authored" />"#;
        assert_eq!(inject_alt_map(html, &map), html);
    }

    #[test]
    fn test_inject_counts_matches() {
        let mut map = AltMap::new();
        map.insert("a.png".to_string(), "A".to_string());
        map.insert("b.png".to_string(), "B".to_string());
        let html = r#"<img src="a.png" /><img src="b.png" alt="" /><img src="data:image/png;base64,AAAA" />"#;
        let (out, injected) = inject_alt_map_counted(html, &map);
        assert_eq!(injected, 1);
        assert!(out.starts_with(r#"<img alt="A" src="a.png" />"#));
    }

    #[test]
    fn test_inject_skips_unknown_and_data_src() {
        let mut map = AltMap::new();
        map.insert("a.png".to_string(), "A".to_string());
        let html = r#"<img src="b.png" /><img data-src="a.png" />"#;
        assert_eq!(inject_alt_map(html, &map), html);
    }
}

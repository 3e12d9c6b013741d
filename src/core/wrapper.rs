//! Image wrapper
//!
//! Wraps every bare `\includegraphics` in `\pdftooltip{directive}{alt}` with
//! a marked alt-text guess. Directives already inside a wrapper's first
//! argument are copied through, so the pass is idempotent.

use crate::config::Profile;
use crate::core::alt_text::marked_guess;
use crate::core::scanner::{find_directives, WrapperIndex, WRAPPER_TOKEN};

/// Text-mode specials and how a guess spells them in LaTeX.
pub const LATEX_ESCAPES: [(char, &str); 9] = [
    ('#', "\\#"),
    ('$', "\\$"),
    ('%', "\\%"),
    ('&', "\\&"),
    ('_', "\\_"),
    ('{', "\\{"),
    ('}', "\\}"),
    ('^', "\\^{}"),
    ('~', "\\~{}"),
];

/// Wrap every unwrapped image directive.
pub fn wrap_images(source: &str, profile: &Profile) -> String {
    let index = WrapperIndex::build(source);
    let mut out = String::with_capacity(source.len());
    let mut prev = 0usize;
    let mut wrapped = 0usize;

    for directive in find_directives(source) {
        out.push_str(&source[prev..directive.span.start]);
        let text = directive.text(source);
        if index.is_wrapped(directive.span.start) {
            out.push_str(text);
        } else {
            let alt = marked_guess(profile, &directive.target, None);
            out.push_str(WRAPPER_TOKEN);
            out.push('{');
            out.push_str(text);
            out.push_str("}{");
            out.push_str(&escape_latex(&alt));
            out.push('}');
            wrapped += 1;
        }
        prev = directive.span.end;
    }
    out.push_str(&source[prev..]);

    if wrapped > 0 {
        log::debug!("wrapped {} image(s) with alt-text tooltips", wrapped);
    }
    out
}

/// Escape LaTeX specials. Sequences that are already escaped are copied
/// through, so escaping twice is the same as escaping once.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if ch == '\\' {
            let len = match LATEX_ESCAPES.iter().find(|(_, seq)| rest.starts_with(seq)) {
                Some((_, seq)) => seq.len(),
                // Any other `\x` is copied as a pair.
                None => 1 + rest[1..].chars().next().map_or(0, char::len_utf8),
            };
            out.push_str(&rest[..len]);
            rest = &rest[len..];
            continue;
        }
        match LATEX_ESCAPES.iter().find(|(special, _)| *special == ch) {
            Some((_, seq)) => out.push_str(seq),
            None => out.push(ch),
        }
        rest = &rest[ch.len_utf8()..];
    }
    out
}

/// Reverse [`escape_latex`]; other backslash sequences are left alone.
pub fn unescape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(ch) = rest.chars().next() {
        if let Some((special, seq)) = LATEX_ESCAPES.iter().find(|(_, seq)| rest.starts_with(seq)) {
            out.push(*special);
            rest = &rest[seq.len()..];
            continue;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::find_directives;

    #[test]
    fn test_wraps_bare_directive() {
        let profile = Profile::default();
        let out = wrap_images(r"See \includegraphics[width=2in]{plot.png}.", &profile);
        assert_eq!(
            out,
            format!(
                r"See \pdftooltip{{\includegraphics[width=2in]{{plot.png}}}}{{{} Figure: plot}}.",
                profile.alt_marker
            )
        );
    }

    #[test]
    fn test_leaves_wrapped_directive() {
        let profile = Profile::default();
        let src = r"\pdftooltip{\includegraphics{a.png}}{Authored description}";
        assert_eq!(wrap_images(src, &profile), src);
    }

    #[test]
    fn test_wrap_twice_is_wrap_once() {
        let profile = Profile::default();
        let src = "\\includegraphics{a.png}\n\\includegraphics{usb_figs/b_2.png}\n\\pdftooltip{\\includegraphics{c.png}}{C}";
        let once = wrap_images(src, &profile);
        assert_eq!(wrap_images(&once, &profile), once);
        assert_eq!(find_directives(&once).len(), 3);
    }

    #[test]
    fn test_guess_with_underscore_is_escaped() {
        let profile = Profile::default();
        let out = wrap_images(r"\includegraphics{usb_figs/b_2.png}", &profile);
        assert!(out.contains(r"USB architecture diagram (b\_2.png)"));
    }

    #[test]
    fn test_escape_roundtrip() {
        let raw = "50% of R&D_costs #1";
        let escaped = escape_latex(raw);
        assert_eq!(escaped, r"50\% of R\&D\_costs \#1");
        assert_eq!(escape_latex(&escaped), escaped);
        assert_eq!(unescape_latex(&escaped), raw);
        assert_eq!(unescape_latex(r"\textbf{x}"), r"\textbf{x}");
    }

    #[test]
    fn test_escape_math_and_group_chars() {
        let raw = "x^2~plot {v1}";
        let escaped = escape_latex(raw);
        assert_eq!(escaped, r"x\^{}2\~{}plot \{v1\}");
        assert_eq!(escape_latex(&escaped), escaped);
        assert_eq!(unescape_latex(&escaped), raw);
    }

    #[test]
    fn test_wrap_keeps_caret_filename_compilable() {
        let profile = Profile::default();
        let out = wrap_images(r"\includegraphics{x^2~plot.png}", &profile);
        assert!(out.starts_with(r"\pdftooltip{\includegraphics{x^2~plot.png}}{"));
        assert!(out.ends_with(r"Figure: x\^{}2\~{}plot}"));
    }

    #[test]
    fn test_wrap_grouped_target_intact() {
        let profile = Profile::default();
        let src = "A \\includegraphics[width=2in]{{fig.1}.png} B \\includegraphics{c.png}";
        let out = wrap_images(src, &profile);
        assert!(out.contains(&format!(
            r"\pdftooltip{{\includegraphics[width=2in]{{{{fig.1}}.png}}}}{{{} Figure: fig.1}}",
            profile.alt_marker
        )));
        assert_eq!(wrap_images(&out, &profile), out);
        let map = crate::core::alt_map::extract_alt_map(&out);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["fig.1.png", "c.png"]);
    }
}

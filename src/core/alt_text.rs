//! Alt-text guesser
//!
//! Maps an image filename to a human-readable description. The result is a
//! pure function of the filename, the directory hint and the profile tables,
//! so re-running over an already-wrapped document reproduces the same guess.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::Profile;
use crate::core::scanner::{basename, ungrouped};

lazy_static! {
    static ref SEPARATORS_RE: Regex = Regex::new(r"[-_]").unwrap();
    static ref LONG_NUMBER_RE: Regex = Regex::new(r"\d{4,}").unwrap();
}

/// Guess a description for `filename`.
///
/// Order: curated figure table by lowercase stem, then the folder-hint table
/// keyed by `directory_hint` (or the path's parent directory, unknown ones
/// getting the profile's default topic), then a cleaned-up rendering of the
/// stem for paths without a directory.
pub fn guess_alt(profile: &Profile, filename: &str, directory_hint: Option<&str>) -> String {
    let filename = ungrouped(filename);
    let base = basename(&filename);
    let stem = file_stem(base).to_lowercase();

    if let Some(known) = profile.known_figures.get(&stem) {
        return known.clone();
    }

    if let Some(dir) = directory_hint.or_else(|| parent_dir(&filename)) {
        let topic = profile
            .folder_hints
            .get(dir)
            .unwrap_or(&profile.default_folder_topic);
        return format!("{} ({})", topic, base);
    }

    let readable = SEPARATORS_RE.replace_all(&stem, " ");
    let readable = LONG_NUMBER_RE.replace_all(&readable, "");
    let readable = readable.split_whitespace().collect::<Vec<_>>().join(" ");
    if readable.is_empty() {
        format!("Figure ({})", base)
    } else {
        format!("Figure: {}", readable)
    }
}

/// Guess and prefix with the profile's review marker.
pub fn marked_guess(profile: &Profile, filename: &str, directory_hint: Option<&str>) -> String {
    profile.mark(&guess_alt(profile, filename, directory_hint))
}

fn file_stem(base: &str) -> &str {
    Path::new(base)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(base)
}

/// Name of the directory directly containing the file, if the path has one.
fn parent_dir(filename: &str) -> Option<&str> {
    let mut parts = filename
        .trim()
        .rsplit(|c: char| c == '/' || c == '\\')
        .skip(1);
    parts.next().filter(|dir| !dir.is_empty() && *dir != ".")
}

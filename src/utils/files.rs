//! File helpers: reading documents, copy-before-mutate backups and batch
//! discovery.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::dialect::Dialect;
use crate::utils::error::{TexAltError, TexAltResult};

/// Read a document, mapping a missing file to [`TexAltError::FileNotFound`].
pub fn read_document(path: &Path) -> TexAltResult<String> {
    if !path.is_file() {
        return Err(TexAltError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(TexAltError::io("read", path))
}

/// `paper.tex` → `paper.tex.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

/// Copy `path` to its backup location. Must run before the first write.
pub fn backup(path: &Path) -> TexAltResult<PathBuf> {
    let bak = backup_path(path);
    fs::copy(path, &bak).map_err(TexAltError::io("back up", path))?;
    Ok(bak)
}

/// Directory holding `path`, usable as a working directory.
pub fn document_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Sibling of `path` named `<stem><suffix>`.
pub fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    document_dir(path).join(format!("{}{}", stem, suffix))
}

/// Top-level documents of `dialect` in `dir`, sorted by name.
pub fn find_documents(dir: &Path, dialect: Dialect) -> TexAltResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(TexAltError::io("list", dir))?;
    let mut found = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(dialect.extension()));
        if !matches_ext {
            continue;
        }
        // Non-UTF-8 sources are still candidates; only the class check reads text.
        let text = fs::read(&path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();
        if dialect.is_batch_candidate(&path, &text) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Batch candidates of `dialect`, or of every dialect when `None`.
///
/// `<stem>.<variant>.tex` files beside a `<stem>.shn` are converter output
/// and are left out.
pub fn find_batch(dir: &Path, dialect: Option<Dialect>) -> TexAltResult<Vec<PathBuf>> {
    let dialects = match dialect {
        Some(dialect) => vec![dialect],
        None => vec![Dialect::Tex, Dialect::Stream],
    };
    let mut found = Vec::new();
    for dialect in dialects {
        found.extend(find_documents(dir, dialect)?);
    }
    found.retain(|path| !is_converter_output(path));
    found.sort();
    Ok(found)
}

fn is_converter_output(path: &Path) -> bool {
    if Dialect::from_path(path) != Dialect::Tex {
        return false;
    }
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return false;
    };
    match stem.rsplit_once('.') {
        Some((base, _variant)) => document_dir(path)
            .join(format!("{}.{}", base, Dialect::Stream.extension()))
            .is_file(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_appends_suffix() {
        assert_eq!(backup_path(Path::new("notes/Cprog.shn")), PathBuf::from("notes/Cprog.shn.bak"));
    }

    #[test]
    fn test_document_dir_of_bare_name() {
        assert_eq!(document_dir(Path::new("paper.tex")), PathBuf::from("."));
        assert_eq!(document_dir(Path::new("a/paper.tex")), PathBuf::from("a"));
    }

    #[test]
    fn test_sibling_with_suffix() {
        assert_eq!(
            sibling_with_suffix(Path::new("a/Serial.shn"), ".n.tex"),
            PathBuf::from("a/Serial.n.tex")
        );
    }

    #[test]
    fn test_find_documents_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.tex"), "\\documentclass{article}").unwrap();
        fs::write(dir.path().join("a.tex"), "\\documentclass{beamer}").unwrap();
        fs::write(dir.path().join("part.tex"), "\\section{x}").unwrap();
        fs::write(dir.path().join("notes.shn"), "").unwrap();

        let found = find_documents(dir.path(), Dialect::Tex).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.tex", "b.tex"]);

        let shn = find_documents(dir.path(), Dialect::Stream).unwrap();
        assert_eq!(shn.len(), 1);
    }

    #[test]
    fn test_find_batch_mixes_dialects() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Serial.shn"), "<shn>\\usepackage{hyperref}").unwrap();
        fs::write(dir.path().join("Serial.n.tex"), "\\documentclass{beamer}").unwrap();
        fs::write(dir.path().join("paper.tex"), "\\documentclass{article}").unwrap();
        fs::write(dir.path().join("oldSerial.shn"), "").unwrap();

        let names = |found: Vec<PathBuf>| -> Vec<String> {
            found
                .iter()
                .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
                .collect()
        };
        assert_eq!(
            names(find_batch(dir.path(), None).unwrap()),
            vec!["Serial.shn", "paper.tex"]
        );
        assert_eq!(
            names(find_batch(dir.path(), Some(Dialect::Stream)).unwrap()),
            vec!["Serial.shn"]
        );
        assert_eq!(
            names(find_batch(dir.path(), Some(Dialect::Tex)).unwrap()),
            vec!["paper.tex"]
        );
    }

    #[test]
    fn test_read_missing_document() {
        let err = read_document(Path::new("/definitely/not/here.tex")).unwrap_err();
        assert!(matches!(err, TexAltError::FileNotFound { .. }));
    }
}

//! Per-document orchestration.
//!
//! Two independent steps run for each document:
//! - the PDF step rewrites the source in place (backup first) so the next
//!   `pdflatex` run picks up metadata and tooltips;
//! - the HTML step derives a self-contained HTML+MathML rendering through the
//!   external converter and renderer and carries the alt text over.
//!
//! [`process_document`] and [`process_batch`] never return errors: every
//! step's result is recorded in a [`DocumentReport`] so one bad document or
//! one missing tool does not stop the rest of the run.

pub mod tools;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::config::Profile;
use crate::core::{already_patched, derive_title, inject_alt_map_counted, Dialect};
use crate::{make_accessible, prepare_for_html};
use crate::utils::error::{TexAltError, TexAltResult};
use crate::utils::files::{backup, document_dir, read_document, sibling_with_suffix};

use tools::{embed_resources, render_html, run_converter, Tool};

/// Result of the PDF step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum PatchOutcome {
    /// Output identical to input; nothing written, no backup taken
    Unchanged,
    Written {
        backup: Option<PathBuf>,
        /// Title used for the inserted preamble, when one was inserted
        title: Option<String>,
    },
}

/// Result of the HTML step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HtmlOutcome {
    pub html: PathBuf,
    /// Entries in the alt map read from the source
    pub images_with_alt: usize,
    /// `<img>` tags that received an `alt` attribute
    pub alt_injected: usize,
    /// Renderer stderr from a successful run
    pub warnings: Option<String>,
}

/// Outcome of one step, kept serializable for `--report`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepResult<T> {
    Done(T),
    Failed { error: String },
}

impl<T> StepResult<T> {
    fn from_result(result: TexAltResult<T>) -> Self {
        match result {
            Ok(value) => StepResult::Done(value),
            Err(err) => StepResult::Failed {
                error: err.to_string(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepResult::Failed { .. })
    }
}

/// Everything that happened to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub dialect: Dialect,
    /// Set when the document was skipped before any step ran
    pub skipped: Option<String>,
    pub patch: Option<StepResult<PatchOutcome>>,
    pub html: Option<StepResult<HtmlOutcome>>,
}

impl DocumentReport {
    pub fn failed(&self) -> bool {
        self.skipped.is_some()
            || self.patch.as_ref().is_some_and(StepResult::is_failed)
            || self.html.as_ref().is_some_and(StepResult::is_failed)
    }
}

/// Which steps to run and how.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub patch: bool,
    pub html: bool,
    pub backup: bool,
    /// Force a dialect instead of going by extension
    pub dialect: Option<Dialect>,
    /// Converter output variant; the profile's default when unset
    pub variant: Option<String>,
}

/// PDF step: patch the preamble if needed, wrap images, write back.
pub fn apply_pdf_accessibility(
    path: &Path,
    dialect: Dialect,
    profile: &Profile,
    make_backup: bool,
) -> TexAltResult<PatchOutcome> {
    log::info!("[PDF] {}", path.display());
    let source = read_document(path)?;

    let preamble_done = already_patched(&source);
    let title = derive_title(path, &source, dialect, profile);
    let prefix = dialect.line_prefix(&source);
    if preamble_done {
        log::info!("  preamble already patched; checking images only");
    } else {
        log::info!("  title: {}", title);
        if !prefix.is_empty() {
            log::info!("  stream prefix: \"{}\"", prefix);
        }
    }

    let new_text = make_accessible(&source, &title, &prefix, profile);
    if new_text == source {
        log::info!("  no changes needed.");
        return Ok(PatchOutcome::Unchanged);
    }

    let backup_path = if make_backup {
        let bak = backup(path)?;
        log::info!("  backup → {}", bak.display());
        Some(bak)
    } else {
        None
    };
    fs::write(path, &new_text).map_err(TexAltError::io("write", path))?;
    log::info!("  written → {}", path.display());

    Ok(PatchOutcome::Written {
        backup: backup_path,
        title: (!preamble_done).then_some(title),
    })
}

/// HTML step: convert, strip wrappers, render, inject alt text.
pub fn generate_html(
    path: &Path,
    dialect: Dialect,
    profile: &Profile,
    variant: Option<&str>,
) -> TexAltResult<HtmlOutcome> {
    log::info!("[HTML] {}", path.display());
    let source = read_document(path)?;
    let renderer = Tool::locate(&profile.tools.pandoc)?;
    let dir = document_dir(path);

    let (intermediate, temp_suffix) = match dialect {
        Dialect::Tex => (source.clone(), ".pandoc_tmp.tex".to_string()),
        Dialect::Stream => {
            let converter = Tool::locate(&profile.tools.coursetex)?;
            let variant = variant.unwrap_or(&profile.tools.stream_variant);
            let generated = run_converter(&converter, path, variant)?;
            let text =
                fs::read_to_string(&generated).map_err(TexAltError::io("read", &generated))?;
            (text, format!(".{}.pandoc.tex", variant))
        }
    };

    let (alt_map, clean) = prepare_for_html(&intermediate);

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    // Removed when dropped, whichever way this function returns.
    let mut temp = scoped_temp(&dir, stem, &temp_suffix)?;
    let temp_path = temp.path().to_path_buf();
    temp.write_all(clean.as_bytes())
        .map_err(TexAltError::io("write intermediate", &temp_path))?;

    let html_path = sibling_with_suffix(path, ".html");
    let title = derive_title(path, &source, dialect, profile);

    // Alt text is matched on file names, so inject before images are inlined.
    let linked = scoped_temp(&dir, stem, ".pandoc_tmp.html")?;
    let linked_path = linked.path().to_path_buf();
    let rendered = render_html(&renderer, &temp_path, &linked_path, &title, profile, &dir)?;
    drop(temp);

    let html = fs::read_to_string(&linked_path).map_err(TexAltError::io("read", &linked_path))?;
    let (html, alt_injected) = inject_alt_map_counted(&html, &alt_map);
    if !alt_map.is_empty() && alt_injected == 0 {
        log::warn!("  no <img> tag matched a known image; alt text not applied");
    }

    let mut warnings = rendered.stderr.trim().to_string();
    if profile.tools.embed_resources {
        fs::write(&linked_path, &html).map_err(TexAltError::io("write", &linked_path))?;
        let embedded = embed_resources(&renderer, &linked_path, &html_path, &title, profile, &dir)?;
        let extra = embedded.stderr.trim();
        if !extra.is_empty() {
            if !warnings.is_empty() {
                warnings.push('\n');
            }
            warnings.push_str(extra);
        }
    } else {
        fs::write(&html_path, &html).map_err(TexAltError::io("write", &html_path))?;
    }
    drop(linked);

    log::info!(
        "  → {}  ({} images with alt text)",
        html_path.display(),
        alt_injected
    );
    if !warnings.is_empty() {
        let preview: String = warnings.chars().take(200).collect();
        log::warn!("  renderer warnings: {}", preview);
    }

    Ok(HtmlOutcome {
        html: html_path,
        images_with_alt: alt_map.len(),
        alt_injected,
        warnings: (!warnings.is_empty()).then_some(warnings),
    })
}

/// Temporary file beside the document, deleted on drop.
fn scoped_temp(dir: &Path, stem: &str, suffix: &str) -> TexAltResult<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(&format!("{}.", stem))
        .suffix(suffix)
        .tempfile_in(dir)
        .map_err(TexAltError::io("create intermediate in", dir))
}

/// Run the requested steps for one document.
pub fn process_document(path: &Path, profile: &Profile, options: &RunOptions) -> DocumentReport {
    let dialect = options.dialect.unwrap_or_else(|| Dialect::from_path(path));
    let mut report = DocumentReport {
        path: path.to_path_buf(),
        dialect,
        skipped: None,
        patch: None,
        html: None,
    };

    if !path.is_file() {
        log::warn!("{} not found; skipping", path.display());
        report.skipped = Some(
            TexAltError::FileNotFound {
                path: path.to_path_buf(),
            }
            .to_string(),
        );
        return report;
    }

    if options.patch {
        let result = apply_pdf_accessibility(path, dialect, profile, options.backup);
        if let Err(err) = &result {
            log_step_error(err);
        }
        report.patch = Some(StepResult::from_result(result));
    }
    if options.html {
        let result = generate_html(path, dialect, profile, options.variant.as_deref());
        if let Err(err) = &result {
            log_step_error(err);
        }
        report.html = Some(StepResult::from_result(result));
    }
    report
}

fn log_step_error(err: &TexAltError) {
    log::error!("  {}", err);
    if err.is_environment() {
        log::info!("  install it or set its path under [tools] in the profile, then re-run");
    }
}

/// Run the requested steps for every document, in order.
pub fn process_batch(paths: &[PathBuf], profile: &Profile, options: &RunOptions) -> Vec<DocumentReport> {
    paths
        .iter()
        .map(|path| process_document(path, profile, options))
        .collect()
}

//! TexAlt - accessibility post-processor for LaTeX sources
//!
//! TexAlt rewrites LaTeX (and `coursetex` stream) sources so the compiled PDF
//! carries a document language, proper font encoding, PDF metadata and
//! alt-text tooltips on every image, and derives a self-contained
//! HTML+MathML rendering that keeps the same alt text.
//!
//! # Example
//!
//! ```
//! use texalt::{make_accessible, Profile};
//!
//! let profile = Profile::default();
//! let source = "\\documentclass{article}\n\\begin{document}\n\\includegraphics{plot.png}\n\\end{document}\n";
//! let patched = make_accessible(source, "Lab Report", "", &profile);
//!
//! assert!(patched.contains("pdftitle={Lab Report}"));
//! assert!(patched.contains("\\pdftooltip{\\includegraphics{plot.png}}"));
//! // Running again changes nothing.
//! assert_eq!(make_accessible(&patched, "Lab Report", "", &profile), patched);
//! ```

pub mod config;
pub mod core;
pub mod pipeline;
pub mod utils;

pub use config::{Profile, ToolConfig};
pub use core::{
    already_patched, extract_alt_map, guess_alt, inject_alt_map, patch_preamble,
    strip_for_converter, wrap_images, AltMap, Dialect,
};
pub use pipeline::{
    apply_pdf_accessibility, generate_html, process_batch, process_document, DocumentReport,
    RunOptions,
};
pub use utils::error::{TexAltError, TexAltResult};

/// Patch the preamble (unless already patched) and wrap every bare image.
///
/// `prefix` is repeated at the start of each inserted preamble line; pass
/// `""` for plain LaTeX.
pub fn make_accessible(source: &str, title: &str, prefix: &str, profile: &Profile) -> String {
    let patched = patch_preamble(source, title, prefix, profile);
    wrap_images(&patched, profile)
}

/// Alt-text map of a wrapped source together with the renderer-ready text.
pub fn prepare_for_html(wrapped_source: &str) -> (AltMap, String) {
    (
        extract_alt_map(wrapped_source),
        strip_for_converter(wrapped_source),
    )
}

//! Core source transforms
//!
//! Every function in this module is pure: it takes source text plus the
//! run's [`Profile`](crate::config::Profile) and returns new text or plain
//! data, with no hidden scan state and no I/O.
//!
//! - [`scanner`]: image directives and `\pdftooltip` wrapper spans
//! - [`alt_text`]: filename → description guesses
//! - [`preamble`]: accessibility block insertion
//! - [`wrapper`]: tooltip wrapping of image directives
//! - [`alt_map`]: alt-text map extraction and HTML injection
//! - [`title`], [`dialect`]: per-document metadata

pub mod alt_map;
pub mod alt_text;
pub mod dialect;
pub mod preamble;
pub mod scanner;
pub mod title;
pub mod wrapper;

pub use alt_map::{
    extract_alt_map, inject_alt_map, inject_alt_map_counted, strip_for_converter, AltMap,
};
pub use alt_text::{guess_alt, marked_guess};
pub use dialect::Dialect;
pub use preamble::{
    accessibility_block, already_patched, find_insertion_point, patch_preamble, InsertionPoint,
};
pub use scanner::{find_directives, is_wrapped, scan_wrappers, Directive, WrapperIndex, WrapperSpan};
pub use title::derive_title;
pub use wrapper::wrap_images;

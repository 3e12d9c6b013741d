//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Error types and result types
//! - Document files, backups and batch discovery

pub mod error;
pub mod files;

// Re-export commonly used items
pub use error::{TexAltError, TexAltResult};
pub use files::{backup, backup_path, find_batch, find_documents, read_document};

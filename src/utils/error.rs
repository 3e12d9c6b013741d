//! Error handling for TexAlt
//!
//! This module provides a unified error type and result type for the
//! file-level operations. The text transforms in `core` are infallible;
//! only reading/writing documents and driving external tools can fail.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for per-document steps
#[derive(Debug, Error)]
pub enum TexAltError {
    /// The requested document does not exist
    #[error("input file not found: '{}'", path.display())]
    FileNotFound { path: PathBuf },

    /// An external tool is not available in the execution environment
    #[error("required tool '{tool}' not found on PATH")]
    ToolMissing { tool: String },

    /// An external tool ran but exited unsuccessfully
    #[error("'{tool}' failed ({status}):\n{stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    /// An external tool succeeded but did not produce the file we expected
    #[error("'{tool}' did not produce '{}'", path.display())]
    OutputMissing { tool: String, path: PathBuf },

    /// IO error (for file operations)
    #[error("failed to {action} '{}': {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Profile could not be read or parsed
    #[error("invalid profile '{}': {message}", path.display())]
    Profile { path: PathBuf, message: String },
}

/// Result type for per-document operations
pub type TexAltResult<T> = Result<T, TexAltError>;

// Convenience constructors for errors
impl TexAltError {
    /// Build a `map_err` adapter that tags an IO error with its action and path.
    pub fn io<'a>(
        action: &'static str,
        path: &'a Path,
    ) -> impl FnOnce(std::io::Error) -> Self + 'a {
        move |source| TexAltError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn tool_missing(tool: impl Into<String>) -> Self {
        TexAltError::ToolMissing { tool: tool.into() }
    }

    pub fn tool_failed(
        tool: impl Into<String>,
        status: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        TexAltError::ToolFailed {
            tool: tool.into(),
            status: status.into(),
            stderr: stderr.into(),
        }
    }

    pub fn profile(path: &Path, message: impl Into<String>) -> Self {
        TexAltError::Profile {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// True for the "install something and re-run" class of failures.
    pub fn is_environment(&self) -> bool {
        matches!(self, TexAltError::ToolMissing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_display() {
        let err = TexAltError::FileNotFound {
            path: PathBuf::from("notes/Cprog.shn"),
        };
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("Cprog.shn"));
    }

    #[test]
    fn test_tool_failed_keeps_stderr_verbatim() {
        let err = TexAltError::tool_failed("pandoc", "exit status: 64", "Error at line 3\n");
        let msg = err.to_string();
        assert!(msg.contains("pandoc"));
        assert!(msg.contains("exit status: 64"));
        assert!(msg.contains("Error at line 3"));
    }

    #[test]
    fn test_io_adapter_tags_action_and_path() {
        let path = Path::new("paper.tex");
        let err = TexAltError::io("read", path)(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let msg = err.to_string();
        assert!(msg.starts_with("failed to read 'paper.tex'"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_environment_class() {
        assert!(TexAltError::tool_missing("coursetex").is_environment());
        assert!(!TexAltError::tool_failed("pandoc", "1", "").is_environment());
    }
}

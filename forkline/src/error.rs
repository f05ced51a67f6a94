//! Errors raised while building a worker launch command.
//!
//! Every failure is fatal for the single worker being built. Nothing here is
//! retried; the orchestrator decides whether to skip the worker or halt.
//!
//! # Error Codes
//!
//! | Code      | Kind          | Description                                  |
//! |-----------|---------------|----------------------------------------------|
//! | FORK-E001 | Directory     | Working or temp directory unusable           |
//! | FORK-E002 | ArchiveWrite  | Manifest jar could not be synthesized        |
//! | FORK-E003 | Configuration | Structurally invalid launch inputs           |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for fork command construction.
pub type Result<T> = std::result::Result<T, ForkError>;

/// Errors that abort the construction of one launch command.
#[derive(Debug, Error)]
pub enum ForkError {
    /// Working or temp directory cannot be created, or is not a directory.
    #[error("Directory {}: {reason}", path.display())]
    Directory { path: PathBuf, reason: String },

    /// I/O failure while writing the manifest jar.
    #[error("Error creating archive file {}: {source}", path.display())]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: ArchiveCause,
    },

    /// Invalid inputs supplied by the caller.
    #[error("Invalid fork configuration: {0}")]
    Configuration(String),
}

/// Underlying cause of an archive write failure.
#[derive(Debug, Error)]
pub enum ArchiveCause {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl ForkError {
    /// Shorthand for a directory failure.
    pub fn directory(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Directory {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an archive failure.
    pub fn archive(path: impl Into<PathBuf>, source: impl Into<ArchiveCause>) -> Self {
        Self::ArchiveWrite {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Stable error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Directory { .. } => ErrorCode::DirectoryError,
            Self::ArchiveWrite { .. } => ErrorCode::ArchiveWriteError,
            Self::Configuration(_) => ErrorCode::ConfigurationError,
        }
    }
}

/// Error code enumeration for fork command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    DirectoryError,
    ArchiveWriteError,
    ConfigurationError,
}

impl ErrorCode {
    /// Code string in `FORK-Exxx` form.
    pub fn code(self) -> &'static str {
        match self {
            Self::DirectoryError => "FORK-E001",
            Self::ArchiveWriteError => "FORK-E002",
            Self::ConfigurationError => "FORK-E003",
        }
    }

    /// Short remediation hint shown next to the error.
    pub fn remediation(self) -> &'static str {
        match self {
            Self::DirectoryError => {
                "Check that the working directory template points to a writable location"
            }
            Self::ArchiveWriteError => {
                "Check free space and permissions of the temp directory, or use another classpath strategy"
            }
            Self::ConfigurationError => "Fix the launch configuration supplied by the orchestrator",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

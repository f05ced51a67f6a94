//! Temporary files handed to a worker process.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use tracing::debug;

/// What happens to an artifact once its owner lets go of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupPolicy {
    /// Removed on release or drop.
    Delete,
    /// Left on disk for inspection (debug mode).
    Retain,
}

impl CleanupPolicy {
    pub fn for_debug(debug: bool) -> Self {
        if debug { Self::Retain } else { Self::Delete }
    }
}

/// A file the launched worker depends on, such as the manifest jar.
///
/// The orchestrator owns it for the lifetime of the worker process and
/// releases it after the process has exited.
pub struct TempArtifact {
    path: PathBuf,
    policy: CleanupPolicy,
    guard: Option<TempPath>,
}

impl TempArtifact {
    /// Take ownership of a freshly written temp file.
    pub(crate) fn from_named(file: NamedTempFile, policy: CleanupPolicy) -> io::Result<Self> {
        match policy {
            CleanupPolicy::Delete => {
                let guard = file.into_temp_path();
                Ok(Self {
                    path: guard.to_path_buf(),
                    policy,
                    guard: Some(guard),
                })
            }
            CleanupPolicy::Retain => {
                let (_, path) = file.keep().map_err(|e| e.error)?;
                Ok(Self {
                    path,
                    policy,
                    guard: None,
                })
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> CleanupPolicy {
        self.policy
    }

    /// Whether the file goes away when released.
    pub fn is_marked_for_deletion(&self) -> bool {
        self.policy == CleanupPolicy::Delete
    }

    /// Release the artifact, deleting it unless it is retained.
    ///
    /// Returns the path of a retained artifact.
    pub fn release(mut self) -> io::Result<Option<PathBuf>> {
        match self.guard.take() {
            Some(guard) => {
                debug!(path = %self.path.display(), "deleting temp artifact");
                guard.close()?;
                Ok(None)
            }
            None => {
                debug!(path = %self.path.display(), "retaining temp artifact");
                Ok(Some(std::mem::take(&mut self.path)))
            }
        }
    }
}

impl fmt::Debug for TempArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TempArtifact")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .finish()
    }
}

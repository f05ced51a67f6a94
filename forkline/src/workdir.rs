//! Per-worker working directory resolution.

use crate::error::{ForkError, Result};
use crate::launch_spec::WorkerIndex;
use crate::placeholder::replace_worker_placeholders;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve the working directory template for one worker, creating it if
/// needed.
///
/// Worker placeholders in the template are substituted and a leading `~` is
/// expanded before the path is made absolute. A template that is not valid
/// UTF-8 is a configuration error. Creation tolerates another
/// worker creating the same parents concurrently.
pub fn resolve_working_directory(template: &Path, index: WorkerIndex) -> Result<PathBuf> {
    let raw = template.to_str().ok_or_else(|| {
        ForkError::Configuration(format!(
            "working directory template is not valid UTF-8: {}",
            template.display()
        ))
    })?;
    let substituted = replace_worker_placeholders(raw, index);
    let expanded = shellexpand::tilde(&substituted);
    let cwd = absolutize(Path::new(expanded.as_ref()))?;
    ensure_directory(&cwd, "workingDirectory")?;
    debug!(worker = %index, path = %cwd.display(), "resolved working directory");
    Ok(cwd)
}

/// Make sure `dir` exists and is a directory.
pub(crate) fn ensure_directory(dir: &Path, label: &str) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| {
            ForkError::directory(dir, format!("cannot create {label}: {e}"))
        })?;
    }
    if !dir.is_dir() {
        return Err(ForkError::directory(
            dir,
            format!("{label} exists and is not a directory"),
        ));
    }
    Ok(())
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path)
        .map_err(|e| ForkError::directory(path, format!("cannot make path absolute: {e}")))
}

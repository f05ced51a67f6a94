//! Configuration for forkline.
//!
//! - `FORKLINE_*` environment variables parsed with type safety
//! - source tracking for debugging
//! - TOML launch configuration files

pub mod env;
pub mod file;
pub mod source;

pub use env::{ENV_PREFIX, EnvError, EnvParser};
pub use file::{ConfigFileError, ForkSection, JvmSection, LaunchConfigFile};
pub use source::{ConfigSource, Sourced};

#[cfg(test)]
pub(crate) fn env_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

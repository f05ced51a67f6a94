//! Classpath carriers for the forked JVM.
//!
//! Classpaths grow without bound while command lines do not, so the entries
//! can travel in one of three ways:
//!
//! | Strategy               | Carrier                              |
//! |------------------------|--------------------------------------|
//! | `inline`               | `-classpath <entries>` argument      |
//! | `environment-variable` | `CLASSPATH` environment variable     |
//! | `manifest-jar`         | `-jar` with a manifest-only jar      |

pub mod artifact;
pub mod manifest;
pub mod relocate;

pub use artifact::{CleanupPolicy, TempArtifact};
pub use manifest::{Manifest, write_manifest_jar};
pub use relocate::{relocate, relocate_if};

use crate::error::{ForkError, Result};
use crate::launch_spec::LaunchSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Environment variable read by the JVM when no `-classpath` is given.
pub const CLASSPATH_ENV: &str = "CLASSPATH";

/// Separator between classpath entries on this platform.
#[cfg(windows)]
pub const PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
pub const PATH_SEPARATOR: &str = ":";

/// How the classpath reaches the forked JVM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClasspathStrategy {
    /// Conventional `-classpath` argument.
    Inline,
    /// `CLASSPATH` environment variable.
    EnvironmentVariable,
    /// Manifest-only jar started with `-jar`.
    #[default]
    ManifestJar,
}

impl ClasspathStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::EnvironmentVariable => "environment-variable",
            Self::ManifestJar => "manifest-jar",
        }
    }

    /// Turn the classpath and entry point into arguments, environment and an
    /// optional temp artifact for the launch command.
    pub fn materialize(
        self,
        spec: &LaunchSpec,
        class_path: &[String],
        main_class: &str,
        shaded: bool,
    ) -> Result<Materialized> {
        let main_class = relocate_if(main_class, shaded)?;
        let mut out = Materialized::default();
        match self {
            // The caller carries `-classpath` in the argument line.
            Self::Inline => out.args.push(main_class),
            Self::EnvironmentVariable => {
                out.env
                    .insert(CLASSPATH_ENV.to_string(), join_class_path(class_path));
                out.args.push(main_class);
            }
            Self::ManifestJar => {
                let artifact = write_manifest_jar(
                    class_path,
                    &main_class,
                    spec.temp_directory(),
                    spec.is_debug(),
                )?;
                out.args.push("-jar".to_string());
                out.args.push(manifest::jar_argument(&artifact));
                out.artifact = Some(artifact);
            }
        }
        Ok(out)
    }
}

impl fmt::Display for ClasspathStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClasspathStrategy {
    type Err = ForkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" | "classpath" => Ok(Self::Inline),
            "environment-variable" | "env" | "jar-classpath" => Ok(Self::EnvironmentVariable),
            "manifest-jar" | "manifest" | "jar-manifest" => Ok(Self::ManifestJar),
            other => Err(ForkError::Configuration(format!(
                "unknown classpath strategy '{other}'"
            ))),
        }
    }
}

/// What a strategy contributes to the launch command.
#[derive(Debug, Default)]
pub struct Materialized {
    /// Arguments appended after the JVM options, in order.
    pub args: Vec<String>,
    /// Environment variables to set.
    pub env: BTreeMap<String, String>,
    /// Temp file the worker needs while it runs.
    pub artifact: Option<TempArtifact>,
}

/// Join entries with the platform path separator, preserving order.
pub fn join_class_path(class_path: &[String]) -> String {
    class_path.join(PATH_SEPARATOR)
}

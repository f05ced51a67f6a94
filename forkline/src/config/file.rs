//! Launch configuration loaded from TOML, with environment overrides.
//!
//! ```toml
//! [jvm]
//! executable = "/usr/lib/jvm/java-17/bin/java"
//! java_version = 17
//! arg_line = "-Xmx512m @{jacocoArgLine}"
//!
//! [fork]
//! count = 4
//! working_directory = "target/fork-${surefire.forkNumber}"
//! strategy = "manifest-jar"
//!
//! [properties]
//! jacocoArgLine = "-javaagent:jacoco.jar"
//!
//! [environment]
//! TZ = "UTC"
//! ```

use super::env::{EnvError, EnvParser};
use crate::classpath::ClasspathStrategy;
use crate::error::ForkError;
use crate::launch_spec::{LaunchSpec, MODULE_SYSTEM_JAVA_VERSION, PlatformCapability};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const MAX_FORK_COUNT: u32 = 1024;

/// Errors while loading a launch configuration.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse launch configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment overrides: {}", format_env_errors(.0))]
    Env(Vec<EnvError>),

    #[error(transparent)]
    Invalid(#[from] ForkError),
}

fn format_env_errors(errors: &[EnvError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// On-disk form of a [`LaunchSpec`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchConfigFile {
    #[serde(default)]
    pub jvm: JvmSection,
    #[serde(default)]
    pub fork: ForkSection,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JvmSection {
    #[serde(default = "default_executable")]
    pub executable: String,
    /// Major version of the test JDK; drives the module opt-in.
    #[serde(default)]
    pub java_version: Option<u32>,
    /// Explicit module predicate, overriding `java_version`.
    #[serde(default)]
    pub modules_required: Option<bool>,
    #[serde(default)]
    pub arg_line: Option<String>,
    #[serde(default)]
    pub debug_line: Option<String>,
}

impl Default for JvmSection {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            java_version: None,
            modules_required: None,
            arg_line: None,
            debug_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForkSection {
    #[serde(default = "default_fork_count")]
    pub count: u32,
    #[serde(default = "default_true")]
    pub reuse: bool,
    #[serde(default = "default_working_directory")]
    pub working_directory: PathBuf,
    #[serde(default)]
    pub temp_directory: Option<PathBuf>,
    #[serde(default)]
    pub strategy: ClasspathStrategy,
    #[serde(default)]
    pub debug: bool,
}

impl Default for ForkSection {
    fn default() -> Self {
        Self {
            count: default_fork_count(),
            reuse: true,
            working_directory: default_working_directory(),
            temp_directory: None,
            strategy: ClasspathStrategy::default(),
            debug: false,
        }
    }
}

fn default_executable() -> String {
    "java".to_string()
}

fn default_fork_count() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_working_directory() -> PathBuf {
    PathBuf::from(".")
}

impl LaunchConfigFile {
    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), "loaded launch configuration");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigFileError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `FORKLINE_*` overrides on top of the file values.
    ///
    /// All invalid variables are reported together.
    pub fn apply_env(&mut self, parser: &mut EnvParser) -> Result<(), ConfigFileError> {
        if let Some(java_home) = parser.get_optional_string("JAVA_HOME").value {
            self.jvm.executable = Path::new(&java_home)
                .join("bin")
                .join(if cfg!(windows) { "java.exe" } else { "java" })
                .display()
                .to_string();
        }

        let debug = parser.get_bool("DEBUG", self.fork.debug);
        let count = parser.get_u32_range("FORK_COUNT", self.fork.count, 1, MAX_FORK_COUNT);
        let strategy = parser.get_parsed(
            "STRATEGY",
            self.fork.strategy,
            "inline, environment-variable or manifest-jar",
        );
        let temp = parser.get_optional_string("TEMP_DIR");

        for (name, var) in [
            ("debug", &debug.env_var),
            ("fork_count", &count.env_var),
            ("strategy", &strategy.env_var),
            ("temp_directory", &temp.env_var),
        ] {
            if let Some(var) = var {
                debug!(setting = name, var = %var, "environment override");
            }
        }

        self.fork.debug = debug.value;
        self.fork.count = count.value;
        self.fork.strategy = strategy.value;
        if let Some(temp) = temp.value {
            self.fork.temp_directory = Some(PathBuf::from(shellexpand::tilde(&temp).as_ref()));
        }

        if parser.has_errors() {
            return Err(ConfigFileError::Env(parser.take_errors()));
        }
        Ok(())
    }

    fn platform(&self) -> PlatformCapability {
        let modules_required = self.jvm.modules_required.unwrap_or_else(|| {
            self.jvm
                .java_version
                .is_some_and(|major| major >= MODULE_SYSTEM_JAVA_VERSION)
        });
        PlatformCapability::new(self.jvm.executable.clone(), modules_required)
    }

    /// Freeze into an immutable [`LaunchSpec`].
    pub fn into_launch_spec(self) -> Result<LaunchSpec, ConfigFileError> {
        let mut builder = LaunchSpec::builder(self.platform())
            .working_directory(self.fork.working_directory)
            .properties(self.properties)
            .debug(self.fork.debug)
            .fork_count(self.fork.count)
            .reuse_forks(self.fork.reuse)
            .strategy(self.fork.strategy);
        if let Some(temp) = self.fork.temp_directory {
            builder = builder.temp_directory(temp);
        }
        if let Some(arg_line) = self.jvm.arg_line {
            builder = builder.arg_line(arg_line);
        }
        if let Some(debug_line) = self.jvm.debug_line {
            builder = builder.debug_line(debug_line);
        }
        for (key, value) in self.environment {
            builder = builder.env(key, Some(value));
        }
        Ok(builder.build()?)
    }
}

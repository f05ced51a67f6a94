//! Immutable configuration driving worker launches.

use crate::classpath::ClasspathStrategy;
use crate::error::{ForkError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// First Java major version whose runtime restricts reflective access through
/// the module system.
pub const MODULE_SYSTEM_JAVA_VERSION: u32 = 9;

/// Identifies which concurrent worker a command is built for (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct WorkerIndex(u32);

impl WorkerIndex {
    pub fn new(index: u32) -> Result<Self> {
        if index == 0 {
            return Err(ForkError::Configuration(
                "worker index must be at least 1".to_string(),
            ));
        }
        Ok(Self(index))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for WorkerIndex {
    type Error = ForkError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<WorkerIndex> for u32 {
    fn from(index: WorkerIndex) -> Self {
        index.0
    }
}

impl fmt::Display for WorkerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the JDK used for tests can do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapability {
    /// JVM executable, absolute or resolvable on PATH.
    pub executable: String,
    /// Whether the runtime is module-system aware and needs the
    /// `--add-modules` opt-in for reflective test frameworks.
    pub modules_required: bool,
}

impl PlatformCapability {
    pub fn new(executable: impl Into<String>, modules_required: bool) -> Self {
        Self {
            executable: executable.into(),
            modules_required,
        }
    }

    /// Derive the module predicate from a Java major version.
    pub fn for_java_version(executable: impl Into<String>, major: u32) -> Self {
        Self::new(executable, major >= MODULE_SYSTEM_JAVA_VERSION)
    }
}

/// Startup decisions made by test selection for one worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupDescriptor {
    /// Provider class with its own main entry point, when the provider
    /// bootstraps itself instead of the default booter.
    #[serde(default)]
    pub provider_main_class: Option<String>,
    /// Running from the relocated (shaded) distribution.
    #[serde(default)]
    pub shaded: bool,
}

impl StartupDescriptor {
    pub fn with_provider_main_class(mut self, class_name: impl Into<String>) -> Self {
        self.provider_main_class = Some(class_name.into());
        self
    }

    pub fn shaded(mut self, shaded: bool) -> Self {
        self.shaded = shaded;
        self
    }
}

/// Launch configuration shared by every worker of one test run.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    platform: PlatformCapability,
    debug_line: Option<String>,
    working_directory: PathBuf,
    temp_directory: PathBuf,
    properties: BTreeMap<String, String>,
    arg_line: Option<String>,
    environment: BTreeMap<String, Option<String>>,
    debug: bool,
    fork_count: u32,
    reuse_forks: bool,
    strategy: ClasspathStrategy,
}

impl LaunchSpec {
    pub fn builder(platform: PlatformCapability) -> LaunchSpecBuilder {
        LaunchSpecBuilder::new(platform)
    }

    pub fn platform(&self) -> &PlatformCapability {
        &self.platform
    }

    pub fn debug_line(&self) -> Option<&str> {
        self.debug_line.as_deref()
    }

    /// Working directory template; may contain worker placeholders.
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    pub fn temp_directory(&self) -> &Path {
        &self.temp_directory
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn arg_line(&self) -> Option<&str> {
        self.arg_line.as_deref()
    }

    /// Environment overlay with absent values normalized to empty strings.
    pub fn environment(&self) -> impl Iterator<Item = (&str, &str)> {
        self.environment
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref().unwrap_or("")))
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn fork_count(&self) -> u32 {
        self.fork_count
    }

    pub fn reuse_forks(&self) -> bool {
        self.reuse_forks
    }

    pub fn strategy(&self) -> ClasspathStrategy {
        self.strategy
    }
}

/// Builder for [`LaunchSpec`].
#[derive(Debug, Clone)]
pub struct LaunchSpecBuilder {
    spec: LaunchSpec,
}

impl LaunchSpecBuilder {
    pub fn new(platform: PlatformCapability) -> Self {
        Self {
            spec: LaunchSpec {
                platform,
                debug_line: None,
                working_directory: PathBuf::from("."),
                temp_directory: std::env::temp_dir(),
                properties: BTreeMap::new(),
                arg_line: None,
                environment: BTreeMap::new(),
                debug: false,
                fork_count: 1,
                reuse_forks: true,
                strategy: ClasspathStrategy::default(),
            },
        }
    }

    pub fn debug_line(mut self, line: impl Into<String>) -> Self {
        self.spec.debug_line = Some(line.into());
        self
    }

    pub fn working_directory(mut self, template: impl Into<PathBuf>) -> Self {
        self.spec.working_directory = template.into();
        self
    }

    pub fn temp_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spec.temp_directory = dir.into();
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.properties.insert(key.into(), value.into());
        self
    }

    pub fn properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.spec
            .properties
            .extend(properties.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn arg_line(mut self, line: impl Into<String>) -> Self {
        self.spec.arg_line = Some(line.into());
        self
    }

    /// Add an environment variable; `None` is exported as an empty value.
    pub fn env(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.spec.environment.insert(key.into(), value);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.spec.debug = debug;
        self
    }

    pub fn fork_count(mut self, count: u32) -> Self {
        self.spec.fork_count = count;
        self
    }

    pub fn reuse_forks(mut self, reuse: bool) -> Self {
        self.spec.reuse_forks = reuse;
        self
    }

    pub fn strategy(mut self, strategy: ClasspathStrategy) -> Self {
        self.spec.strategy = strategy;
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<LaunchSpec> {
        if self.spec.platform.executable.trim().is_empty() {
            return Err(ForkError::Configuration(
                "platform capability has no JVM executable".to_string(),
            ));
        }
        if self.spec.environment.keys().any(|key| key.is_empty()) {
            return Err(ForkError::Configuration(
                "environment variable names must not be empty".to_string(),
            ));
        }
        Ok(self.spec)
    }
}

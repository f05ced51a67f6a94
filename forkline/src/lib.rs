//! Launch command construction for forked test worker JVMs.
//!
//! Given a shared [`LaunchSpec`], a classpath and a worker index,
//! [`ForkCommandBuilder::build`] produces a [`LaunchCommand`]: executable,
//! ordered arguments, environment overlay and working directory, plus the
//! temp manifest jar when the classpath travels that way. Spawning the
//! process is left to the caller.
//!
//! ```no_run
//! use forkline::{ForkCommandBuilder, LaunchSpec, PlatformCapability, StartupDescriptor, WorkerIndex};
//!
//! let spec = LaunchSpec::builder(PlatformCapability::for_java_version("java", 17))
//!     .arg_line("-Xmx512m @{jacoco}")
//!     .property("jacoco", "-javaagent:jacoco.jar")
//!     .working_directory("target/fork-${surefire.forkNumber}")
//!     .build()?;
//! let builder = ForkCommandBuilder::new(spec);
//! let command = builder.build(
//!     &["target/test-classes".to_string(), "target/classes".to_string()],
//!     &StartupDescriptor::default(),
//!     WorkerIndex::new(1)?,
//! )?;
//! let status = command.to_std_command().status()?;
//! command.release()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod classpath;
pub mod command;
pub mod config;
pub mod error;
pub mod launch_spec;
pub mod logging;
pub mod placeholder;
pub mod testing;
pub mod util;
pub mod workdir;

pub use builder::{ALL_JAVA_API, FORKED_BOOTER_CLASS, ForkCommandBuilder};
pub use classpath::{ClasspathStrategy, CleanupPolicy, Materialized, TempArtifact};
pub use command::{Arg, LaunchCommand};
pub use error::{ErrorCode, ForkError, Result};
pub use launch_spec::{
    LaunchSpec, LaunchSpecBuilder, PlatformCapability, StartupDescriptor, WorkerIndex,
};
pub use logging::{LogConfig, LoggingGuards, init_logging};
pub use workdir::resolve_working_directory;

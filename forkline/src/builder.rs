//! Assembles the launch command for one forked worker JVM.

use crate::command::LaunchCommand;
use crate::error::{ForkError, Result};
use crate::launch_spec::{LaunchSpec, StartupDescriptor, WorkerIndex};
use crate::placeholder::resolve_arg_line;
use crate::workdir::resolve_working_directory;
use tracing::{debug, warn};

/// Flag that opts a module-system aware JVM into the full Java SE API set.
pub const ALL_JAVA_API: &str = "--add-modules java.se.ee";

/// Any user-supplied module flag suppresses [`ALL_JAVA_API`].
pub const ADD_MODULES: &str = "--add-modules";

/// Booter started when the provider has no main class of its own.
pub const FORKED_BOOTER_CLASS: &str = "org.apache.maven.surefire.booter.ForkedBooter";

/// Builds [`LaunchCommand`]s from one shared [`LaunchSpec`].
///
/// Stateless apart from its `LaunchSpec`, so one builder can serve every worker,
/// including from several threads at once.
#[derive(Debug, Clone)]
pub struct ForkCommandBuilder {
    spec: LaunchSpec,
}

impl ForkCommandBuilder {
    pub fn new(spec: LaunchSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &LaunchSpec {
        &self.spec
    }

    /// Build the command for worker `index`.
    ///
    /// Arguments are ordered: argument line, debug line, classpath carrier.
    /// On failure no command is returned and a temp jar created along the
    /// way is cleaned up according to its policy.
    pub fn build(
        &self,
        class_path: &[String],
        startup: &StartupDescriptor,
        index: WorkerIndex,
    ) -> Result<LaunchCommand> {
        let result = self.assemble(class_path, startup, index);
        match &result {
            Ok(command) => debug!(
                worker = %index,
                strategy = %self.spec.strategy(),
                command = %command.display_line(),
                "built fork command"
            ),
            Err(err) => warn!(
                worker = %index,
                code = %err.code(),
                error = %err,
                "failed to build fork command"
            ),
        }
        result
    }

    fn assemble(
        &self,
        class_path: &[String],
        startup: &StartupDescriptor,
        index: WorkerIndex,
    ) -> Result<LaunchCommand> {
        let platform = self.spec.platform();
        if platform.executable.trim().is_empty() {
            return Err(ForkError::Configuration(
                "platform capability has no JVM executable".to_string(),
            ));
        }
        let mut command = LaunchCommand::new(platform.executable.clone());

        let arg_line = self.jvm_arg_line(index);
        if !arg_line.is_empty() {
            command.push_line(arg_line);
        }

        for (key, value) in self.spec.environment() {
            command.set_env(key, value);
        }

        if let Some(debug_line) = self.spec.debug_line().filter(|l| !l.trim().is_empty()) {
            command.push_line(debug_line);
        }

        let main_class = startup
            .provider_main_class
            .as_deref()
            .unwrap_or(FORKED_BOOTER_CLASS);

        let materialized = self.spec.strategy().materialize(
            &self.spec,
            class_path,
            main_class,
            startup.shaded,
        )?;
        for arg in materialized.args {
            command.push_value(arg);
        }
        command.env.extend(materialized.env);
        // Owned by the command from here on, so an early return below drops
        // (and deletes) it.
        command.artifact = materialized.artifact;

        command.working_directory =
            resolve_working_directory(self.spec.working_directory(), index)?;

        Ok(command)
    }

    /// Resolved argument line for a worker, with the module opt-in applied.
    pub fn jvm_arg_line(&self, index: WorkerIndex) -> String {
        let line = resolve_arg_line(self.spec.arg_line(), self.spec.properties(), index);
        if self.spec.platform().modules_required && !line.contains(ADD_MODULES) {
            if line.is_empty() {
                ALL_JAVA_API.to_string()
            } else {
                format!("{ALL_JAVA_API} {line}")
            }
        } else {
            line
        }
    }
}

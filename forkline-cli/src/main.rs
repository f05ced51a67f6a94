//! forkline - launch command preview
//!
//! Loads a launch configuration, builds the command one forked test worker
//! would run and prints it. Nothing is spawned.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use forkline::classpath::{relocate_if, write_manifest_jar};
use forkline::config::{EnvParser, LaunchConfigFile};
use forkline::{
    Arg, FORKED_BOOTER_CLASS, ForkCommandBuilder, LaunchCommand, LaunchSpec, LogConfig,
    StartupDescriptor, WorkerIndex, init_logging,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "forkline")]
#[command(author, version, about = "Preview forked test worker launch commands")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the launch command for one worker and print it
    Plan {
        /// Launch configuration file (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// 1-based worker number
        #[arg(short, long, default_value = "1")]
        worker: u32,

        /// Classpath entry, in order (repeatable)
        #[arg(long = "classpath", value_name = "ENTRY")]
        classpath: Vec<String>,

        /// Provider main class started instead of the forked booter
        #[arg(long)]
        provider_main_class: Option<String>,

        /// Relocate booter classes to the shaded package
        #[arg(long)]
        shaded: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// Write a manifest-only jar and print its path
    ///
    /// The jar is always retained; remove it when done.
    Manifest {
        /// Launch configuration file (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Classpath entry, in order (repeatable)
        #[arg(long = "classpath", value_name = "ENTRY")]
        classpath: Vec<String>,

        /// Main-Class attribute
        #[arg(long, default_value = FORKED_BOOTER_CLASS)]
        main_class: String,

        /// Relocate the main class to the shaded package
        #[arg(long)]
        shaded: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Pretty,
    Shell,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("info").with_stderr();
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    let _logging_guards = init_logging(&log_config)?;

    match cli.command {
        Commands::Plan {
            config,
            worker,
            classpath,
            provider_main_class,
            shaded,
            format,
        } => {
            let spec = load_spec(&config)?;
            let mut startup = StartupDescriptor::default().shaded(shaded);
            if let Some(class_name) = provider_main_class {
                startup = startup.with_provider_main_class(class_name);
            }
            let index = WorkerIndex::new(worker)?;
            let builder = ForkCommandBuilder::new(spec);
            let command = builder
                .build(&classpath, &startup, index)
                .with_context(|| format!("building launch command for worker {index}"))?;

            println!("{}", render(&command, format)?);

            if let Some(kept) = command.release()? {
                info!(path = %kept.display(), "manifest jar retained");
            }
            Ok(())
        }
        Commands::Manifest {
            config,
            classpath,
            main_class,
            shaded,
        } => {
            let spec = load_spec(&config)?;
            let main_class = relocate_if(&main_class, shaded)?;
            let artifact =
                write_manifest_jar(&classpath, &main_class, spec.temp_directory(), true)?;
            match artifact.release()? {
                Some(path) => println!("{}", path.display()),
                None => anyhow::bail!("manifest jar was not retained"),
            }
            Ok(())
        }
    }
}

fn load_spec(path: &Path) -> Result<LaunchSpec> {
    let mut file = LaunchConfigFile::load(path)?;
    let mut parser = EnvParser::new();
    file.apply_env(&mut parser)?;
    let spec = file
        .into_launch_spec()
        .with_context(|| format!("invalid launch configuration in {}", path.display()))?;
    Ok(spec)
}

fn render(command: &LaunchCommand, format: Format) -> Result<String> {
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(command)?,
        Format::Shell => command.display_line(),
        Format::Pretty => render_pretty(command),
    })
}

fn render_pretty(command: &LaunchCommand) -> String {
    let mut out = String::new();
    out.push_str(&format!("executable:  {}\n", command.executable));
    out.push_str(&format!(
        "directory:   {}\n",
        command.working_directory().display()
    ));
    out.push_str("arguments:\n");
    for arg in &command.args {
        let kind = match arg {
            Arg::Line(_) => "line ",
            Arg::Value(_) => "value",
        };
        out.push_str(&format!("  [{kind}] {}\n", arg.as_str()));
    }
    if !command.env.is_empty() {
        out.push_str("environment:\n");
        for (key, value) in &command.env {
            out.push_str(&format!("  {key}={value}\n"));
        }
    }
    if let Some(artifact) = &command.artifact {
        let note = if artifact.is_marked_for_deletion() {
            "removed after preview"
        } else {
            "retained"
        };
        out.push_str(&format!(
            "manifest jar: {} ({note})\n",
            artifact.path().display()
        ));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_plan_arguments_parse() {
        let cli = Cli::try_parse_from([
            "forkline",
            "plan",
            "--config",
            "fork.toml",
            "--worker",
            "3",
            "--classpath",
            "a.jar",
            "--classpath",
            "b.jar",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Plan {
                worker,
                classpath,
                format,
                shaded,
                ..
            } => {
                assert_eq!(worker, 3);
                assert_eq!(classpath, vec!["a.jar", "b.jar"]);
                assert_eq!(format, Format::Json);
                assert!(!shaded);
            }
            Commands::Manifest { .. } => panic!("expected plan"),
        }
    }

    #[test]
    fn test_manifest_defaults_to_forked_booter() {
        let cli = Cli::try_parse_from(["forkline", "manifest", "-c", "fork.toml"]).unwrap();
        match cli.command {
            Commands::Manifest { main_class, .. } => assert_eq!(main_class, FORKED_BOOTER_CLASS),
            Commands::Plan { .. } => panic!("expected manifest"),
        }
    }

    #[test]
    fn test_render_pretty_lists_arguments_and_env() {
        let mut command = LaunchCommand::new("/opt/jdk/bin/java");
        command.push_line("-Xmx512m -Dbar=1");
        command.push_value("org.example.Main");
        command.set_env("TZ", "UTC");
        let text = render_pretty(&command);
        assert!(text.starts_with("executable:  /opt/jdk/bin/java"));
        assert!(text.contains("  [line ] -Xmx512m -Dbar=1"));
        assert!(text.contains("  [value] org.example.Main"));
        assert!(text.contains("  TZ=UTC"));
        assert!(!text.contains("manifest jar"));
    }

    #[test]
    fn test_load_spec_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fork.toml");
        std::fs::write(
            &path,
            "[jvm]\nexecutable = \"/opt/jdk/bin/java\"\njava_version = 11\n\n[fork]\nstrategy = \"inline\"\n",
        )
        .unwrap();
        let spec = load_spec(&path).unwrap();
        assert_eq!(spec.platform().executable, "/opt/jdk/bin/java");
        assert!(spec.platform().modules_required);
    }
}

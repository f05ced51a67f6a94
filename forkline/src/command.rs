//! Launch command description handed to the process launcher.

use crate::classpath::TempArtifact;
use crate::util::mask_sensitive_command;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One argument slot of the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Arg {
    /// A combined token holding several space separated arguments, split by
    /// the launcher. Single and double quotes group words.
    Line(String),
    /// A single argument passed through verbatim.
    Value(String),
}

impl Arg {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Line(s) | Self::Value(s) => s,
        }
    }
}

/// Everything needed to start one worker JVM.
#[derive(Debug, Serialize)]
pub struct LaunchCommand {
    pub executable: String,
    pub args: Vec<Arg>,
    pub env: BTreeMap<String, String>,
    pub working_directory: PathBuf,
    /// Temp file the worker depends on; release it after the worker exits.
    #[serde(serialize_with = "serialize_artifact")]
    pub artifact: Option<TempArtifact>,
}

impl LaunchCommand {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            working_directory: PathBuf::new(),
            artifact: None,
        }
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.args.push(Arg::Line(line.into()));
    }

    pub fn push_value(&mut self, value: impl Into<String>) {
        self.args.push(Arg::Value(value.into()));
    }

    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Arguments as the process will receive them.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            match arg {
                Arg::Line(line) => argv.extend(split_line(line)),
                Arg::Value(value) => argv.push(value.clone()),
            }
        }
        argv
    }

    /// Build an unspawned `std::process::Command` carrying the overlay.
    pub fn to_std_command(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.executable);
        command
            .args(self.argv())
            .envs(&self.env)
            .current_dir(&self.working_directory);
        command
    }

    /// Shell-escaped command line with secrets masked, for logs.
    pub fn display_line(&self) -> String {
        let line = std::iter::once(self.executable.clone())
            .chain(self.argv())
            .map(|part| shell_escape::escape(Cow::Owned(part)).into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        mask_sensitive_command(&line)
    }

    /// Release the temp artifact, if any.
    pub fn release(mut self) -> std::io::Result<Option<PathBuf>> {
        match self.artifact.take() {
            Some(artifact) => artifact.release(),
            None => Ok(None),
        }
    }
}

fn serialize_artifact<S: Serializer>(
    artifact: &Option<TempArtifact>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match artifact {
        Some(artifact) => serializer.serialize_some(artifact.path()),
        None => serializer.serialize_none(),
    }
}

/// Split a combined argument line into words.
///
/// Whitespace separates words outside quotes. Quotes are removed, and an
/// empty quoted string yields an empty word. An unterminated quote runs to
/// the end of the line.
pub fn split_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut quoted_word = false;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                quoted_word = true;
            }
            None if c.is_whitespace() => {
                if !current.is_empty() || quoted_word {
                    words.push(std::mem::take(&mut current));
                }
                quoted_word = false;
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() || quoted_word {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line_basic() {
        assert_eq!(split_line("-Xmx512m  -Dbar=1"), vec!["-Xmx512m", "-Dbar=1"]);
        assert!(split_line("   ").is_empty());
    }

    #[test]
    fn test_split_line_quotes() {
        assert_eq!(
            split_line(r#"-Dname="hello world" '-Dother=a b' -ea"#),
            vec!["-Dname=hello world", "-Dother=a b", "-ea"]
        );
        assert_eq!(split_line(r#"-Da="" x"#), vec!["-Da=", "x"]);
        assert_eq!(split_line(r#""" x"#), vec!["", "x"]);
        assert_eq!(split_line(r#"it's"#), vec!["its"]);
    }

    #[test]
    fn test_split_line_unterminated_quote() {
        assert_eq!(split_line(r#"-Da="open end"#), vec!["-Da=open end"]);
    }

    #[test]
    fn test_argv_flattens_lines_and_values() {
        let mut cmd = LaunchCommand::new("java");
        cmd.push_line("-Xmx1g -ea");
        cmd.push_value("-jar");
        cmd.push_value("/tmp/with space.jar");
        assert_eq!(cmd.argv(), vec!["-Xmx1g", "-ea", "-jar", "/tmp/with space.jar"]);
    }

    #[test]
    fn test_to_std_command() {
        let mut cmd = LaunchCommand::new("java");
        cmd.push_line("-ea");
        cmd.set_env("LANG", "C");
        cmd.working_directory = PathBuf::from("/tmp");
        let std_cmd = cmd.to_std_command();
        assert_eq!(std_cmd.get_program(), "java");
        let args: Vec<_> = std_cmd.get_args().collect();
        assert_eq!(args, vec!["-ea"]);
        assert_eq!(std_cmd.get_current_dir(), Some(Path::new("/tmp")));
        let envs: Vec<_> = std_cmd.get_envs().collect();
        assert_eq!(envs.len(), 1);
    }

    #[test]
    fn test_display_line_masks_secrets() {
        let mut cmd = LaunchCommand::new("java");
        cmd.push_line("-Djavax.net.ssl.keyStorePassword=hunter2 -ea");
        let line = cmd.display_line();
        assert!(line.starts_with("java "));
        assert!(!line.contains("hunter2"));
        assert!(line.contains("-ea"));
    }

    #[test]
    fn test_serialize_command() {
        let mut cmd = LaunchCommand::new("java");
        cmd.push_line("-ea");
        cmd.push_value("Main");
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["executable"], "java");
        assert_eq!(json["args"][0]["kind"], "line");
        assert_eq!(json["args"][1]["value"], "Main");
        assert!(json["artifact"].is_null());
    }

    #[test]
    fn test_release_without_artifact() {
        let cmd = LaunchCommand::new("java");
        assert_eq!(cmd.release().unwrap(), None);
    }
}

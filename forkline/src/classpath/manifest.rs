//! Manifest-only jar used to carry a long classpath.
//!
//! The jar holds a single stored `META-INF/MANIFEST.MF` entry whose
//! `Class-Path` lists every classpath entry as a `file:` URI, so the JVM is
//! started with a short `-jar <path>` no matter how many entries there are.

use super::artifact::{CleanupPolicy, TempArtifact};
use crate::error::{ForkError, Result};
use crate::workdir::ensure_directory;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

const JAR_PREFIX: &str = "surefirebooter";
const JAR_SUFFIX: &str = ".jar";

/// Manifest lines may not exceed this many bytes, continuation lines included.
const MANIFEST_LINE_LIMIT: usize = 72;

/// Paths longer than this need the extended-length prefix on Windows.
const WINDOWS_MAX_PATH: usize = 260;

/// Main attributes of the synthesized manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub class_path: String,
    pub main_class: String,
}

impl Manifest {
    /// Build the manifest for a classpath and entry point.
    pub fn new(class_path: &[String], main_class: &str) -> Result<Self> {
        Ok(Self {
            class_path: manifest_class_path(class_path)?,
            main_class: main_class.to_string(),
        })
    }

    /// Render in jar manifest format (CRLF, 72-byte lines, trailing blank).
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in [
            ("Manifest-Version", "1.0"),
            ("Class-Path", self.class_path.as_str()),
            ("Main-Class", self.main_class.as_str()),
        ] {
            write_wrapped(&mut out, &format!("{name}: {value}"));
        }
        out.push_str("\r\n");
        out
    }
}

/// Space-separated `file:` URIs, directories ending with `/`.
///
/// The JVM silently ignores a directory entry without the trailing slash.
pub fn manifest_class_path(entries: &[String]) -> Result<String> {
    let uris = entries
        .iter()
        .map(|entry| entry_uri(Path::new(entry)).map(String::from))
        .collect::<Result<Vec<_>>>()?;
    Ok(uris.join(" ").trim().to_string())
}

fn entry_uri(entry: &Path) -> Result<Url> {
    // An empty entry names the current directory, as the JVM reads it.
    let resolved = if entry.as_os_str().is_empty() {
        std::env::current_dir()
    } else {
        std::path::absolute(entry)
    };
    let absolute = resolved.map_err(|e| {
        ForkError::Configuration(format!(
            "cannot resolve classpath entry {}: {e}",
            entry.display()
        ))
    })?;
    let uri = if absolute.is_dir() {
        Url::from_directory_path(&absolute)
    } else {
        Url::from_file_path(&absolute)
    };
    uri.map_err(|()| {
        ForkError::Configuration(format!(
            "classpath entry {} cannot be expressed as a file URI",
            absolute.display()
        ))
    })
}

fn write_wrapped(out: &mut String, line: &str) {
    let mut rest = line;
    let mut limit = MANIFEST_LINE_LIMIT;
    loop {
        if rest.len() <= limit {
            out.push_str(rest);
            out.push_str("\r\n");
            return;
        }
        let mut split = limit;
        while !rest.is_char_boundary(split) {
            split -= 1;
        }
        out.push_str(&rest[..split]);
        out.push_str("\r\n ");
        rest = &rest[split..];
        // The leading space of a continuation line counts towards the limit.
        limit = MANIFEST_LINE_LIMIT - 1;
    }
}

/// Write a manifest-only jar into `temp_dir`.
///
/// The jar is marked for deletion unless `debug` is set, in which case it is
/// kept for inspection.
pub fn write_manifest_jar(
    class_path: &[String],
    main_class: &str,
    temp_dir: &Path,
    debug: bool,
) -> Result<TempArtifact> {
    let manifest = Manifest::new(class_path, main_class)?;
    ensure_directory(temp_dir, "tempDir")?;

    let file = tempfile::Builder::new()
        .prefix(JAR_PREFIX)
        .suffix(JAR_SUFFIX)
        .tempfile_in(temp_dir)
        .map_err(|e| ForkError::archive(temp_dir, e))?;
    let path = file.path().to_path_buf();

    {
        let mut jar = ZipWriter::new(file.as_file());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        jar.start_file(MANIFEST_ENTRY, options)
            .map_err(|e| ForkError::archive(&path, e))?;
        jar.write_all(manifest.render().as_bytes())
            .map_err(|e| ForkError::archive(&path, e))?;
        let written = jar.finish().map_err(|e| ForkError::archive(&path, e))?;
        written
            .sync_all()
            .map_err(|e| ForkError::archive(&path, e))?;
    }

    let artifact = TempArtifact::from_named(file, CleanupPolicy::for_debug(debug))
        .map_err(|e| ForkError::archive(&path, e))?;
    debug!(
        path = %artifact.path().display(),
        entries = class_path.len(),
        main_class,
        retained = !artifact.is_marked_for_deletion(),
        "wrote manifest jar"
    );
    Ok(artifact)
}

/// Platform form of the jar path passed after `-jar`.
pub fn escape_to_platform_path(path: &Path) -> String {
    let raw = path.display().to_string();
    if cfg!(windows) && raw.len() > WINDOWS_MAX_PATH && !raw.starts_with(r"\\?\") {
        format!(r"\\?\{raw}")
    } else {
        raw
    }
}

/// Absolute path of a written jar.
pub(crate) fn jar_argument(artifact: &TempArtifact) -> String {
    let path: PathBuf =
        std::path::absolute(artifact.path()).unwrap_or_else(|_| artifact.path().to_path_buf());
    escape_to_platform_path(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn read_manifest(path: &Path) -> (String, CompressionMethod, usize) {
        let file = std::fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let count = archive.len();
        let mut entry = archive.by_name(MANIFEST_ENTRY).unwrap();
        let method = entry.compression();
        let mut text = String::new();
        entry.read_to_string(&mut text).unwrap();
        (text, method, count)
    }

    fn unwrap_lines(text: &str) -> String {
        text.replace("\r\n ", "")
    }

    #[test]
    fn test_directory_uri_gets_trailing_slash() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("classes");
        std::fs::create_dir(&dir).unwrap();
        let jar = tmp.path().join("lib.jar");
        std::fs::write(&jar, b"").unwrap();

        let cp = manifest_class_path(&[
            dir.display().to_string(),
            jar.display().to_string(),
        ])
        .unwrap();
        let parts: Vec<&str> = cp.split(' ').collect();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("file:"));
        assert!(parts[0].ends_with("classes/"));
        assert!(parts[1].ends_with("lib.jar"));
        assert!(!parts[1].ends_with('/'));
    }

    #[test]
    fn test_spaces_are_percent_encoded() {
        let tmp = TempDir::new().unwrap();
        let jar = tmp.path().join("with space.jar");
        let cp = manifest_class_path(&[jar.display().to_string()]).unwrap();
        assert!(cp.ends_with("with%20space.jar"));
    }

    #[test]
    fn test_render_wraps_long_lines() {
        let manifest = Manifest {
            class_path: "x".repeat(200),
            main_class: "org.example.Main".to_string(),
        };
        let text = manifest.render();
        for line in text.split("\r\n") {
            assert!(line.len() <= MANIFEST_LINE_LIMIT, "line too long: {line}");
        }
        assert!(text.starts_with("Manifest-Version: 1.0\r\n"));
        assert!(text.ends_with("Main-Class: org.example.Main\r\n\r\n"));
        assert!(unwrap_lines(&text).contains(&format!("Class-Path: {}", "x".repeat(200))));
    }

    #[test]
    fn test_wrap_respects_char_boundaries() {
        let manifest = Manifest {
            class_path: "é".repeat(60),
            main_class: "M".to_string(),
        };
        let text = manifest.render();
        assert!(unwrap_lines(&text).contains(&"é".repeat(60)));
    }

    #[test]
    fn test_jar_contains_single_stored_manifest() {
        let tmp = TempDir::new().unwrap();
        let jar = tmp.path().join("dep.jar");
        let artifact = write_manifest_jar(
            &[jar.display().to_string()],
            "org.apache.maven.surefire.booter.ForkedBooter",
            tmp.path(),
            false,
        )
        .unwrap();

        let name = artifact.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(JAR_PREFIX));
        assert!(name.ends_with(JAR_SUFFIX));

        let (text, method, count) = read_manifest(artifact.path());
        assert_eq!(count, 1);
        assert_eq!(method, CompressionMethod::Stored);
        let text = unwrap_lines(&text);
        assert!(text.contains("Manifest-Version: 1.0\r\n"));
        assert!(text.contains("Main-Class: org.apache.maven.surefire.booter.ForkedBooter\r\n"));
        assert!(text.contains("dep.jar\r\n"));
    }

    #[test]
    fn test_debug_jar_is_retained() {
        let tmp = TempDir::new().unwrap();
        let artifact = write_manifest_jar(&[], "Main", tmp.path(), true).unwrap();
        assert!(!artifact.is_marked_for_deletion());
        let path = artifact.release().unwrap().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_non_debug_jar_is_deleted_on_release() {
        let tmp = TempDir::new().unwrap();
        let artifact = write_manifest_jar(&[], "Main", tmp.path(), false).unwrap();
        let path = artifact.path().to_path_buf();
        assert!(artifact.is_marked_for_deletion());
        artifact.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_unique_names_per_call() {
        let tmp = TempDir::new().unwrap();
        let a = write_manifest_jar(&[], "Main", tmp.path(), false).unwrap();
        let b = write_manifest_jar(&[], "Main", tmp.path(), false).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_temp_dir_that_is_a_file_fails() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();
        let err = write_manifest_jar(&[], "Main", &file, false).unwrap_err();
        assert!(matches!(err, ForkError::Directory { .. }));
    }

    #[test]
    fn test_empty_entry_is_current_directory() {
        let cp = manifest_class_path(&[String::new()]).unwrap();
        let cwd = Url::from_directory_path(std::env::current_dir().unwrap()).unwrap();
        assert_eq!(cp, cwd.as_str());
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_temp_dir_is_archive_error() {
        use std::error::Error as _;
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let locked = tmp.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o500)).unwrap();

        // Permission bits do not bind a privileged user.
        if std::fs::write(locked.join("write-check"), b"").is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o700)).unwrap();
            return;
        }

        let err = write_manifest_jar(&[], "Main", &locked, false).unwrap_err();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o700)).unwrap();

        assert!(matches!(err, ForkError::ArchiveWrite { .. }));
        assert_eq!(err.code(), crate::error::ErrorCode::ArchiveWriteError);
        let source = err.source().unwrap();
        assert!(source.to_string().to_lowercase().contains("permission"));
    }

    #[test]
    fn test_escape_short_path_unchanged() {
        assert_eq!(
            escape_to_platform_path(Path::new("/tmp/surefirebooter1.jar")),
            "/tmp/surefirebooter1.jar"
        );
    }
}

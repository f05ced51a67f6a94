//! Structured test logging for CI debugging.
//!
//! Call [`init_global_test_logging`] once per test binary, for example from a
//! `#[ctor::ctor]` function. Events go to stderr through the test writer and,
//! as JSON lines, to `target/test-logs/forkline_tests.jsonl`.
//!
//! - `FORKLINE_TEST_LOG_FILE` overrides the JSONL path.
//! - `FORKLINE_TEST_LOG_LEVEL` sets the level (default `debug`).

use std::path::PathBuf;
use std::sync::{Mutex, Once};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;

static GLOBAL_LOGGING_INIT: Once = Once::new();

/// Install the test subscriber. Safe to call multiple times.
pub fn init_global_test_logging() {
    GLOBAL_LOGGING_INIT.call_once(|| {
        let file_layer = create_log_file().map(|file| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(Mutex::new(file))
                .with_span_events(FmtSpan::CLOSE)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
        });

        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_target(true)
            .compact();

        let level =
            std::env::var("FORKLINE_TEST_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());
        let filter = tracing_subscriber::EnvFilter::try_new(format!("forkline={level}"))
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(stderr_layer);

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

fn create_log_file() -> Option<std::fs::File> {
    let path = match std::env::var("FORKLINE_TEST_LOG_FILE") {
        Ok(custom) => PathBuf::from(custom),
        Err(_) => find_target_dir()
            .join("test-logs")
            .join("forkline_tests.jsonl"),
    };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .ok()
}

fn find_target_dir() -> PathBuf {
    if let Ok(target_dir) = std::env::var("CARGO_TARGET_DIR") {
        return PathBuf::from(target_dir);
    }

    let mut cwd = std::env::current_dir().unwrap_or_default();
    loop {
        let target = cwd.join("target");
        if target.is_dir() {
            return target;
        }
        if !cwd.pop() {
            return PathBuf::from("target");
        }
    }
}

use std::path::Path;

pub fn init_test_logging() {
    forkline::testing::init_global_test_logging();
}

#[allow(dead_code)]
pub fn fixture(name: &str) -> &'static str {
    match name {
        "surefire_fork.toml" => include_str!("../fixtures/surefire_fork.toml"),
        other => panic!("unknown fixture: {other}"),
    }
}

/// Classpath of one directory and one jar, both existing under `root`.
#[allow(dead_code)]
pub fn sample_class_path(root: &Path) -> Vec<String> {
    let classes = root.join("test-classes");
    std::fs::create_dir_all(&classes).unwrap();
    let jar = root.join("junit-4.13.2.jar");
    std::fs::write(&jar, b"PK").unwrap();
    vec![classes.display().to_string(), jar.display().to_string()]
}

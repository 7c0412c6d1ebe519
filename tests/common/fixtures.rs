use std::fs;
use std::path::{Path, PathBuf};

/// Get path to a fixture in tests/fixtures/
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load a test fixture from tests/fixtures/
pub fn load_fixture(name: &str) -> String {
    let path = fixture_path(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Copy a fixture into `dir`, returning the new path
pub fn copy_fixture(name: &str, dir: &Path) -> PathBuf {
    let target = dir.join(name);
    fs::copy(fixture_path(name), &target)
        .unwrap_or_else(|e| panic!("Failed to copy fixture {}: {}", name, e));
    target
}

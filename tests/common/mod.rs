#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const FIXTURE_PROFILE: &str = include_str!("../fixtures/shop.coverprofile");

/// Root of the `example.com/shop` fixture module.
pub fn fixture_module() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/shop")
}

/// Create a throwaway module `module_path` holding `files` (relative path, content).
/// The caller must hold onto `TempDir` to keep the directory alive.
pub fn temp_module(module_path: &str, files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("go.mod"), format!("module {module_path}\n\ngo 1.22\n")).unwrap();
    for (rel, content) in files {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    dir
}

//! Mapping profile file names (Go import paths) to packages on disk.
//!
//! The converter only talks to [`PackageResolver`], so tests can hand it a
//! fixed table. [`GoModResolver`] is the filesystem implementation: it reads
//! the module path from `go.mod` and looks packages up below the module root.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Identity of the package that owns a profile file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// Package import path, e.g. `example.com/app/internal/store`.
    pub id: String,
    /// Import path of the enclosing module, e.g. `example.com/app`.
    pub module_path: String,
    /// Module root directory.
    pub module_root: PathBuf,
    /// The package's `.go` files.
    pub source_files: Vec<PathBuf>,
}

impl ResolvedPackage {
    /// The file name relative to the module root, e.g. `internal/store/db.go`.
    /// `None` if the file does not live under this package's module.
    pub fn relative_name<'a>(&self, profile_file: &'a str) -> Option<&'a str> {
        profile_file
            .strip_prefix(self.module_path.as_str())?
            .strip_prefix('/')
    }

    /// Locate the on-disk file for a profile entry by base name.
    pub fn find_source(&self, profile_file: &str) -> Option<&Path> {
        let base = base_name(profile_file);
        self.source_files
            .iter()
            .find(|p| p.file_name().and_then(|n| n.to_str()) == Some(base))
            .map(PathBuf::as_path)
    }
}

pub trait PackageResolver {
    /// Resolve the package that contains `profile_file`, or fail with
    /// [`Error::PackageNotFound`].
    fn resolve(&self, profile_file: &str) -> Result<ResolvedPackage>;
}

/// Resolves packages of a single Go module rooted at a directory.
#[derive(Debug, Clone)]
pub struct GoModResolver {
    root: PathBuf,
    module_path: String,
}

impl GoModResolver {
    /// Read `<root>/go.mod` and remember the declared module path.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = std::fs::canonicalize(root).map_err(|source| Error::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let go_mod = root.join("go.mod");
        let content = std::fs::read_to_string(&go_mod).map_err(|source| Error::Io {
            path: go_mod.clone(),
            source,
        })?;
        let module_path = parse_module_path(&content).ok_or_else(|| Error::PackageNotFound {
            file: format!("{} (no module directive)", go_mod.display()),
        })?;
        log::debug!("module {} at {}", module_path, root.display());
        Ok(Self { root, module_path })
    }

    pub fn module_root(&self) -> &Path {
        &self.root
    }

    pub fn module_path(&self) -> &str {
        &self.module_path
    }
}

impl PackageResolver for GoModResolver {
    fn resolve(&self, profile_file: &str) -> Result<ResolvedPackage> {
        let not_found = || Error::PackageNotFound {
            file: profile_file.to_string(),
        };

        let rel = profile_file
            .strip_prefix(self.module_path.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(not_found)?;
        let pkg_dir = dir_name(rel);

        let id = if pkg_dir.is_empty() {
            self.module_path.clone()
        } else {
            format!("{}/{}", self.module_path, pkg_dir)
        };

        let dir = self.root.join(pkg_dir);
        let entries = std::fs::read_dir(&dir).map_err(|_| not_found())?;
        let mut source_files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "go"))
            .collect();
        source_files.sort();

        Ok(ResolvedPackage {
            id,
            module_path: self.module_path.clone(),
            module_root: self.root.clone(),
            source_files,
        })
    }
}

/// Extract the module path from `go.mod` content.
fn parse_module_path(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or("").trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with([' ', '\t']) {
            return None;
        }
        let path = rest.trim().trim_matches('"');
        (!path.is_empty()).then(|| path.to_string())
    })
}

/// Directory part of a `/`-separated path; empty for a bare name.
fn dir_name(path: &str) -> &str {
    path.rfind('/').map_or("", |idx| &path[..idx])
}

fn base_name(path: &str) -> &str {
    path.rfind(['/', '\\']).map_or(path, |idx| &path[idx + 1..])
}

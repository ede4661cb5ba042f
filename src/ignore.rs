//! Decide which files are left out of the report.
//!
//! Every matcher is optional. A file is ignored as soon as one configured
//! matcher matches; with nothing configured nothing is ignored. Patterns are
//! compiled up front so a bad one fails before any file is read.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Banner Go tooling writes at the top of generated files.
/// See https://pkg.go.dev/cmd/go#hdr-Generate_Go_files_by_processing_source
pub const GENERATED_CODE_PATTERN: &str = r"(?m)^// Code generated .* DO NOT EDIT\.$";

static GENERATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(GENERATED_CODE_PATTERN).unwrap());

/// Raw pattern strings, as they come from the command line.
#[derive(Debug, Clone, Default)]
pub struct IgnoreConfig {
    /// Matched against the whole module-relative path.
    pub paths: Option<String>,
    /// Matched against the directory part of the path.
    pub dirs: Option<String>,
    /// Matched against the file's base name.
    pub files: Option<String>,
    /// Matched against the file content.
    pub content: Option<String>,
    /// Skip files carrying the standard "Code generated ... DO NOT EDIT." banner.
    pub generated: bool,
}

/// Compiled form of [`IgnoreConfig`].
#[derive(Debug, Clone, Default)]
pub struct Ignore {
    paths: Option<Regex>,
    dirs: Option<Regex>,
    files: Option<Regex>,
    content: Option<Regex>,
    generated: bool,
}

fn compile(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|source| Error::InvalidPattern {
                pattern: p.to_string(),
                source,
            })
        })
        .transpose()
}

impl Ignore {
    pub fn new(config: &IgnoreConfig) -> Result<Self> {
        Ok(Self {
            paths: compile(config.paths.as_deref())?,
            dirs: compile(config.dirs.as_deref())?,
            files: compile(config.files.as_deref())?,
            content: compile(config.content.as_deref())?,
            generated: config.generated,
        })
    }

    /// Whether any content matcher is configured. When false the caller can
    /// decide with the path alone.
    pub fn needs_content(&self) -> bool {
        self.content.is_some() || self.generated
    }

    /// Path-only half of [`Ignore::should_ignore`].
    pub fn matches_path(&self, path: &str) -> bool {
        if self.paths.as_ref().is_some_and(|re| re.is_match(path)) {
            return true;
        }
        let (dir, base) = split_path(path);
        if self.dirs.as_ref().is_some_and(|re| re.is_match(dir)) {
            return true;
        }
        self.files.as_ref().is_some_and(|re| re.is_match(base))
    }

    /// Content-only half of [`Ignore::should_ignore`].
    pub fn matches_content(&self, content: &str) -> bool {
        if self.generated && GENERATED_RE.is_match(content) {
            return true;
        }
        self.content.as_ref().is_some_and(|re| re.is_match(content))
    }

    pub fn should_ignore(&self, path: &str, content: &str) -> bool {
        self.matches_path(path) || self.matches_content(content)
    }
}

/// Split on the last `/` or `\`; the directory of a bare name is `.`.
fn split_path(path: &str) -> (&str, &str) {
    match path.rfind(['/', '\\']) {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => (".", path),
    }
}

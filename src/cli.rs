//! Command handler functions for the gocobertura CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::aggregate::{ConvertOptions, Converter};
use crate::ignore::{Ignore, IgnoreConfig};
use crate::report::{self, Format};
use crate::resolve::GoModResolver;
use crate::source::ClassGrouping;

/// Everything the `coverage` command needs besides the profile text.
#[derive(Debug, Clone)]
pub struct CoverageOptions {
    /// Directory holding the module's `go.mod`.
    pub module_root: PathBuf,
    pub by_files: bool,
    pub ignore: IgnoreConfig,
    pub format: Format,
    /// Fixed report timestamp, for reproducible output.
    pub timestamp: Option<i64>,
}

impl Default for CoverageOptions {
    fn default() -> Self {
        Self {
            module_root: PathBuf::from("."),
            by_files: false,
            ignore: IgnoreConfig::default(),
            format: Format::Xml,
            timestamp: None,
        }
    }
}

/// Convert Go coverage profile text into a rendered report.
pub fn cmd_coverage(profile: &str, opts: &CoverageOptions) -> Result<String> {
    // Patterns are checked before anything is read from the module.
    let ignore = Ignore::new(&opts.ignore).context("Bad ignore pattern")?;
    let resolver = GoModResolver::new(&opts.module_root).with_context(|| {
        format!("Failed to load Go module at {}", opts.module_root.display())
    })?;

    let options = ConvertOptions {
        grouping: if opts.by_files {
            ClassGrouping::ByFile
        } else {
            ClassGrouping::ByType
        },
        ignore,
    };
    let mut converter = Converter::new(&resolver, options);
    if let Some(ts) = opts.timestamp {
        converter = converter.with_timestamp(ts);
    }

    let coverage = converter
        .convert_text(profile)
        .context("Code coverage conversion failed")?;
    Ok(report::render(&coverage, opts.format)?)
}

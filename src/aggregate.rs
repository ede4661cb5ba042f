//! Assembling the report tree.
//!
//! Profiles are processed strictly in order, one file at a time. Each file's
//! classes are merged into their package, and the class and package rates are
//! refreshed once that file is done. Report totals are computed once, after
//! the last file.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::ignore::Ignore;
use crate::model::{Coverage, Profile};
use crate::profile;
use crate::resolve::PackageResolver;
use crate::source::{map_source, ClassGrouping};

/// Settings for one conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub grouping: ClassGrouping,
    pub ignore: Ignore,
}

pub struct Converter<'a> {
    resolver: &'a dyn PackageResolver,
    options: ConvertOptions,
    timestamp: Option<i64>,
}

impl<'a> Converter<'a> {
    pub fn new(resolver: &'a dyn PackageResolver, options: ConvertOptions) -> Self {
        Self {
            resolver,
            options,
            timestamp: None,
        }
    }

    /// Use a fixed report timestamp (milliseconds since the epoch) instead of
    /// the current time.
    pub fn with_timestamp(mut self, millis: i64) -> Self {
        self.timestamp = Some(millis);
        self
    }

    /// Parse profile text and convert it.
    pub fn convert_text(&self, input: &str) -> Result<Coverage> {
        let profiles = profile::parse(input)?;
        self.convert(&profiles)
    }

    /// Build the complete report for `profiles`. Any error aborts the run.
    pub fn convert(&self, profiles: &[Profile]) -> Result<Coverage> {
        let timestamp = self
            .timestamp
            .unwrap_or_else(|| Utc::now().timestamp_millis());
        let mut coverage = Coverage::new(timestamp);

        for profile in profiles {
            self.add_profile(&mut coverage, profile)?;
        }

        coverage.finalize();
        log::info!(
            "{} packages, {}/{} lines covered ({:.1}%)",
            coverage.packages.len(),
            coverage.lines_covered,
            coverage.lines_valid,
            coverage.line_rate * 100.0
        );
        Ok(coverage)
    }

    fn add_profile(&self, coverage: &mut Coverage, profile: &Profile) -> Result<()> {
        let not_found = || Error::PackageNotFound {
            file: profile.file_name.clone(),
        };

        let pkg = self.resolver.resolve(&profile.file_name)?;
        coverage.add_source(&pkg.module_root.display().to_string());

        let file_name = pkg.relative_name(&profile.file_name).ok_or_else(not_found)?;
        let ignore = &self.options.ignore;
        if ignore.matches_path(file_name) {
            log::debug!("ignoring {} (path)", file_name);
            return Ok(());
        }

        let path = pkg.find_source(&profile.file_name).ok_or_else(not_found)?;
        let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if ignore.needs_content() && ignore.matches_content(&source) {
            log::debug!("ignoring {} (content)", file_name);
            return Ok(());
        }

        let classes = map_source(file_name, &source, profile, self.options.grouping)?;
        log::debug!(
            "{}: {} blocks into {} classes",
            file_name,
            profile.blocks.len(),
            classes.len()
        );

        let package = coverage.package_mut(&pkg.id);
        for class in classes {
            let target = package.class_mut(&class.name, &class.file_name);
            if target.methods.is_empty() {
                target.methods = class.methods;
            } else {
                // The file was seen before: same source, so the declarations
                // line up one to one.
                for (existing, method) in target.methods.iter_mut().zip(class.methods) {
                    existing.lines.extend_from(&method.lines);
                }
            }
            target.update_rates();
        }
        package.update_rate();
        Ok(())
    }
}

//! In-memory representation of a Cobertura-style coverage report. The
//! converter builds a `Coverage` tree once per run; emitters only read it.

use serde::Serialize;

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Counting mode declared on the first line of a Go coverage profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CountMode {
    Set,
    Count,
    Atomic,
}

impl CountMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountMode::Set => "set",
            CountMode::Count => "count",
            CountMode::Atomic => "atomic",
        }
    }
}

impl std::str::FromStr for CountMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "set" => Ok(CountMode::Set),
            "count" => Ok(CountMode::Count),
            "atomic" => Ok(CountMode::Atomic),
            _ => Err(format!(
                "unknown counting mode '{}' (expected set, count or atomic)",
                s
            )),
        }
    }
}

impl std::fmt::Display for CountMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A covered source range. Positions are 1-based; the span is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub num_statements: u32,
    pub count: u64,
}

/// All blocks reported for one source file.
#[derive(Debug, Clone)]
pub struct Profile {
    pub file_name: String,
    pub mode: CountMode,
    pub blocks: Vec<Block>,
}

/// A single source line's execution count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Line {
    pub number: u32,
    pub hits: u64,
}

/// Ordered, number-unique set of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Lines(Vec<Line>);

impl Lines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `hits` for line `number`. A line that is already present keeps
    /// the smaller of the two counts.
    pub fn add_or_update(&mut self, number: u32, hits: u64) {
        // Blocks arrive sorted, so nearly every call lands on or after the tail.
        match self.0.last_mut() {
            Some(last) if last.number == number => {
                last.hits = last.hits.min(hits);
                return;
            }
            Some(last) if last.number < number => {
                self.0.push(Line { number, hits });
                return;
            }
            None => {
                self.0.push(Line { number, hits });
                return;
            }
            _ => {}
        }
        match self.0.binary_search_by_key(&number, |l| l.number) {
            Ok(idx) => self.0[idx].hits = self.0[idx].hits.min(hits),
            Err(idx) => self.0.insert(idx, Line { number, hits }),
        }
    }

    pub fn extend_from(&mut self, other: &Lines) {
        for line in other {
            self.add_or_update(line.number, line.hits);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Line> {
        self.0.iter()
    }

    pub fn num_lines(&self) -> u64 {
        self.0.len() as u64
    }

    pub fn num_lines_with_hits(&self) -> u64 {
        self.0.iter().filter(|l| l.hits > 0).count() as u64
    }

    pub fn hit_rate(&self) -> f64 {
        rate(self.num_lines_with_hits(), self.num_lines())
    }
}

impl<'a> IntoIterator for &'a Lines {
    type Item = &'a Line;
    type IntoIter = std::slice::Iter<'a, Line>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Line> for Lines {
    fn from_iter<I: IntoIterator<Item = Line>>(iter: I) -> Self {
        let mut lines = Lines::new();
        for line in iter {
            lines.add_or_update(line.number, line.hits);
        }
        lines
    }
}

/// One Go function or method declaration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Method {
    pub name: String,
    pub signature: Option<String>,
    pub line_rate: f64,
    pub lines: Lines,
}

impl Method {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn update_rate(&mut self) {
        self.line_rate = self.lines.hit_rate();
    }
}

/// A group of methods: a receiver type, or a whole file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Class {
    pub name: String,
    pub file_name: String,
    pub line_rate: f64,
    pub methods: Vec<Method>,
    pub lines: Lines,
}

impl Class {
    pub fn new(name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: file_name.into(),
            ..Default::default()
        }
    }

    /// Counted over the merged line list, so a line shared by two
    /// declarations counts once.
    pub fn num_lines(&self) -> u64 {
        self.lines.num_lines()
    }

    pub fn num_lines_with_hits(&self) -> u64 {
        self.lines.num_lines_with_hits()
    }

    /// Recompute method rates, rebuild the merged line list and the class rate.
    pub fn update_rates(&mut self) {
        let mut lines = Lines::new();
        for method in &mut self.methods {
            method.update_rate();
            lines.extend_from(&method.lines);
        }
        self.lines = lines;
        self.line_rate = self.lines.hit_rate();
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Package {
    pub name: String,
    pub line_rate: f64,
    pub classes: Vec<Class>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn num_lines(&self) -> u64 {
        self.classes.iter().map(Class::num_lines).sum()
    }

    pub fn num_lines_with_hits(&self) -> u64 {
        self.classes.iter().map(Class::num_lines_with_hits).sum()
    }

    pub fn update_rate(&mut self) {
        self.line_rate = rate(self.num_lines_with_hits(), self.num_lines());
    }

    /// Find the class `name` of `file_name`, creating it in discovery order if absent.
    pub fn class_mut(&mut self, name: &str, file_name: &str) -> &mut Class {
        let idx = match self
            .classes
            .iter()
            .position(|c| c.name == name && c.file_name == file_name)
        {
            Some(idx) => idx,
            None => {
                self.classes.push(Class::new(name, file_name));
                self.classes.len() - 1
            }
        };
        &mut self.classes[idx]
    }
}

/// Root of the report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Coverage {
    pub version: String,
    pub timestamp: i64,
    pub line_rate: f64,
    pub branch_rate: f64,
    pub lines_covered: u64,
    pub lines_valid: u64,
    pub branches_covered: u64,
    pub branches_valid: u64,
    pub complexity: f64,
    pub sources: Vec<String>,
    pub packages: Vec<Package>,
}

impl Coverage {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            ..Default::default()
        }
    }

    pub fn num_lines(&self) -> u64 {
        self.packages.iter().map(Package::num_lines).sum()
    }

    pub fn num_lines_with_hits(&self) -> u64 {
        self.packages.iter().map(Package::num_lines_with_hits).sum()
    }

    /// Add a module root unless it is already listed.
    pub fn add_source(&mut self, dir: &str) {
        if !self.sources.iter().any(|s| s == dir) {
            self.sources.push(dir.to_string());
        }
    }

    /// Find the package named `name`, creating it in discovery order if absent.
    pub fn package_mut(&mut self, name: &str) -> &mut Package {
        let idx = match self.packages.iter().position(|p| p.name == name) {
            Some(idx) => idx,
            None => {
                self.packages.push(Package::new(name));
                self.packages.len() - 1
            }
        };
        &mut self.packages[idx]
    }

    /// Compute the report totals. Called once, after every package is complete.
    pub fn finalize(&mut self) {
        self.lines_valid = self.num_lines();
        self.lines_covered = self.num_lines_with_hits();
        self.line_rate = rate(self.lines_covered, self.lines_valid);
    }
}

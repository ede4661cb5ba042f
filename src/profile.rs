/// Parser for Go's `-coverprofile` format.
///
/// Reference: https://go.dev/blog/cover
///
/// Format:
///   mode: set|count|atomic
///   <file>:<startLine>.<startCol>,<endLine>.<endCol> <numStatements> <count>
///
/// Each line describes a basic block with the number of statements in it and
/// how many times it was executed. Blocks are grouped per file in order of
/// first appearance; within a file they keep the order of the input, which
/// `go test` already writes sorted by position. Nothing is merged here: two
/// identical blocks stay two entries and the source mapper resolves them per
/// line.
use std::collections::HashMap;
use std::io::BufRead;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{Block, CountMode, Profile};

/// The file path is greedy so that the range is split off at the last colon.
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+):(\d+)\.(\d+),(\d+)\.(\d+) (\d+) (\d+)$").unwrap()
});

/// Parse a whole profile held in memory.
pub fn parse(input: &str) -> Result<Vec<Profile>> {
    parse_reader(input.as_bytes())
}

/// Streaming profile parser.
pub fn parse_reader<R: BufRead>(mut reader: R) -> Result<Vec<Profile>> {
    let mut profiles: Vec<Profile> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut mode: Option<CountMode> = None;

    let mut raw_line = String::new();
    let mut line_no = 0;
    loop {
        raw_line.clear();
        if reader.read_line(&mut raw_line)? == 0 {
            break;
        }
        line_no += 1;

        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("mode:") {
            let declared = parse_mode(rest.trim(), line_no)?;
            // A second header means concatenated runs, whose blocks would
            // no longer be in position order within a file.
            if mode.is_some() {
                return Err(Error::malformed(line_no, "repeated 'mode:' header"));
            }
            mode = Some(declared);
            continue;
        }

        let Some(mode) = mode else {
            return Err(Error::malformed(line_no, "missing 'mode:' header"));
        };

        let (file, block) = parse_block_line(line, line_no)?;
        let idx = match index.get(file) {
            Some(&idx) => idx,
            None => {
                profiles.push(Profile {
                    file_name: file.to_string(),
                    mode,
                    blocks: Vec::new(),
                });
                index.insert(file.to_string(), profiles.len() - 1);
                profiles.len() - 1
            }
        };
        profiles[idx].blocks.push(block);
    }

    if mode.is_none() {
        return Err(Error::malformed(line_no.max(1), "missing 'mode:' header"));
    }

    Ok(profiles)
}

fn parse_mode(value: &str, line_no: usize) -> Result<CountMode> {
    value
        .parse::<CountMode>()
        .map_err(|msg| Error::malformed(line_no, msg))
}

/// Parse a single block line, returning (file_path, Block).
fn parse_block_line(line: &str, line_no: usize) -> Result<(&str, Block)> {
    let caps = BLOCK_RE.captures(line).ok_or_else(|| {
        Error::malformed(
            line_no,
            format!("expected 'file:line.col,line.col statements count', got '{}'", line),
        )
    })?;

    let number = |i: usize, what: &str| -> Result<u64> {
        caps[i]
            .parse::<u64>()
            .map_err(|_| Error::malformed(line_no, format!("{} '{}' is out of range", what, &caps[i])))
    };
    let position = |i: usize, what: &str| -> Result<u32> {
        let value = number(i, what)?;
        if value == 0 {
            return Err(Error::malformed(line_no, format!("{} must be positive", what)));
        }
        u32::try_from(value)
            .map_err(|_| Error::malformed(line_no, format!("{} '{}' is out of range", what, value)))
    };

    let block = Block {
        start_line: position(2, "start line")?,
        start_col: position(3, "start column")?,
        end_line: position(4, "end line")?,
        end_col: position(5, "end column")?,
        num_statements: u32::try_from(number(6, "statement count")?)
            .map_err(|_| Error::malformed(line_no, "statement count is out of range"))?,
        count: number(7, "execution count")?,
    };

    let file = caps.get(1).map_or("", |m| m.as_str());
    Ok((file, block))
}

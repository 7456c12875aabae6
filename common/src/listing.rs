//! Parser for the long listing format produced by `ls -l` style tools
//!
//! Each line holds whitespace separated columns: the first character of column 0 is `d`
//! for directories, column 4 is the size in bytes and the last column is the name.

use crate::error::{Error, Result};

const SIZE_COLUMN: usize = 4;

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

impl Entry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            is_dir: true,
        }
    }
}

fn is_total_header(line: &str) -> bool {
    let mut columns = line.split_whitespace();
    matches!(
        (columns.next(), columns.next(), columns.next()),
        (Some("total"), Some(_), None)
    )
}

fn parse_line(location: &str, line: &str) -> Result<Entry> {
    let columns: Vec<&str> = line.split_whitespace().collect();
    let malformed = || Error::Listing {
        location: location.to_string(),
        message: format!("malformed listing line {line:?}"),
    };
    if columns.len() <= SIZE_COLUMN {
        return Err(malformed());
    }
    let size = columns[SIZE_COLUMN].parse::<u64>().map_err(|_| malformed())?;
    let name = columns.last().ok_or_else(malformed)?;
    Ok(Entry {
        name: name.to_string(),
        size,
        is_dir: columns[0].starts_with('d'),
    })
}

/// Parses listing output of `location` into entries.
///
/// Blank lines are ignored and a leading `total N` header is discarded.
pub fn parse_listing(location: &str, text: &str) -> Result<Vec<Entry>> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .peekable();
    if lines.peek().is_some_and(|line| is_total_header(line)) {
        lines.next();
    }
    lines.map(|line| parse_line(location, line)).collect()
}

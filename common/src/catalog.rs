//! Flat catalog of the files found under a source target
//!
//! Records are kept in "natural" order: names are split into alternating text and digit
//! runs, text runs compare case-insensitively and digit runs compare numerically, so
//! `file2` sorts before `file10`.

use std::cmp::Ordering;

const MIB: f64 = (1024 * 1024) as f64;

/// One file to be synchronized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path relative to the source root with `/` separators; empty for a single-file source
    pub relative_name: String,
    pub size: u64,
}

impl FileRecord {
    pub fn new(relative_name: impl Into<String>, size: u64) -> Self {
        Self {
            relative_name: relative_name.into(),
            size,
        }
    }

    pub fn size_mib(&self) -> f64 {
        self.size as f64 / MIB
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<FileRecord>,
}

impl Catalog {
    /// Builds a catalog from enumerated records, sorting them in natural order.
    pub fn from_records(mut records: Vec<FileRecord>) -> Self {
        records.sort_by(|lhs, rhs| natural_cmp(&lhs.relative_name, &rhs.relative_name));
        Self { records }
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|record| record.size).sum()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a FileRecord;
    type IntoIter = std::slice::Iter<'a, FileRecord>;
    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[derive(Debug)]
enum Chunk<'a> {
    Text(&'a str),
    Number(&'a str),
}

/// Splits `name` into text and digit runs, always starting with a (possibly empty) text run.
fn chunks(name: &str) -> Vec<Chunk<'_>> {
    let mut result = vec![];
    let mut start = 0;
    let mut in_digits = false;
    for (idx, ch) in name.char_indices() {
        let is_digit = ch.is_ascii_digit();
        if is_digit != in_digits {
            let run = &name[start..idx];
            result.push(if in_digits {
                Chunk::Number(run)
            } else {
                Chunk::Text(run)
            });
            start = idx;
            in_digits = is_digit;
        }
    }
    let run = &name[start..];
    result.push(if in_digits {
        Chunk::Number(run)
    } else {
        Chunk::Text(run)
    });
    result
}

/// Compares two digit runs by numeric value without parsing (no overflow on long runs).
fn cmp_digits(lhs: &str, rhs: &str) -> Ordering {
    let lhs = lhs.trim_start_matches('0');
    let rhs = rhs.trim_start_matches('0');
    lhs.len().cmp(&rhs.len()).then_with(|| lhs.cmp(rhs))
}

fn cmp_text(lhs: &str, rhs: &str) -> Ordering {
    lhs.chars()
        .flat_map(char::to_lowercase)
        .cmp(rhs.chars().flat_map(char::to_lowercase))
}

/// Natural ordering of relative names.
///
/// Names equal under the natural key (e.g. `a01` and `a1`, or differing only by case)
/// fall back to plain byte order so the result is a total order.
pub fn natural_cmp(lhs: &str, rhs: &str) -> Ordering {
    let lhs_chunks = chunks(lhs);
    let rhs_chunks = chunks(rhs);
    for (lhs_chunk, rhs_chunk) in lhs_chunks.iter().zip(rhs_chunks.iter()) {
        let ordering = match (lhs_chunk, rhs_chunk) {
            (Chunk::Text(l), Chunk::Text(r)) => cmp_text(l, r),
            (Chunk::Number(l), Chunk::Number(r)) => cmp_digits(l, r),
            // both sequences alternate starting with text, so kinds line up by position
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    lhs_chunks
        .len()
        .cmp(&rhs_chunks.len())
        .then_with(|| lhs.cmp(rhs))
}

//! Regular-expression filtering of enumerated files
//!
//! Patterns are matched against the relative name of each file (with `/` separators) and
//! are anchored at the start of the name, so `data/` selects everything below `data`
//! while `.*\.root$` selects ROOT files anywhere.
//!
//! # Examples
//!
//! ```
//! use common::filter::{FilterResult, FilterSettings};
//!
//! let mut settings = FilterSettings::new();
//! settings.set_include(r".*\.root$").unwrap();
//! settings.set_exclude(r"tmp/").unwrap();
//!
//! assert!(matches!(settings.should_include("run1/out.root"), FilterResult::Included));
//! assert!(matches!(
//!     settings.should_include("tmp/out.root"),
//!     FilterResult::ExcludedByPattern(_)
//! ));
//! assert!(matches!(
//!     settings.should_include("run1/out.log"),
//!     FilterResult::ExcludedByDefault
//! ));
//! ```

use anyhow::Context;

/// A compiled filter pattern with its original form kept for diagnostics
#[derive(Debug, Clone)]
pub struct FilterPattern {
    pub original: String,
    regex: regex::Regex,
}

impl FilterPattern {
    pub fn parse(pattern: &str) -> Result<Self, anyhow::Error> {
        if pattern.is_empty() {
            return Err(anyhow::anyhow!("empty pattern is not allowed"));
        }
        let regex = regex::Regex::new(&format!("^(?:{pattern})"))
            .with_context(|| format!("invalid regular expression: {pattern}"))?;
        Ok(Self {
            original: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, relative_name: &str) -> bool {
        self.regex.is_match(relative_name)
    }
}

/// Result of checking whether a file should be included
#[derive(Debug, Clone)]
pub enum FilterResult {
    Included,
    /// an include pattern exists and did not match
    ExcludedByDefault,
    /// the exclude pattern matched
    ExcludedByPattern(String),
}

/// Optional include and exclude patterns applied to every enumerated file
#[derive(Debug, Clone, Default)]
pub struct FilterSettings {
    pub include: Option<FilterPattern>,
    pub exclude: Option<FilterPattern>,
}

impl FilterSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds settings from optional command line patterns.
    pub fn from_patterns(
        include: Option<&str>,
        exclude: Option<&str>,
    ) -> Result<Self, anyhow::Error> {
        let mut settings = Self::new();
        if let Some(pattern) = include {
            settings.set_include(pattern)?;
        }
        if let Some(pattern) = exclude {
            settings.set_exclude(pattern)?;
        }
        Ok(settings)
    }

    pub fn set_include(&mut self, pattern: &str) -> Result<(), anyhow::Error> {
        self.include = Some(FilterPattern::parse(pattern)?);
        Ok(())
    }

    pub fn set_exclude(&mut self, pattern: &str) -> Result<(), anyhow::Error> {
        self.exclude = Some(FilterPattern::parse(pattern)?);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }

    pub fn should_include(&self, relative_name: &str) -> FilterResult {
        if self
            .include
            .as_ref()
            .is_some_and(|include| !include.matches(relative_name))
        {
            return FilterResult::ExcludedByDefault;
        }
        match self
            .exclude
            .as_ref()
            .filter(|exclude| exclude.matches(relative_name))
        {
            Some(exclude) => FilterResult::ExcludedByPattern(exclude.original.clone()),
            None => FilterResult::Included,
        }
    }
}

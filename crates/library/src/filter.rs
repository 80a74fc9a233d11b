//! Pluggable name-based exclusion policy for scanners.
//!
//! Platforms list helper packages (redistributables, runtimes, update
//! pseudo-entries) next to real games. Which names count as noise is policy,
//! so scanners take a [`NameFilter`] instead of hard-coding the rules.

use regex::Regex;

use crate::error::ScanError;

/// Decides whether a discovered name should be dropped.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    exact: Vec<String>,
    prefixes: Vec<String>,
    contains: Vec<String>,
    patterns: Vec<Regex>,
}

impl NameFilter {
    /// A filter that excludes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Excludes names equal to `name` (case-insensitive).
    pub fn exact(mut self, name: impl Into<String>) -> Self {
        self.exact.push(name.into().to_lowercase());
        self
    }

    /// Excludes names starting with `prefix` (case-insensitive).
    pub fn prefixed(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into().to_lowercase());
        self
    }

    /// Excludes names containing `needle` (case-insensitive).
    pub fn containing(mut self, needle: impl Into<String>) -> Self {
        self.contains.push(needle.into().to_lowercase());
        self
    }

    /// Excludes names matching the regular expression `pattern`.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, ScanError> {
        let re = Regex::new(pattern)
            .map_err(|e| ScanError::Config(format!("invalid filter pattern '{pattern}': {e}")))?;
        self.patterns.push(re);
        Ok(self)
    }

    /// Appends all rules of `other`.
    pub fn merge(mut self, other: NameFilter) -> Self {
        self.exact.extend(other.exact);
        self.prefixes.extend(other.prefixes);
        self.contains.extend(other.contains);
        self.patterns.extend(other.patterns);
        self
    }

    /// Returns true if `name` should be skipped.
    pub fn excludes(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.exact.iter().any(|e| *e == lower)
            || self.prefixes.iter().any(|p| lower.starts_with(p.as_str()))
            || self.contains.iter().any(|c| lower.contains(c.as_str()))
            || self.patterns.iter().any(|p| p.is_match(name))
    }

    /// Number of rules in this filter.
    pub fn len(&self) -> usize {
        self.exact.len() + self.prefixes.len() + self.contains.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Exclusion patterns with full-match semantics.
//!
//! A pattern that fails to compile is dropped for the current sweep and
//! reported once; it never excludes a job and never aborts the sweep.

use regex::Regex;
use tracing::warn;

use crate::errors::JobError;

/// Compiles `pattern` anchored at both ends, so it must match a whole name.
/// The bare pattern has to compile first; otherwise an unbalanced group could
/// close the anchoring group and match everything.
pub fn compile_pattern(pattern: &str) -> Result<Regex, JobError> {
    let invalid = |e: regex::Error| JobError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    };

    Regex::new(pattern).map_err(invalid)?;
    Regex::new(&format!("^(?:{})$", pattern)).map_err(invalid)
}

#[derive(Debug, Default)]
pub struct ExclusionPatterns {
    compiled: Vec<(String, Regex)>,
    invalid: Vec<JobError>,
}

impl ExclusionPatterns {
    /// Blank entries are ignored.
    pub fn compile(patterns: &[String]) -> Self {
        let mut compiled = Vec::with_capacity(patterns.len());
        let mut invalid = Vec::new();

        for pattern in patterns.iter().map(|p| p.trim_end_matches('\r')) {
            if pattern.trim().is_empty() {
                continue;
            }
            match compile_pattern(pattern) {
                Ok(regex) => compiled.push((pattern.to_string(), regex)),
                Err(e) => {
                    warn!("{}; pattern ignored for this sweep", e);
                    invalid.push(e);
                }
            }
        }

        Self { compiled, invalid }
    }

    /// First pattern matching the whole of `name`.
    pub fn matching(&self, name: &str) -> Option<&str> {
        self.compiled
            .iter()
            .find(|(_, regex)| regex.is_match(name))
            .map(|(pattern, _)| pattern.as_str())
    }

    pub fn matches(&self, name: &str) -> bool {
        self.matching(name).is_some()
    }

    pub fn invalid(&self) -> &[JobError] {
        &self.invalid
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

//! Static acceptance check for repair candidates.
//!
//! Counting is purely syntactic: an assertion swapped for an equally weak
//! but non-tautological one passes.

use regex::Regex;
use thiserror::Error;

use crate::config::GuardConfig;
use crate::error::MendError;

/// Why a candidate patch was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    /// Fewer assertion call sites than the original.
    #[error("integrity violation: assertion count dropped from {before} to {after}")]
    AssertionsDropped {
        /// Count in the original source.
        before: usize,
        /// Count in the candidate.
        after: usize,
    },

    /// Fewer test-method markers than the original.
    #[error("integrity violation: test count dropped from {before} to {after}")]
    TestsDropped {
        /// Count in the original source.
        before: usize,
        /// Count in the candidate.
        after: usize,
    },

    /// The candidate contains an always-true assertion.
    #[error("integrity violation: tautological assertion matching `{pattern}`")]
    Tautology {
        /// Pattern that matched.
        pattern: String,
    },
}

/// Compiled guard patterns.
#[derive(Debug, Clone)]
pub struct IntegrityGuard {
    assertion: Regex,
    test_marker: Regex,
    tautologies: Vec<Regex>,
}

impl IntegrityGuard {
    /// Compiles the configured patterns.
    ///
    /// # Errors
    ///
    /// Returns [`MendError::Config`] if a pattern is not a valid regex.
    pub fn from_config(config: &GuardConfig) -> Result<Self, MendError> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| MendError::Config(format!("invalid guard pattern `{pattern}`: {e}")))
        };
        Ok(Self {
            assertion: compile(&config.assertion_pattern)?,
            test_marker: compile(&config.test_marker_pattern)?,
            tautologies: config
                .tautology_patterns
                .iter()
                .map(|p| compile(p))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Number of assertion call sites in `source`.
    #[must_use]
    pub fn assertion_count(&self, source: &str) -> usize {
        self.assertion.find_iter(source).count()
    }

    /// Number of test-method markers in `source`.
    #[must_use]
    pub fn test_count(&self, source: &str) -> usize {
        self.test_marker.find_iter(source).count()
    }

    /// Accepts `updated` as a replacement for `original` only if it keeps
    /// at least as many assertions and tests and adds no tautology.
    ///
    /// # Errors
    ///
    /// Returns the first rule the candidate breaks.
    pub fn verify(&self, original: &str, updated: &str) -> Result<(), IntegrityViolation> {
        let (before, after) = (self.assertion_count(original), self.assertion_count(updated));
        if after < before {
            return Err(IntegrityViolation::AssertionsDropped { before, after });
        }

        let (before, after) = (self.test_count(original), self.test_count(updated));
        if after < before {
            return Err(IntegrityViolation::TestsDropped { before, after });
        }

        if let Some(hit) = self.tautologies.iter().find(|re| re.is_match(updated)) {
            return Err(IntegrityViolation::Tautology { pattern: hit.as_str().to_string() });
        }
        Ok(())
    }
}

impl Default for IntegrityGuard {
    fn default() -> Self {
        Self::from_config(&GuardConfig::default()).expect("default guard patterns are valid")
    }
}

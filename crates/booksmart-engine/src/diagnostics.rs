//! Per-pass diagnostics.
//!
//! Nothing recorded here stops a pass. Diagnostics explain why the output
//! is smaller than the store's contents.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use booksmart_store::{Source, StoreError};

/// A source that could not be read during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source: Source,
    /// Store error code, e.g. `server_error`.
    pub code: String,
    pub reason: String,
    /// Whether the failure is transient and a later pass may succeed.
    pub retryable: bool,
}

impl SourceFailure {
    /// Records a store error against a source.
    pub fn new(source: Source, error: &StoreError) -> Self {
        Self {
            source,
            code: error.code().as_str().to_string(),
            reason: error.message().to_string(),
            retryable: error.is_retryable(),
        }
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}: {})", self.source, self.code, self.reason)
    }
}

/// What happened during one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Records skipped as malformed, per source.
    pub malformed: BTreeMap<Source, usize>,
    /// Sources that failed to load.
    pub failed_sources: Vec<SourceFailure>,
    /// Recurrence ids rejected because they never advance.
    pub non_advancing_rules: Vec<i64>,
    /// Recurrence ids whose expansion hit the occurrence cap.
    pub truncated_rules: Vec<i64>,
    /// Occurrences dropped because a real meeting holds their slot.
    pub suppressed_occurrences: usize,
    /// Events the user does not participate in.
    pub hidden_by_filter: usize,
    /// Events dropped because an earlier event had the same id.
    pub duplicate_ids: usize,
}

impl Diagnostics {
    /// Returns true if at least one source failed.
    pub fn is_degraded(&self) -> bool {
        !self.failed_sources.is_empty()
    }

    /// Returns true if the given source failed.
    pub fn has_failed(&self, source: Source) -> bool {
        self.failed_sources.iter().any(|f| f.source == source)
    }

    pub fn record_failure(&mut self, source: Source, error: &StoreError) {
        self.failed_sources.push(SourceFailure::new(source, error));
    }

    pub fn record_malformed(&mut self, source: Source, count: usize) {
        if count > 0 {
            *self.malformed.entry(source).or_default() += count;
        }
    }

    /// Returns the number of malformed records skipped for a source.
    pub fn malformed_count(&self, source: Source) -> usize {
        self.malformed.get(&source).copied().unwrap_or(0)
    }

    /// Returns the number of malformed records skipped across all sources.
    pub fn total_malformed(&self) -> usize {
        self.malformed.values().sum()
    }
}
